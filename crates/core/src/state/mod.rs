//! Worker state transitions and the events they emit.

pub mod worker;
