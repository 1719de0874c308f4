//! # vfm-protocol
//!
//! Core protocol definitions and data models for videofm-kit.
//!
//! This crate defines all shared data structures used for:
//! - Launch configuration built from the operator form
//! - Worker process state and run outcomes
//! - Prompts raised by the worker and the operator's answers
//! - Inter-process communication between TUI and Core
//!
//! ## Modules
//!
//! - [`launch_models`]: Launch configuration and form validation
//! - [`worker_models`]: Worker lifecycle status and run outcomes
//! - [`prompt_models`]: Prompt kinds, requests and answers
//! - [`progress_models`]: Progress stage and estimate
//! - [`ipc`]: Operations and Events for Core-TUI communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other videofm-kit crates

pub mod ipc;
pub mod launch_models;
pub mod progress_models;
pub mod prompt_models;
pub mod worker_models;

// Re-export all public types for convenience
pub use ipc::*;
pub use launch_models::*;
pub use progress_models::*;
pub use prompt_models::*;
pub use worker_models::*;
