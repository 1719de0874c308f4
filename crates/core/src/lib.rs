//! # vfm-core
//!
//! Interactive subprocess conversation controller for videofm-kit.
//!
//! This crate launches the `videofm` worker, streams its output, answers the
//! prompts it can answer from the launch form, raises the rest to the
//! operator, estimates progress, and tears the worker down safely.
//!
//! ## Modules
//!
//! - [`config`]: Application paths and `config.toml` settings
//! - [`launcher`]: Worker resolution, credentials and spawning
//! - [`demux`]: Tagged stdout/stderr chunk stream
//! - [`router`]: Prompt rule table and conversation state
//! - [`progress`]: Stage and percentage estimation
//! - [`state`]: Worker status transitions and their events
//! - [`lifecycle`]: `RunManager`, sessions, cleanup and crash guard
//! - [`engine`]: Op dispatcher for the UI channel protocol

pub mod config;
pub mod demux;
pub mod engine;
pub mod launcher;
pub mod lifecycle;
pub mod progress;
pub mod router;
pub mod state;
