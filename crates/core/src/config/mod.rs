//! Configuration loading and application paths.
//!
//! Everything lives under one private data directory: the credential file,
//! the worker's output folders and the optional `config.toml`.

pub mod error;
pub mod loader;
pub mod models;
pub mod paths;

pub use models::AppSettings;
pub use paths::AppPaths;
