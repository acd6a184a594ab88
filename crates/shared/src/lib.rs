//! Shared library for the anime browser workspace.
//!
//! This crate provides the infrastructure used by the client crates:
//! - Configuration management
//! - Logging infrastructure
//! - Data file paths
//! - Persistent key/value storage

pub mod config;
pub mod logging;
pub mod paths;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use paths::DataPaths;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
