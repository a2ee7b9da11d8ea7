//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the client's TOML file (connection target,
//! log level and the option set passed to the mirroring server) and falls
//! back to defaults when the file does not exist yet.

pub mod config;
