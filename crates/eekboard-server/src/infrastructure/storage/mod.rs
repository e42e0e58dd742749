//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the XDG config
//! directory (or `EEKBOARD_CONFIG`), writes it back, and supplies defaults
//! when no file exists.

pub mod config;
