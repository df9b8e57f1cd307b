//! Configuration management for the classification service.
//!
//! This module provides the server configuration type, validation traits,
//! and configuration error types.

pub mod errors;
pub mod server;

pub use errors::{ConfigError, ConfigValidator};
pub use server::{DEFAULT_WEIGHTS_PATH, ServerConfig};
