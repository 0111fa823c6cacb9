//! # Jokes Common Library
//!
//! Shared code for the joke services including:
//! - Configuration loading (TOML bootstrap file and path resolution)
//! - Output formats and their encoders
//! - Error types
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod format;
pub mod time;

pub use error::{Error, Result};
pub use format::OutputFormat;
