//! Error types for the SENZ core library.
//!
//! The tick path never fails: missing targets, rejected candidates and
//! repeated forgets all degrade to "nothing sensed". Errors only surface at
//! the configuration boundary.

use thiserror::Error;

/// Top-level error type for all SENZ operations.
#[derive(Error, Debug)]
pub enum SenzError {
    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration value is out of its allowed range.
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A report or snapshot could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SenzError>;
