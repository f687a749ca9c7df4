//! # Error Types
//!
//! Custom error types for AquaLog using `thiserror`.
//!
//! The variants mirror the failure taxonomy of the logger: transport errors
//! are recoverable by reconnection, storage errors are fatal, and everything
//! else only matters at startup.

use thiserror::Error;

/// Main error type for AquaLog
#[derive(Debug, Error)]
pub enum AquaLogError {
    /// Serial transport errors (port cannot be opened or configured)
    #[error("Serial transport error: {0}")]
    Transport(String),

    /// The serial link dropped mid-session (device unplugged, end of
    /// stream). Distinguished from `Transport` so the caller can re-enter
    /// acquisition instead of treating it as fatal.
    #[error("Serial link lost: {0}")]
    TransportLost(String),

    /// Output file errors (open or append failed). Fatal: a logger that
    /// cannot log has no degraded mode.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for AquaLog
pub type Result<T> = std::result::Result<T, AquaLogError>;
