//! Shared error type across pressgate crates.

use thiserror::Error;

/// Stable error codes (used in logs and JSON bodies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Configuration rejected at setup time.
    InvalidConfiguration,
    /// Unsupported config file version.
    UnsupportedVersion,
    /// Config file could not be read.
    Io,
    /// A custom pressure handler failed.
    Handler,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidConfiguration => "INVALID_CONFIGURATION",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Io => "IO",
            ErrorCode::Handler => "HANDLER",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PressGateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PressGateError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("io: {0}")]
    Io(String),
    #[error("pressure handler failed: {0}")]
    Handler(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PressGateError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PressGateError::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            PressGateError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            PressGateError::Io(_) => ErrorCode::Io,
            PressGateError::Handler(_) => ErrorCode::Handler,
            PressGateError::Internal(_) => ErrorCode::Internal,
        }
    }
}
