//! Error types for OTA parameter extraction and message rendering.

use std::fmt;

/// Result alias used throughout the protocol crate.
pub type Result<T> = std::result::Result<T, OtaError>;

/// Legacy return code for a general failure.
pub const LEGACY_GENERAL: i32 = -1;

/// Legacy return code for a message that does not fit its buffer.
pub const LEGACY_STR_TOO_LONG: i32 = -4;

/// Stable error codes, one per failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The requested key is absent from the document.
    KeyNotFound,
    /// The value does not fit the fixed destination.
    ValueTooLarge,
    /// A variable-length buffer could not be obtained.
    AllocationFailure,
    /// The serializer failed while rendering a message.
    FormatError,
    /// The rendered message does not fit the destination.
    MessageTooLong,
    /// The size text is not a valid decimal integer.
    InvalidSize,
    /// The md5 text is not 32 hex characters.
    InvalidDigest,
}

impl ErrorCode {
    /// Returns the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::KeyNotFound => "KEY_NOT_FOUND",
            ErrorCode::ValueTooLarge => "VALUE_TOO_LARGE",
            ErrorCode::AllocationFailure => "ALLOCATION_FAILURE",
            ErrorCode::FormatError => "FORMAT_ERROR",
            ErrorCode::MessageTooLong => "MESSAGE_TOO_LONG",
            ErrorCode::InvalidSize => "INVALID_SIZE",
            ErrorCode::InvalidDigest => "INVALID_DIGEST",
        }
    }

    /// Integer code returned by the legacy C interface for this failure.
    ///
    /// Only an oversized message had a dedicated code; every other failure
    /// collapsed to the general `-1`.
    pub fn legacy_code(&self) -> i32 {
        match self {
            ErrorCode::MessageTooLong => LEGACY_STR_TOO_LONG,
            _ => LEGACY_GENERAL,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure raised by the extractor, the parameter parser or the assembler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtaError {
    #[error("key '{key}' not found in OTA job document")]
    KeyNotFound { key: String },

    #[error("value of key '{key}' is {len} bytes, destination holds {capacity}")]
    ValueTooLarge {
        key: String,
        len: usize,
        capacity: usize,
    },

    #[error("failed to allocate {len} bytes")]
    AllocationFailure { len: usize },

    #[error("failed to render message: {0}")]
    FormatError(String),

    #[error("message needs {needed} bytes plus terminator, buffer holds {capacity}")]
    MessageTooLong { needed: usize, capacity: usize },

    #[error("invalid firmware size: {0:?}")]
    InvalidSize(String),

    #[error("invalid md5 digest: {0}")]
    InvalidDigest(String),
}

impl OtaError {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            OtaError::KeyNotFound { .. } => ErrorCode::KeyNotFound,
            OtaError::ValueTooLarge { .. } => ErrorCode::ValueTooLarge,
            OtaError::AllocationFailure { .. } => ErrorCode::AllocationFailure,
            OtaError::FormatError(_) => ErrorCode::FormatError,
            OtaError::MessageTooLong { .. } => ErrorCode::MessageTooLong,
            OtaError::InvalidSize(_) => ErrorCode::InvalidSize,
            OtaError::InvalidDigest(_) => ErrorCode::InvalidDigest,
        }
    }

    pub(crate) fn key_not_found(key: &str) -> Self {
        OtaError::KeyNotFound {
            key: key.to_string(),
        }
    }
}

impl From<serde_json::Error> for OtaError {
    fn from(error: serde_json::Error) -> Self {
        OtaError::FormatError(error.to_string())
    }
}
