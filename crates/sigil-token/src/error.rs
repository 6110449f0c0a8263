//! Error types for the token crate.

use thiserror::Error;

/// Errors that can occur while packing or building an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// App id or app certificate is malformed.
    #[error("invalid {field}: {reason}")]
    InvalidCredential {
        field: &'static str,
        reason: String,
    },

    /// `build` was called without any registered service.
    #[error("no services registered on the access token")]
    EmptyServiceSet,

    /// A field does not fit its fixed-width or length-prefixed encoding.
    #[error("{field} value {value} exceeds encoding capacity of {max}")]
    EncodingOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// The issue timestamp was taken from a clock set before the unix epoch.
    #[error("system clock is before the unix epoch; pin the issue timestamp")]
    ClockBeforeEpoch,

    /// The compressor failed while writing the token payload.
    #[error("failed to compress token payload: {0}")]
    Compression(#[from] std::io::Error),
}
