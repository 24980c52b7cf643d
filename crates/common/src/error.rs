//! Common error types shared across crates.

use thiserror::Error;

/// Top-level error returned by the transform service to its host.
///
/// Variants map to short machine-readable codes:
/// - [`TransformError::Decode`] → `decode_error`
/// - [`TransformError::Configuration`] → `configuration_error`
///
/// A policy rejection (redacted field, preserved write) is never an error.
/// Whether a failed save aborts the whole persistence operation or falls back
/// to something else is decided by the host, not here.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A tagged value could not be turned back into plaintext.
    #[error("decode error: {0}")]
    Decode(String),

    /// The service could not be constructed from the supplied settings.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TransformError {
    /// Returns the machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            TransformError::Decode(_) => "decode_error",
            TransformError::Configuration(_) => "configuration_error",
        }
    }

    /// Returns `true` for errors that should stop the host at startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransformError::Configuration(_))
    }
}
