//! Envelope codec errors

use thiserror::Error;

/// Errors raised while moving an envelope on or off the wire
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

impl EnvelopeError {
    /// Check if this error came from inbound data
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Get error code for logs and API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "ENVELOPE_DECODE_ERROR",
            Self::Encode(_) => "ENVELOPE_ENCODE_ERROR",
        }
    }
}
