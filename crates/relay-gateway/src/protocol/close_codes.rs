//! WebSocket close codes
//!
//! Relay-specific close codes sent when the server ends a connection.

/// Relay WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Transport error or unexpected failure
    UnknownError = 4000,
    /// Inbound frame did not decode as an envelope
    DecodeError = 4002,
    /// The relay can no longer accept envelopes
    Unavailable = 4013,
}

impl CloseCode {
    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Human-readable reason placed in the close frame
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error",
            Self::DecodeError => "Decode error",
            Self::Unavailable => "Relay unavailable",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_u16(), self.reason())
    }
}
