//! Envelope entity - content plus a kind discriminator

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// Envelope entity
///
/// Immutable once constructed. Neither field is validated: any string is accepted,
/// and a field missing from (or `null` on) the wire decodes as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WireEnvelope")]
pub struct Envelope {
    content: String,
    kind: String,
}

/// Inbound wire shape
///
/// Older clients send the discriminator as `type`; `kind` wins when both are present.
#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default, rename = "type")]
    legacy_kind: Option<String>,
}

impl From<WireEnvelope> for Envelope {
    fn from(wire: WireEnvelope) -> Self {
        Self {
            content: wire.content.unwrap_or_default(),
            kind: wire.kind.or(wire.legacy_kind).unwrap_or_default(),
        }
    }
}

impl Envelope {
    /// Kind used by the publish side-channel
    pub const NAVIGATION_KIND: &'static str = "navigation";

    /// Create a new Envelope
    pub fn new(content: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: kind.into(),
        }
    }

    /// Create a navigation envelope for a route
    pub fn navigation(route: impl Into<String>) -> Self {
        Self::new(route, Self::NAVIGATION_KIND)
    }

    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Check if this envelope carries a navigation
    #[inline]
    pub fn is_navigation(&self) -> bool {
        self.kind == Self::NAVIGATION_KIND
    }

    /// Serialize to a JSON string
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(EnvelopeError::Encode)
    }

    /// Parse from a JSON string
    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(text).map_err(EnvelopeError::Decode)
    }

    /// Parse from raw JSON bytes
    pub fn decode_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(bytes).map_err(EnvelopeError::Decode)
    }
}
