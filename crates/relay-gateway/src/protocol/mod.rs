//! Relay protocol definitions
//!
//! Frames on the wire are JSON-encoded envelopes; this module holds the close codes
//! used when a connection is torn down.

mod close_codes;

pub use close_codes::CloseCode;
