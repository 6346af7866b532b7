//! # relay-core
//!
//! Domain layer containing the envelope that moves through the relay and its wire codec.
//! This crate has zero dependencies on infrastructure (runtime, web framework, etc.).
//!
//! ## Wire compatibility
//!
//! Outbound envelopes name the discriminator `kind`. Clients written against the older
//! relay read `type` instead and will see an empty discriminator until they are updated.
//! Inbound frames accept either name.

pub mod envelope;
pub mod error;

// Re-export commonly used types at crate root
pub use envelope::Envelope;
pub use error::EnvelopeError;
