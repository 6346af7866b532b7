//! Envelope broadcasting
//!
//! Serializes inbound envelopes and fans each one out to every registered connection.

mod hub;

pub use hub::{BroadcastHub, DeliveryReport, HubConfig, HubError};
