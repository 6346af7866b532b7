//! Envelope - the unit of data broadcast by the relay

mod envelope;

pub use envelope::Envelope;
