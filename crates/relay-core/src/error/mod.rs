//! Domain errors

mod envelope_error;

pub use envelope_error::EnvelopeError;
