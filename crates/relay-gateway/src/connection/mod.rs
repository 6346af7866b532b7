//! Connection management
//!
//! Live connection handles and the registry that tracks them.

mod connection;
mod registry;

pub use connection::{Connection, ConnectionState, SendError};
pub use registry::ConnectionRegistry;
