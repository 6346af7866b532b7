//! Integration test utilities for the relay
//!
//! Spawns the real gateway on an ephemeral port and drives it with HTTP and
//! WebSocket clients.

pub mod helpers;

pub use helpers::*;
