//! # relay-gateway
//!
//! WebSocket relay: every envelope submitted by a client or through the publish
//! endpoint is fanned out to every live connection.

pub mod broadcast;
pub mod connection;
pub mod protocol;
pub mod server;

pub use server::run;
