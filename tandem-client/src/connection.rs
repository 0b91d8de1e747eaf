//! Relay connection management
//!
//! Provides the TCP connection to the tandem relay with automatic
//! message framing and async dispatch.

mod client;
mod handler;

pub use client::{Connection, ConnectionState};
pub use handler::EnvelopeSender;
