//! Blocking STOMP client sessions.
//!
//! [`StompConnection`] drives a single broker connection: opening the
//! stream, the CONNECT handshake, the protocol verbs, and reassembly of
//! inbound bytes into frames. One operation at a time, no background
//! threads, no internal retries.

pub mod connection;
pub mod error;

pub use connection::{AckMode, StompConnection, RECEIVE_TIMEOUT};
pub use error::{Result, StompError};

// The vocabulary callers need at the session surface.
pub use stompwire_frame::{Command, Frame, Headers, ProtocolVersion};
pub use stompwire_transport::BrokerStream;
