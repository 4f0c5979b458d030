//! Broker transport abstraction.
//!
//! Provides the blocking byte-stream layer a STOMP session runs over:
//! TCP connection establishment and the stream handle higher layers read
//! and write frames through.
//!
//! This is the lowest layer of stompwire. Everything else builds on top
//! of the [`BrokerStream`] type provided here.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::TcpConnector;
pub use traits::BrokerStream;
