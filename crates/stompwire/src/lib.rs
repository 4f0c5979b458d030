//! STOMP 1.x client toolkit.
//!
//! stompwire speaks the STOMP wire protocol over blocking TCP: a frame
//! model with order-preserving headers, a NUL-terminated wire codec, and
//! a connection driver exposing the classic verb API (CONNECT, SEND,
//! SUBSCRIBE, ACK, transactions).
//!
//! # Crate Structure
//!
//! - [`transport`]: blocking TCP stream to a broker
//! - [`frame`]: frame model and wire codec
//! - [`client`]: connection driver and verb API

/// Re-export transport types.
pub mod transport {
    pub use stompwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use stompwire_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use stompwire_client::*;
}
