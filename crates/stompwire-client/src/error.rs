use std::time::Duration;

use stompwire_frame::FrameError;
use stompwire_transport::TransportError;

/// Errors that can occur on a STOMP session.
#[derive(Debug, thiserror::Error)]
pub enum StompError {
    /// The transport failed (connect, read, or write).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A frame failed to encode or decode.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The peer violated the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A receive deadline expired.
    #[error("receive timed out after {0:?}")]
    Timeout(Duration),

    /// The connection has not been opened.
    #[error("connection is not open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, StompError>;
