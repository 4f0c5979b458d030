//! STOMP frame model and wire codec.
//!
//! A frame is a command verb, an insertion-ordered header mapping, and
//! an optional body, serialized as:
//!
//! ```text
//! COMMAND\n
//! name:value\n
//! ...
//! \n
//! <body bytes>NUL
//! ```
//!
//! Encoding lives on [`Frame`]; [`StompCodec`] pulls parsed frames back
//! off a blocking stream.

pub mod codec;
pub mod command;
pub mod error;
pub mod frame;
pub mod headers;

pub use codec::{ProtocolVersion, StompCodec, DEFAULT_MAX_BODY};
pub use command::Command;
pub use error::{FrameError, Result};
pub use frame::{Frame, FRAME_TERMINATOR};
pub use headers::Headers;
