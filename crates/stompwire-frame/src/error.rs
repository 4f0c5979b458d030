/// Errors that can occur encoding or decoding STOMP frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The command line held no known STOMP command.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// The version string is not a STOMP version this crate speaks.
    #[error("unsupported protocol version {0:?}")]
    UnsupportedVersion(String),

    /// A header line had no name/value separator.
    #[error("malformed header line {0:?}")]
    MalformedHeader(String),

    /// The content-length header did not parse as a byte count.
    #[error("invalid content-length {0:?}")]
    InvalidContentLength(String),

    /// The body exceeds the configured cap.
    #[error("body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// A content-length body was not followed by the NUL terminator.
    #[error("expected NUL frame terminator, found byte {0:#04x}")]
    MissingTerminator(u8),

    /// Frame text was not valid UTF-8.
    #[error("frame text is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// An I/O error occurred on the underlying stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was read.
    #[error("connection closed before frame was complete")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
