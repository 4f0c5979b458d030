use std::fmt;
use std::io;

use stompwire_client::StompError;
use stompwire_frame::FrameError;
use stompwire_transport::TransportError;

// Exit codes follow sysexits where one exists (USAGE) and shell
// convention elsewhere (124 for timeouts, 125 for internal faults).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

/// A terminal failure: the reason to print and the code to exit with.
#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub reason: String,
}

impl CliError {
    pub fn new(code: i32, reason: impl Into<String>) -> Self {
        CliError {
            code,
            reason: reason.into(),
        }
    }

    pub fn io(context: &str, err: io::Error) -> Self {
        Self::new(io_code(err.kind()), format!("{context}: {err}"))
    }

    pub fn transport(context: &str, err: TransportError) -> Self {
        match err {
            TransportError::Io(source) | TransportError::Connect { source, .. } => {
                Self::io(context, source)
            }
            resolve => Self::new(TRANSPORT_ERROR, format!("{context}: {resolve}")),
        }
    }

    pub fn frame(context: &str, err: FrameError) -> Self {
        match err {
            FrameError::ConnectionClosed => Self::new(FAILURE, format!("{context}: {err}")),
            FrameError::BodyTooLarge { .. } => Self::new(DATA_INVALID, format!("{context}: {err}")),
            FrameError::Io(source) => Self::io(context, source),
            other => Self::new(INTERNAL, format!("{context}: {other}")),
        }
    }

    pub fn stomp(context: &str, err: StompError) -> Self {
        match err {
            StompError::Timeout(_) => Self::new(TIMEOUT, format!("{context}: {err}")),
            StompError::Transport(err) => Self::transport(context, err),
            StompError::Frame(err) => Self::frame(context, err),
            StompError::Protocol(_) => Self::new(FAILURE, format!("{context}: {err}")),
            StompError::NotOpen => Self::new(INTERNAL, format!("{context}: {err}")),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for CliError {}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    }
}
