//! Structured frame decoding.
//!
//! The session driver hands its raw stream to [`StompCodec::unmarshal`]
//! to pull one parsed frame off the wire. Reads are byte-at-a-time, so
//! nothing beyond the frame terminator is consumed and whatever follows
//! stays in the stream for the next call.

use std::io::Read;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::command::Command;
use crate::error::{FrameError, Result};
use crate::frame::{Frame, FRAME_TERMINATOR};
use crate::headers::{Headers, CONTENT_LENGTH};

/// Default maximum body size: 16 MiB.
pub const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;

/// STOMP protocol versions this codec understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// STOMP 1.0: no header escaping.
    #[default]
    V1_0,
    /// STOMP 1.1: header escape sequences, heart-beating.
    V1_1,
    /// STOMP 1.2: as 1.1, plus carriage-return tolerance in lines.
    V1_2,
}

impl ProtocolVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolVersion::V1_0 => "1.0",
            ProtocolVersion::V1_1 => "1.1",
            ProtocolVersion::V1_2 => "1.2",
        }
    }

    /// Whether header values use the backslash escape sequences.
    ///
    /// Escaping entered the protocol in 1.1; a 1.0 session passes header
    /// text through untouched.
    pub fn escapes_headers(self) -> bool {
        !matches!(self, ProtocolVersion::V1_0)
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProtocolVersion {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1.0" => Ok(ProtocolVersion::V1_0),
            "1.1" => Ok(ProtocolVersion::V1_1),
            "1.2" => Ok(ProtocolVersion::V1_2),
            other => Err(FrameError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// Decoder for complete frames off a blocking stream.
///
/// Header escaping is deliberately asymmetric: values are unescaped here
/// for 1.1+ sessions while the encode side writes verbatim text, which
/// is how the historical client this is modeled on behaves.
#[derive(Debug, Clone)]
pub struct StompCodec {
    version: ProtocolVersion,
    max_body_size: usize,
}

impl StompCodec {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            max_body_size: DEFAULT_MAX_BODY,
        }
    }

    /// Cap the size of decoded bodies.
    pub fn with_max_body_size(mut self, max: usize) -> Self {
        self.max_body_size = max;
        self
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Read one complete frame from the stream.
    ///
    /// Skips inter-frame heartbeat newlines, then reads the command
    /// line, header lines up to the blank separator, and the body. With
    /// a `content-length` header the body is read to exactly that
    /// length; otherwise it runs to the first NUL, so bodies with
    /// embedded NUL bytes require the sender to set `content-length`.
    pub fn unmarshal<R: Read>(&self, reader: &mut R) -> Result<Frame> {
        // Heartbeats arrive as bare newlines between frames.
        let first = loop {
            match read_byte(reader)? {
                None => return Err(FrameError::ConnectionClosed),
                Some(b'\n') | Some(b'\r') => continue,
                Some(b) => break b,
            }
        };

        let command_line = read_line(reader, Some(first))?;
        let command: Command = std::str::from_utf8(&command_line)?.parse()?;

        let mut parsed = Headers::new();
        loop {
            let line = read_line(reader, None)?;
            if line.is_empty() {
                break;
            }
            let text = std::str::from_utf8(&line)?;
            let (name, value) = text
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(text.to_string()))?;
            let (name, value) = if self.version.escapes_headers() {
                (unescape_header(name), unescape_header(value))
            } else {
                (name.to_string(), value.to_string())
            };
            // First occurrence of a repeated header wins.
            parsed.insert_if_absent(name, value);
        }

        let body = match parsed.get(CONTENT_LENGTH) {
            Some(raw_len) => {
                let len: usize = raw_len
                    .trim()
                    .parse()
                    .map_err(|_| FrameError::InvalidContentLength(raw_len.to_string()))?;
                if len > self.max_body_size {
                    return Err(FrameError::BodyTooLarge {
                        size: len,
                        max: self.max_body_size,
                    });
                }
                let mut body = vec![0u8; len];
                read_body_exact(reader, &mut body)?;
                match read_byte(reader)? {
                    Some(FRAME_TERMINATOR) => {}
                    Some(other) => return Err(FrameError::MissingTerminator(other)),
                    None => return Err(FrameError::ConnectionClosed),
                }
                Bytes::from(body)
            }
            None => {
                let mut body = BytesMut::new();
                loop {
                    match read_byte(reader)? {
                        None => return Err(FrameError::ConnectionClosed),
                        Some(FRAME_TERMINATOR) => break,
                        Some(b) => {
                            if body.len() == self.max_body_size {
                                return Err(FrameError::BodyTooLarge {
                                    size: body.len() + 1,
                                    max: self.max_body_size,
                                });
                            }
                            body.put_u8(b);
                        }
                    }
                }
                body.freeze()
            }
        };

        trace!(%command, header_count = parsed.len(), body_len = body.len(), "unmarshalled frame");

        let mut frame = Frame::with_headers(command, parsed);
        if !body.is_empty() {
            frame = frame.with_body(body);
        }
        Ok(frame)
    }
}

/// Read a single byte, retrying interrupted reads.
///
/// Returns `None` at end of stream.
fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read up to the next `\n`, excluding it; one trailing `\r` is stripped.
fn read_line<R: Read>(reader: &mut R, first: Option<u8>) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    if let Some(b) = first {
        line.push(b);
    }
    loop {
        match read_byte(reader)? {
            None => return Err(FrameError::ConnectionClosed),
            Some(b'\n') => break,
            Some(b) => line.push(b),
        }
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

fn read_body_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::ConnectionClosed
        } else {
            FrameError::Io(e)
        }
    })
}

/// Decode the STOMP 1.1 header escape sequences.
///
/// Unknown escapes are kept verbatim rather than rejected; broker
/// implementations disagree here and dropping header text helps nobody.
fn unescape_header(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
