use bytes::{BufMut, Bytes, BytesMut};

use crate::command::Command;
use crate::error::Result;
use crate::headers::Headers;

/// The NUL byte terminating every serialized frame.
pub const FRAME_TERMINATOR: u8 = 0x00;

/// A STOMP frame: command verb, ordered headers, optional body.
///
/// Wire format:
/// ```text
/// ┌─────────────┬──────────────────┬────────────┬────────────┬──────┐
/// │ COMMAND \n  │ name:value \n ...│ \n (blank) │ body bytes │ NUL  │
/// └─────────────┴──────────────────┴────────────┴────────────┴──────┘
/// ```
///
/// Header values are not validated or escaped here; what goes in is what
/// goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    headers: Headers,
    body: Option<Bytes>,
}

impl Frame {
    /// Create a bodyless frame with no headers.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Create a frame carrying the given headers.
    pub fn with_headers(command: Command, headers: Headers) -> Self {
        Self {
            command,
            headers,
            body: None,
        }
    }

    /// Add a header (builder form).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a body (builder form).
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the headers, for callers that add protocol
    /// headers after construction.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// The textual header block: command line, header lines, blank line.
    ///
    /// Stops before the body; no terminator.
    pub fn header_text(&self) -> String {
        let mut out = String::new();
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in self.headers.iter() {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Render the complete frame as text, terminator included.
    ///
    /// Only valid for textual bodies: fails with an encoding error when
    /// the body is not UTF-8. Binary bodies go through
    /// [`encode`](Self::encode) instead.
    pub fn format(&self) -> Result<String> {
        let mut out = self.header_text();
        if let Some(body) = &self.body {
            out.push_str(std::str::from_utf8(body)?);
        }
        out.push('\0');
        Ok(out)
    }

    /// Encode the complete frame into `dst`, terminator included.
    ///
    /// The body bytes are appended raw, with no text re-encoding. This
    /// is the path binary bodies must take.
    pub fn encode(&self, dst: &mut BytesMut) {
        let header = self.header_text();
        dst.reserve(self.wire_size());
        dst.put_slice(header.as_bytes());
        if let Some(body) = &self.body {
            dst.put_slice(body);
        }
        dst.put_u8(FRAME_TERMINATOR);
    }

    /// The total wire size of this frame (header block + body + terminator).
    pub fn wire_size(&self) -> usize {
        self.header_text().len() + self.body.as_ref().map_or(0, |b| b.len()) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameError;
    use crate::headers;

    #[test]
    fn test_format_send_frame_exact_bytes() {
        let frame = Frame::new(Command::Send)
            .header(headers::DESTINATION, "/queue/a")
            .with_body("hello");

        let text = frame.format().unwrap();
        assert_eq!(text.as_bytes(), b"SEND\ndestination:/queue/a\n\nhello\x00");
    }

    #[test]
    fn test_format_bodyless_frame() {
        let frame = Frame::new(Command::Begin).header(headers::TRANSACTION, "tx1");
        assert_eq!(frame.format().unwrap(), "BEGIN\ntransaction:tx1\n\n\0");
    }

    #[test]
    fn test_header_text_preserves_insertion_order() {
        let frame = Frame::new(Command::Subscribe)
            .header(headers::DESTINATION, "/queue/a")
            .header(headers::ACK, "client")
            .header("receipt", "77");

        assert_eq!(
            frame.header_text(),
            "SUBSCRIBE\ndestination:/queue/a\nack:client\nreceipt:77\n\n"
        );
    }

    #[test]
    fn test_format_rejects_non_utf8_body() {
        let frame = Frame::new(Command::Send)
            .header(headers::DESTINATION, "/queue/a")
            .with_body(&[0xff, 0xfe, 0x01][..]);

        assert!(matches!(frame.format(), Err(FrameError::Encoding(_))));
    }

    #[test]
    fn test_encode_keeps_binary_body_raw() {
        let frame = Frame::new(Command::Send)
            .header(headers::DESTINATION, "/queue/bin")
            .with_body(&[0x00, 0x41][..]);

        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        assert_eq!(
            buf.as_ref(),
            b"SEND\ndestination:/queue/bin\n\n\x00\x41\x00"
        );
    }

    #[test]
    fn test_wire_size_matches_encoded_length() {
        let frame = Frame::new(Command::Send)
            .header(headers::DESTINATION, "/queue/a")
            .with_body("payload");

        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        assert_eq!(frame.wire_size(), buf.len());
    }

    #[test]
    fn test_headers_mut_is_live() {
        let mut frame = Frame::new(Command::Send).header(headers::DESTINATION, "/queue/a");
        frame.headers_mut().insert(headers::RECEIPT, "r-1");
        assert_eq!(frame.headers().get(headers::RECEIPT), Some("r-1"));
    }
}
