//! The STOMP session driver.
//!
//! [`StompConnection`] owns the broker stream and drives every exchange:
//! serialized frame writes, reassembly of inbound bytes into frames, and
//! the verb helpers wrapping the protocol commands.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tracing::debug;

use stompwire_frame::headers::{
    ACK, CLIENT_ID, DESTINATION, LOGIN, MESSAGE_ID, PASSCODE, RECEIPT, TRANSACTION, VERSION,
};
use stompwire_frame::{Command, Frame, FrameError, Headers, ProtocolVersion, StompCodec};
use stompwire_transport::{BrokerStream, TcpConnector, TransportError};

use crate::error::{Result, StompError};

/// Default deadline for receive operations.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Acknowledgement modes for SUBSCRIBE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// The broker considers a message acknowledged on delivery.
    Auto,
    /// ACK frames acknowledge cumulatively up to a message.
    Client,
    /// Every message is acknowledged individually.
    ClientIndividual,
}

impl AckMode {
    /// The wire form carried in the `ack` header.
    pub fn as_str(self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }
}

impl std::fmt::Display for AckMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blocking STOMP session over a single broker stream.
///
/// One outstanding operation at a time; every call runs on the caller's
/// thread and either completes, times out, or fails. The connection
/// performs no internal recovery: any error is surfaced and the caller
/// decides whether to close.
pub struct StompConnection {
    stream: Option<BrokerStream>,
    /// Accumulates raw frame bytes across timed-out receive calls.
    buf: BytesMut,
    version: ProtocolVersion,
}

impl StompConnection {
    /// Create a connection in the unopened state.
    pub fn new() -> Self {
        Self {
            stream: None,
            buf: BytesMut::new(),
            version: ProtocolVersion::default(),
        }
    }

    /// Open a TCP stream to the broker.
    ///
    /// Replaces any previously adopted stream without closing it; call
    /// [`close`](Self::close) first if that matters.
    pub fn open(&mut self, host: &str, port: u16) -> Result<()> {
        let stream = TcpConnector::new().connect(host, port)?;
        self.open_stream(stream);
        Ok(())
    }

    /// Adopt an already-connected stream.
    pub fn open_stream(&mut self, stream: BrokerStream) {
        self.stream = Some(stream);
        self.buf.clear();
    }

    /// Close the connection.
    ///
    /// Idempotent: closing an already-closed connection is a no-op. The
    /// stream is dropped even when shutdown reports a failure, so a
    /// retry never observes a half-closed handle. Shutdown fails an
    /// in-progress blocking read on a clone of the stream promptly.
    pub fn close(&mut self) -> Result<()> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => return Ok(()),
        };
        self.buf.clear();
        match stream.shutdown() {
            Ok(()) => {}
            // The peer may have torn the socket down first.
            Err(TransportError::Io(e)) if e.kind() == ErrorKind::NotConnected => {}
            Err(e) => return Err(e.into()),
        }
        debug!("connection closed");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// The underlying stream, when open.
    pub fn stream(&self) -> Option<&BrokerStream> {
        self.stream.as_ref()
    }

    /// Mutable access to the underlying stream, when open.
    pub fn stream_mut(&mut self) -> Option<&mut BrokerStream> {
        self.stream.as_mut()
    }

    /// The protocol version used for structured decoding.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Override the protocol version.
    ///
    /// Normally adopted from the CONNECTED reply; the override exists
    /// for brokers that omit the `version` header.
    pub fn set_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    // ---- raw frame I/O -------------------------------------------------

    /// Write pre-rendered frame text and flush.
    ///
    /// The text goes out as-is. A complete frame ends with the NUL
    /// terminator, which [`Frame::format`] already includes.
    pub fn send_frame(&mut self, text: &str) -> Result<()> {
        self.write_all_parts(&[text.as_bytes()])
    }

    /// Write a frame's header text, then raw body bytes, then the NUL
    /// terminator, and flush.
    ///
    /// The body never passes through text encoding, so arbitrary bytes
    /// survive. The parts land back-to-back from this connection;
    /// nothing orders them against other writers of a cloned stream.
    pub fn send_frame_with_body(&mut self, frame_text: &str, body: &[u8]) -> Result<()> {
        self.write_all_parts(&[frame_text.as_bytes(), body, &[0x00]])
    }

    /// Send a heartbeat: a single bare line feed, no frame wrapper.
    ///
    /// Never reads a reply.
    pub fn keep_alive(&mut self) -> Result<()> {
        self.write_all_parts(&[b"\n"])
    }

    /// Reassemble one raw frame as text, using the default deadline.
    pub fn receive_frame(&mut self) -> Result<String> {
        self.receive_frame_with_timeout(RECEIVE_TIMEOUT)
    }

    /// Reassemble one raw frame as text.
    ///
    /// Runs the terminator scan a byte at a time: a NUL immediately
    /// followed by a line feed ends the frame, while a NUL followed by
    /// anything else is body data and both bytes are kept verbatim.
    /// This is an inherited wire convention with a known blind spot: a
    /// body containing the two-byte sequence `NUL LF` cannot be
    /// represented, and a peer that terminates frames with a lone NUL
    /// (no trailing newline) will not terminate the scan. Senders are
    /// expected to keep `NUL LF` out of raw-framed bodies.
    ///
    /// A timed-out call leaves the partially read bytes buffered, and a
    /// later call resumes the same frame. EOF discards the partial
    /// frame and fails as a protocol error.
    pub fn receive_frame_with_timeout(&mut self, timeout: Duration) -> Result<String> {
        let stream = self.stream.as_mut().ok_or(StompError::NotOpen)?;
        stream.set_read_timeout(Some(timeout))?;

        loop {
            let byte = match read_stream_byte(stream) {
                Ok(Some(b)) => b,
                Ok(None) => {
                    self.buf.clear();
                    return Err(closed_mid_frame());
                }
                Err(e) => return Err(map_read_error(e, timeout)),
            };

            if byte != 0x00 {
                self.buf.put_u8(byte);
                continue;
            }

            // NUL seen; only a following line feed ends the frame.
            match read_stream_byte(stream) {
                Ok(Some(b'\n')) => {
                    let raw = self.buf.split();
                    let text = std::str::from_utf8(&raw)
                        .map_err(FrameError::Encoding)?
                        .to_string();
                    return Ok(text);
                }
                Ok(Some(other)) => {
                    self.buf.put_u8(0x00);
                    self.buf.put_u8(other);
                }
                Ok(None) => {
                    self.buf.clear();
                    return Err(closed_mid_frame());
                }
                Err(e) => return Err(map_read_error(e, timeout)),
            }
        }
    }

    /// Receive one structured frame, using the default deadline.
    pub fn receive(&mut self) -> Result<Frame> {
        self.receive_with_timeout(RECEIVE_TIMEOUT)
    }

    /// Receive one structured frame.
    ///
    /// Parsing is delegated to [`StompCodec`] at the session's
    /// negotiated version, reading directly from the stream. Unlike
    /// [`receive_frame_with_timeout`](Self::receive_frame_with_timeout),
    /// a timeout mid-frame does not resume.
    pub fn receive_with_timeout(&mut self, timeout: Duration) -> Result<Frame> {
        let version = self.version;
        let stream = self.stream.as_mut().ok_or(StompError::NotOpen)?;
        stream.set_read_timeout(Some(timeout))?;

        StompCodec::new(version)
            .unmarshal(stream)
            .map_err(|e| map_frame_error(e, timeout))
    }

    // ---- protocol verbs ------------------------------------------------

    /// CONNECT with credentials and wait for the broker's reply.
    pub fn connect(&mut self, login: &str, passcode: &str) -> Result<Frame> {
        let mut connect_headers = Headers::new();
        connect_headers.insert(LOGIN, login);
        connect_headers.insert(PASSCODE, passcode);
        self.connect_with_headers(connect_headers)
    }

    /// CONNECT with credentials and a durable client identifier.
    pub fn connect_with_client_id(
        &mut self,
        login: &str,
        passcode: &str,
        client_id: &str,
    ) -> Result<Frame> {
        let mut connect_headers = Headers::new();
        connect_headers.insert(LOGIN, login);
        connect_headers.insert(PASSCODE, passcode);
        connect_headers.insert(CLIENT_ID, client_id);
        self.connect_with_headers(connect_headers)
    }

    /// CONNECT with caller-supplied headers and wait for the reply.
    ///
    /// Anything but a CONNECTED reply fails as a protocol error carrying
    /// the reply body as context. On success the broker's `version`
    /// header, when present and recognized, becomes the session version
    /// for later decodes, and the CONNECTED frame is returned.
    pub fn connect_with_headers(&mut self, connect_headers: Headers) -> Result<Frame> {
        let frame = Frame::with_headers(Command::Connect, connect_headers);
        debug!("sending CONNECT");
        self.send_frame(&frame.format()?)?;

        let reply = self.receive()?;
        if reply.command() != Command::Connected {
            let body = reply
                .body()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default();
            return Err(StompError::Protocol(format!("not connected: {body}")));
        }

        if let Some(raw) = reply.headers().get(VERSION) {
            if let Ok(version) = raw.parse::<ProtocolVersion>() {
                self.version = version;
            }
        }
        debug!(version = %self.version, "broker accepted connection");

        Ok(reply)
    }

    /// DISCONNECT (fire-and-forget).
    pub fn disconnect(&mut self) -> Result<()> {
        self.disconnect_with_receipt("")
    }

    /// DISCONNECT with a receipt request.
    ///
    /// An empty `receipt_id` sends a plain DISCONNECT. Callers wanting
    /// confirmation wait for the matching RECEIPT frame before closing.
    pub fn disconnect_with_receipt(&mut self, receipt_id: &str) -> Result<()> {
        let mut frame = Frame::new(Command::Disconnect);
        if !receipt_id.is_empty() {
            frame.headers_mut().insert(RECEIPT, receipt_id);
        }
        self.send_frame(&frame.format()?)
    }

    /// SEND a body to a destination.
    pub fn send(&mut self, destination: &str, body: impl AsRef<[u8]>) -> Result<()> {
        self.send_with(destination, body, None, Headers::new())
    }

    /// SEND with an optional transaction and extra headers.
    ///
    /// Extras keep their insertion order; the driver-owned `destination`
    /// and `transaction` headers follow, replacing colliding extras in
    /// place. The body goes out through the binary-safe split write, so
    /// it may hold arbitrary bytes.
    pub fn send_with(
        &mut self,
        destination: &str,
        body: impl AsRef<[u8]>,
        transaction: Option<&str>,
        extra: Headers,
    ) -> Result<()> {
        let mut send_headers = extra;
        send_headers.insert(DESTINATION, destination);
        if let Some(tx) = transaction {
            send_headers.insert(TRANSACTION, tx);
        }
        let frame = Frame::with_headers(Command::Send, send_headers);
        self.send_frame_with_body(&frame.header_text(), body.as_ref())
    }

    /// SUBSCRIBE to a destination with the broker's default ack mode.
    pub fn subscribe(&mut self, destination: &str) -> Result<()> {
        self.subscribe_with(destination, None, Headers::new())
    }

    /// SUBSCRIBE with an explicit ack mode and extra headers.
    pub fn subscribe_with(
        &mut self,
        destination: &str,
        ack: Option<AckMode>,
        extra: Headers,
    ) -> Result<()> {
        let mut sub_headers = extra;
        sub_headers.insert(DESTINATION, destination);
        if let Some(mode) = ack {
            sub_headers.insert(ACK, mode.as_str());
        }
        self.send_frame(&Frame::with_headers(Command::Subscribe, sub_headers).format()?)
    }

    /// UNSUBSCRIBE from a destination.
    pub fn unsubscribe(&mut self, destination: &str) -> Result<()> {
        self.unsubscribe_with(destination, Headers::new())
    }

    /// UNSUBSCRIBE with extra headers (receipt request, subscription id).
    pub fn unsubscribe_with(&mut self, destination: &str, extra: Headers) -> Result<()> {
        let mut unsub_headers = extra;
        unsub_headers.insert(DESTINATION, destination);
        self.send_frame(&Frame::with_headers(Command::Unsubscribe, unsub_headers).format()?)
    }

    /// BEGIN a transaction.
    pub fn begin(&mut self, transaction: &str) -> Result<()> {
        self.transaction_frame(Command::Begin, transaction)
    }

    /// COMMIT a transaction.
    pub fn commit(&mut self, transaction: &str) -> Result<()> {
        self.transaction_frame(Command::Commit, transaction)
    }

    /// ABORT a transaction.
    pub fn abort(&mut self, transaction: &str) -> Result<()> {
        self.transaction_frame(Command::Abort, transaction)
    }

    /// ACK a message by id.
    pub fn ack(&mut self, message_id: &str) -> Result<()> {
        self.ack_with(message_id, None)
    }

    /// ACK a message by id, optionally inside a transaction.
    pub fn ack_with(&mut self, message_id: &str, transaction: Option<&str>) -> Result<()> {
        let mut ack_headers = Headers::new();
        ack_headers.insert(MESSAGE_ID, message_id);
        if let Some(tx) = transaction {
            ack_headers.insert(TRANSACTION, tx);
        }
        self.send_frame(&Frame::with_headers(Command::Ack, ack_headers).format()?)
    }

    /// ACK a received MESSAGE frame.
    ///
    /// Fails as a protocol error when the frame has no `message-id`.
    pub fn ack_frame(&mut self, frame: &Frame) -> Result<()> {
        self.ack_frame_with(frame, None)
    }

    /// ACK a received MESSAGE frame, optionally inside a transaction.
    pub fn ack_frame_with(&mut self, frame: &Frame, transaction: Option<&str>) -> Result<()> {
        let message_id = frame.headers().get(MESSAGE_ID).ok_or_else(|| {
            StompError::Protocol("cannot ack a frame without a message-id header".to_string())
        })?;
        self.ack_with(message_id, transaction)
    }

    fn transaction_frame(&mut self, command: Command, transaction: &str) -> Result<()> {
        let frame = Frame::new(command).header(TRANSACTION, transaction);
        self.send_frame(&frame.format()?)
    }

    fn write_all_parts(&mut self, parts: &[&[u8]]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(StompError::NotOpen)?;
        for part in parts {
            stream
                .write_all(part)
                .map_err(|e| StompError::Transport(TransportError::Io(e)))?;
        }
        stream
            .flush()
            .map_err(|e| StompError::Transport(TransportError::Io(e)))?;
        Ok(())
    }
}

impl Default for StompConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StompConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StompConnection")
            .field("open", &self.stream.is_some())
            .field("version", &self.version)
            .field("buffered", &self.buf.len())
            .finish()
    }
}

/// Read a single byte, retrying interrupted reads.
///
/// Returns `None` at end of stream.
fn read_stream_byte(stream: &mut BrokerStream) -> std::io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn closed_mid_frame() -> StompError {
    StompError::Protocol("stream closed before frame terminator".to_string())
}

fn map_read_error(err: std::io::Error, timeout: Duration) -> StompError {
    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut {
        StompError::Timeout(timeout)
    } else {
        StompError::Transport(TransportError::Io(err))
    }
}

fn map_frame_error(err: FrameError, timeout: Duration) -> StompError {
    match err {
        FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
            StompError::Timeout(timeout)
        }
        FrameError::Io(e) => StompError::Transport(TransportError::Io(e)),
        FrameError::ConnectionClosed => closed_mid_frame(),
        other => StompError::Frame(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Instant;

    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _addr) = listener.accept().unwrap();
        (client, server)
    }

    fn open_connection() -> (StompConnection, TcpStream) {
        let (client, server) = tcp_pair();
        let mut conn = StompConnection::new();
        conn.open_stream(BrokerStream::from_std(client));
        (conn, server)
    }

    fn read_until_nul(stream: &mut TcpStream) -> Vec<u8> {
        let mut out = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            stream.read_exact(&mut byte).unwrap();
            if byte[0] == 0x00 {
                return out;
            }
            out.push(byte[0]);
        }
    }

    fn read_exact_bytes(stream: &mut TcpStream, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        stream.read_exact(&mut out).unwrap();
        out
    }

    #[test]
    fn test_send_writes_exact_bytes() {
        let (mut conn, mut server) = open_connection();

        conn.send("/queue/a", "hello").unwrap();

        let expected = b"SEND\ndestination:/queue/a\n\nhello\x00";
        let wire = read_exact_bytes(&mut server, expected.len());
        assert_eq!(wire, expected);
    }

    #[test]
    fn test_send_binary_body_survives_split_write() {
        let (mut conn, mut server) = open_connection();

        conn.send("/queue/bin", [0x00u8, 0x41]).unwrap();

        let expected = b"SEND\ndestination:/queue/bin\n\n\x00\x41\x00";
        let wire = read_exact_bytes(&mut server, expected.len());
        assert_eq!(wire, expected);
    }

    #[test]
    fn test_send_with_transaction_and_extra_headers() {
        let (mut conn, mut server) = open_connection();

        let extra: Headers = [("priority", "4")].into_iter().collect();
        conn.send_with("/queue/a", "x", Some("tx1"), extra).unwrap();

        let expected = b"SEND\npriority:4\ndestination:/queue/a\ntransaction:tx1\n\nx\x00";
        let wire = read_exact_bytes(&mut server, expected.len());
        assert_eq!(wire, expected);
    }

    #[test]
    fn test_subscribe_builds_destination_and_ack_headers() {
        let (mut conn, mut server) = open_connection();

        conn.subscribe_with("/queue/a", Some(AckMode::Client), Headers::new())
            .unwrap();

        let expected = b"SUBSCRIBE\ndestination:/queue/a\nack:client\n\n\x00";
        let wire = read_exact_bytes(&mut server, expected.len());
        assert_eq!(wire, expected);
    }

    #[test]
    fn test_transaction_verbs_build_transaction_header() {
        let (mut conn, mut server) = open_connection();

        conn.begin("tx9").unwrap();
        conn.commit("tx9").unwrap();
        conn.abort("tx9").unwrap();

        assert_eq!(read_until_nul(&mut server), b"BEGIN\ntransaction:tx9\n\n");
        assert_eq!(read_until_nul(&mut server), b"COMMIT\ntransaction:tx9\n\n");
        assert_eq!(read_until_nul(&mut server), b"ABORT\ntransaction:tx9\n\n");
    }

    #[test]
    fn test_keep_alive_writes_bare_newline() {
        let (mut conn, mut server) = open_connection();

        conn.keep_alive().unwrap();

        assert_eq!(read_exact_bytes(&mut server, 1), b"\n");
    }

    #[test]
    fn test_receive_frame_preserves_embedded_nul() {
        let (mut conn, mut server) = open_connection();

        server.write_all(b"MESSAGE\nh:v\n\nab\x00Acd\x00\n").unwrap();

        let text = conn.receive_frame_with_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(text.as_bytes(), b"MESSAGE\nh:v\n\nab\x00Acd");
    }

    #[test]
    fn test_receive_frame_times_out_then_resumes() {
        let (mut conn, mut server) = open_connection();

        server.write_all(b"MESSA").unwrap();

        let started = Instant::now();
        let err = conn
            .receive_frame_with_timeout(Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, StompError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));

        server.write_all(b"GE\nx:y\n\nbody\x00\n").unwrap();

        let text = conn.receive_frame_with_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(text, "MESSAGE\nx:y\n\nbody");
    }

    #[test]
    fn test_receive_frame_eof_mid_frame_is_protocol_error() {
        let (mut conn, mut server) = open_connection();

        server.write_all(b"MESSAGE\n\npartial").unwrap();
        drop(server);

        let err = conn
            .receive_frame_with_timeout(Duration::from_secs(2))
            .unwrap_err();
        assert!(matches!(err, StompError::Protocol(_)));
    }

    #[test]
    fn test_receive_parses_structured_frame() {
        let (mut conn, mut server) = open_connection();

        server
            .write_all(b"MESSAGE\ndestination:/queue/a\nmessage-id:m-7\n\npayload\x00\n")
            .unwrap();

        let frame = conn.receive_with_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(frame.command(), Command::Message);
        assert_eq!(frame.headers().get("message-id"), Some("m-7"));
        assert_eq!(frame.body(), Some(&b"payload"[..]));
    }

    #[test]
    fn test_version_override_changes_header_decoding() {
        let (mut conn, mut server) = open_connection();
        conn.set_version(ProtocolVersion::V1_1);

        server.write_all(b"MESSAGE\nsubject:a\\cb\n\nx\x00").unwrap();

        let frame = conn.receive_with_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(frame.headers().get("subject"), Some("a:b"));
    }

    #[test]
    fn test_raw_stream_access_for_out_of_band_io() {
        let (mut conn, mut server) = open_connection();

        assert!(conn.stream().unwrap().peer_addr().is_some());
        conn.stream_mut().unwrap().write_all(b"\n").unwrap();

        let mut byte = [0u8; 1];
        server.read_exact(&mut byte).unwrap();
        assert_eq!(byte[0], b'\n');
    }

    #[test]
    fn test_connect_handshake_success_adopts_version() {
        let (mut conn, server) = open_connection();

        let broker = thread::spawn(move || {
            let mut server = server;
            let connect = read_until_nul(&mut server);
            server
                .write_all(b"CONNECTED\nsession:s-1\nversion:1.1\n\n\x00\n")
                .unwrap();
            connect
        });

        let reply = conn.connect("user", "pass").unwrap();
        assert_eq!(reply.command(), Command::Connected);
        assert_eq!(reply.headers().get("session"), Some("s-1"));
        assert_eq!(conn.version(), ProtocolVersion::V1_1);

        let connect = broker.join().unwrap();
        let text = String::from_utf8(connect).unwrap();
        assert!(text.starts_with("CONNECT\n"));
        assert!(text.contains("login:user\n"));
        assert!(text.contains("passcode:pass\n"));
    }

    #[test]
    fn test_connect_rejected_with_error_frame() {
        let (mut conn, server) = open_connection();

        let broker = thread::spawn(move || {
            let mut server = server;
            let _connect = read_until_nul(&mut server);
            server
                .write_all(b"ERROR\nmessage:denied\n\nbad credentials\x00\n")
                .unwrap();
        });

        let err = conn.connect("user", "wrong").unwrap_err();
        match err {
            StompError::Protocol(msg) => assert!(msg.contains("bad credentials"), "got {msg:?}"),
            other => panic!("expected protocol error, got {other:?}"),
        }

        broker.join().unwrap();
    }

    #[test]
    fn test_connect_with_client_id_header() {
        let (mut conn, server) = open_connection();

        let broker = thread::spawn(move || {
            let mut server = server;
            let connect = read_until_nul(&mut server);
            server.write_all(b"CONNECTED\n\n\x00\n").unwrap();
            connect
        });

        conn.connect_with_client_id("user", "pass", "durable-3").unwrap();

        let text = String::from_utf8(broker.join().unwrap()).unwrap();
        assert!(text.contains("client-id:durable-3\n"));
    }

    #[test]
    fn test_ack_frame_uses_message_id_header() {
        let (mut conn, mut server) = open_connection();

        let message = Frame::new(Command::Message).header(MESSAGE_ID, "m-1");
        conn.ack_frame(&message).unwrap();

        assert_eq!(read_until_nul(&mut server), b"ACK\nmessage-id:m-1\n\n");
    }

    #[test]
    fn test_ack_frame_with_transaction_header() {
        let (mut conn, mut server) = open_connection();

        let message = Frame::new(Command::Message).header(MESSAGE_ID, "m-7");
        conn.ack_frame_with(&message, Some("tx2")).unwrap();

        assert_eq!(
            read_until_nul(&mut server),
            b"ACK\nmessage-id:m-7\ntransaction:tx2\n\n"
        );
    }

    #[test]
    fn test_ack_frame_without_message_id_fails() {
        let (mut conn, _server) = open_connection();

        let err = conn.ack_frame(&Frame::new(Command::Message)).unwrap_err();
        assert!(matches!(err, StompError::Protocol(_)));
    }

    #[test]
    fn test_disconnect_with_receipt_header() {
        let (mut conn, mut server) = open_connection();

        conn.disconnect_with_receipt("bye-1").unwrap();
        conn.disconnect().unwrap();

        assert_eq!(read_until_nul(&mut server), b"DISCONNECT\nreceipt:bye-1\n\n");
        assert_eq!(read_until_nul(&mut server), b"DISCONNECT\n\n");
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut conn, _server) = open_connection();

        assert!(conn.is_open());
        conn.close().unwrap();
        assert!(!conn.is_open());
        conn.close().unwrap();

        let mut never_opened = StompConnection::new();
        never_opened.close().unwrap();
    }

    #[test]
    fn test_operations_require_open_connection() {
        let mut conn = StompConnection::new();

        assert!(matches!(conn.send("/queue/a", "x"), Err(StompError::NotOpen)));
        assert!(matches!(conn.receive_frame(), Err(StompError::NotOpen)));
        assert!(matches!(conn.keep_alive(), Err(StompError::NotOpen)));
    }

    #[test]
    fn test_default_receive_timeout_is_ten_seconds() {
        assert_eq!(RECEIVE_TIMEOUT, Duration::from_secs(10));
    }
}
