use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::BrokerStream;

/// TCP connector for broker sessions.
///
/// Resolves `host:port` and connects, trying each resolved address in
/// order and reporting the last failure if none succeeds. `TCP_NODELAY`
/// is enabled by default so small frames are not held back by the
/// kernel's send coalescing.
pub struct TcpConnector {
    connect_timeout: Option<Duration>,
    nodelay: bool,
}

impl TcpConnector {
    pub fn new() -> Self {
        Self {
            connect_timeout: None,
            nodelay: true,
        }
    }

    /// Set a per-address connect timeout.
    ///
    /// A zero duration means no timeout, the same convention the stream
    /// deadlines follow.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enable or disable `TCP_NODELAY` on the connected stream.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Connect to a listening broker (blocking).
    pub fn connect(&self, host: &str, port: u16) -> Result<BrokerStream> {
        let addrs: Vec<_> = (host, port)
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve {
                host: host.to_string(),
                port,
                source: e,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(TransportError::Resolve {
                host: host.to_string(),
                port,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "hostname resolved to no addresses",
                ),
            });
        }

        let mut last_err = None;
        for addr in addrs {
            let attempt = match self.connect_timeout {
                Some(timeout) if !timeout.is_zero() => TcpStream::connect_timeout(&addr, timeout),
                _ => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_nodelay(self.nodelay)?;
                    debug!(host, port, %addr, "connected to broker");
                    return Ok(BrokerStream::from_tcp(stream));
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(TransportError::Connect {
            host: host.to_string(),
            port,
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "no connect attempt was made")
            }),
        })
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn listen_local() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn test_connect_and_exchange() {
        let (listener, port) = listen_local();

        let handle = std::thread::spawn(move || {
            let (mut server, _addr) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            server.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
            server.write_all(b"olleh").unwrap();
        });

        let mut client = TcpConnector::new().connect("127.0.0.1", port).unwrap();
        client.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"olleh");

        handle.join().unwrap();
    }

    #[test]
    fn test_nodelay_off_and_peer_addr() {
        let (listener, port) = listen_local();

        let client = TcpConnector::new()
            .with_nodelay(false)
            .connect("127.0.0.1", port)
            .unwrap();
        let (_server, _addr) = listener.accept().unwrap();

        assert_eq!(client.peer_addr().unwrap().port(), port);
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to find a port with nothing listening on it.
        let (listener, port) = listen_local();
        drop(listener);

        let result = TcpConnector::new()
            .with_connect_timeout(Duration::from_secs(2))
            .connect("127.0.0.1", port);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_resolve_failure_reports_host_and_port() {
        // A name with an empty label is invalid and cannot resolve.
        let result = TcpConnector::new().connect("bad..host", 61613);

        match result {
            Err(TransportError::Resolve { host, port, .. }) => {
                assert_eq!(host, "bad..host");
                assert_eq!(port, 61613);
            }
            other => panic!("expected a resolve failure, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_read_timeout_means_infinite() {
        let (listener, port) = listen_local();

        let handle = std::thread::spawn(move || {
            let (mut server, _addr) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_millis(150));
            server.write_all(b"late").unwrap();
        });

        let mut client = TcpConnector::new().connect("127.0.0.1", port).unwrap();
        // A literal zero deadline would be rejected by the standard
        // library; here it must select "no deadline" instead.
        client.set_read_timeout(Some(Duration::ZERO)).unwrap();
        client.set_write_timeout(Some(Duration::ZERO)).unwrap();

        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"late");

        handle.join().unwrap();
    }

    #[test]
    fn test_read_timeout_expires() {
        let (listener, port) = listen_local();

        let client = TcpConnector::new().connect("127.0.0.1", port).unwrap();
        client
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();

        let (_server, _addr) = listener.accept().unwrap();

        let mut reader = client.try_clone().unwrap();
        let mut buf = [0u8; 1];
        let err = reader.read(&mut buf).unwrap_err();
        assert!(
            matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            "unexpected error kind: {:?}",
            err.kind()
        );
    }

    #[test]
    fn test_shutdown_fails_pending_read() {
        let (listener, port) = listen_local();

        let client = TcpConnector::new().connect("127.0.0.1", port).unwrap();
        let (_server, _addr) = listener.accept().unwrap();

        let mut reader = client.try_clone().unwrap();
        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 1];
            // Either EOF (Ok(0)) or an error is acceptable; the read must
            // not stay blocked once the socket is shut down.
            let _ = reader.read(&mut buf);
        });

        std::thread::sleep(Duration::from_millis(50));
        client.shutdown().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_debug_does_not_expose_inner_stream() {
        let (listener, port) = listen_local();
        let client = TcpConnector::new().connect("127.0.0.1", port).unwrap();
        let (_server, _addr) = listener.accept().unwrap();

        let rendered = format!("{client:?}");
        assert!(rendered.contains("BrokerStream"));
        assert!(rendered.contains("tcp"));
    }
}
