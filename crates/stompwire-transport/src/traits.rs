use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected broker stream implementing Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// It currently wraps a TCP stream; the inner enum leaves room for other
/// stream transports (TLS, Unix sockets) without changing the surface.
pub struct BrokerStream {
    inner: BrokerStreamInner,
}

enum BrokerStreamInner {
    Tcp(TcpStream),
}

impl Read for BrokerStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            BrokerStreamInner::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for BrokerStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            BrokerStreamInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            BrokerStreamInner::Tcp(stream) => stream.flush(),
        }
    }
}

impl BrokerStream {
    /// Create a BrokerStream from a connected TCP stream.
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: BrokerStreamInner::Tcp(stream),
        }
    }

    /// Adopt an already-connected TCP stream.
    ///
    /// Useful when the socket was established elsewhere (a proxy dialer,
    /// a test harness) and the session layer should take it over as-is.
    pub fn from_std(stream: TcpStream) -> Self {
        Self::from_tcp(stream)
    }

    /// Set the read deadline on the underlying stream.
    ///
    /// `Some(Duration::ZERO)` disables the deadline, mirroring the socket
    /// convention where a zero timeout means "block forever".
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = match timeout {
            Some(t) if t.is_zero() => None,
            other => other,
        };
        match &self.inner {
            BrokerStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set the write deadline on the underlying stream.
    ///
    /// Follows the same zero-means-infinite convention as
    /// [`set_read_timeout`](Self::set_read_timeout).
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = match timeout {
            Some(t) if t.is_zero() => None,
            other => other,
        };
        match &self.inner {
            BrokerStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new socket handle).
    ///
    /// Both handles refer to the same connection; a shutdown through one
    /// is observed by the other.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            BrokerStreamInner::Tcp(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_tcp(cloned))
            }
        }
    }

    /// Shut down both directions of the stream.
    ///
    /// An in-progress blocking read on a clone of this stream fails
    /// promptly after this returns.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            BrokerStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both).map_err(Into::into),
        }
    }

    /// The address of the connected peer, when the socket still has one.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match &self.inner {
            BrokerStreamInner::Tcp(stream) => stream.peer_addr().ok(),
        }
    }
}

impl std::fmt::Debug for BrokerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            BrokerStreamInner::Tcp(stream) => f
                .debug_struct("BrokerStream")
                .field("type", &"tcp")
                .field("peer", &stream.peer_addr().ok())
                .finish(),
        }
    }
}
