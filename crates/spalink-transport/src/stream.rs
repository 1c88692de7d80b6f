use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// TCP port the controller listens on.
pub const DEFAULT_PORT: u16 = 4257;

/// Connect timeout applied per resolved address.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected controller stream — implements Read + Write.
///
/// Wraps a `TcpStream` with Nagle disabled, since control requests are a few
/// bytes each and should not be delayed.
pub struct SpaStream {
    inner: TcpStream,
    peer: SocketAddr,
}

impl SpaStream {
    /// Resolve `host` and connect to the first address that accepts.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let candidates: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                addr: addr.clone(),
                source,
            })?
            .collect();

        let mut last_err = None;
        for candidate in candidates {
            debug!(%candidate, "dialing controller");
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    info!(peer = %candidate, "connected to controller");
                    return Self::from_tcp(stream);
                }
                Err(err) => last_err = Some(err),
            }
        }

        match last_err {
            Some(source) => Err(TransportError::Connect { addr, source }),
            None => Err(TransportError::NoAddress { addr }),
        }
    }

    /// Wrap an already-connected `TcpStream`.
    pub fn from_tcp(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok(Self {
            inner: stream,
            peer,
        })
    }

    /// Address of the connected controller.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            peer: self.peer,
        })
    }

    /// Shut down both halves of the connection.
    pub fn shutdown(&self) -> Result<()> {
        self.inner
            .shutdown(std::net::Shutdown::Both)
            .map_err(Into::into)
    }

    /// Convert into a tokio stream. Must be called from within a runtime.
    #[cfg(feature = "async")]
    pub fn into_tokio(self) -> Result<tokio::net::TcpStream> {
        self.inner.set_nonblocking(true)?;
        tokio::net::TcpStream::from_std(self.inner).map_err(Into::into)
    }
}

impl Read for SpaStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SpaStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for SpaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaStream")
            .field("peer", &self.peer)
            .finish()
    }
}
