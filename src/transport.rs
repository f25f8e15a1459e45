/// Transport sessions
///
/// Every call opens a fresh TCP connection, writes one 2-byte request and reads
/// the response. The stream is dropped (and the connection closed) on every
/// exit path.

use crate::config::ClientConfig;
use crate::protocol::{Request, RequestError, PACKET_SIZE};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("timed out waiting for the exchange")]
    Timeout,

    #[error("i/o error: {0}")]
    Io(#[source] io::Error),

    #[error(transparent)]
    Request(#[from] RequestError),
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout,
            _ => TransportError::Io(e),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

/// One request/response exchange per call
pub trait Transport {
    /// Request every packet and read until the peer closes
    fn stream_all(&mut self) -> TransportResult<Vec<u8>>;

    /// Request a single packet. `Ok(None)` means the exchange answered with
    /// less than a full frame.
    fn resend(&mut self, sequence: i32) -> TransportResult<Option<Vec<u8>>>;
}

#[derive(Debug, Clone)]
pub struct TcpTransport {
    config: ClientConfig,
}

impl TcpTransport {
    pub fn new(config: ClientConfig) -> Self {
        TcpTransport { config }
    }

    fn connect(&self) -> TransportResult<TcpStream> {
        let addr = self.config.address();
        let resolved = addr.to_socket_addrs().map_err(|source| TransportError::Connect {
            addr: addr.clone(),
            source,
        })?;

        let mut last_err = None;
        for sock_addr in resolved {
            match TcpStream::connect_timeout(&sock_addr, self.config.connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.config.read_timeout))?;
                    stream.set_write_timeout(Some(self.config.write_timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(TransportError::Connect {
            addr,
            source: last_err
                .unwrap_or_else(|| io::Error::new(ErrorKind::NotFound, "no addresses resolved")),
        })
    }

    fn send(&self, request: Request) -> TransportResult<TcpStream> {
        let mut stream = self.connect()?;
        stream.write_all(&request.to_bytes())?;
        stream.flush()?;
        trace!(?request, "request sent");
        Ok(stream)
    }
}

impl Transport for TcpTransport {
    fn stream_all(&mut self) -> TransportResult<Vec<u8>> {
        let mut stream = self.send(Request::stream_all())?;

        // End-of-stream is the only terminator
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;

        debug!(bytes = buffer.len(), "stream all complete");
        Ok(buffer)
    }

    fn resend(&mut self, sequence: i32) -> TransportResult<Option<Vec<u8>>> {
        // Validate before touching the network
        let request = Request::resend(sequence)?;
        let mut stream = self.send(request)?;

        let mut frame = [0u8; PACKET_SIZE];
        let mut filled = 0;
        while filled < PACKET_SIZE {
            match stream.read(&mut frame[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < PACKET_SIZE {
            debug!(sequence, bytes = filled, "short resend response");
            return Ok(None);
        }
        Ok(Some(frame.to_vec()))
    }
}
