//! Socket lifecycle: one TCP connection per request/response exchange.
//!
//! # Design
//! The [`Transport`] trait is the seam between request handling and the
//! network. [`TcpTransport`] is the real implementation; tests substitute a
//! recording double. Reads and writes block without a timeout, so a stalled
//! peer stalls the client until the process is interrupted.

use std::io::{ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, SocketAddrV4, TcpStream, ToSocketAddrs};

use log::{debug, error};

use crate::error::ApiError;
use crate::reader::read_response;

/// Carries one serialized request to the service and returns the raw
/// response text.
pub trait Transport {
    fn exchange(&mut self, request: &[u8]) -> Result<String, ApiError>;
}

/// Resolve `host` to its first IPv4 address. IPv6-only hosts are rejected.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddrV4, ApiError> {
    let unresolved = || ApiError::Resolve {
        host: host.to_string(),
    };
    (host, port)
        .to_socket_addrs()
        .map_err(|_| unresolved())?
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(unresolved)
}

/// Plain TCP transport that reconnects for every exchange.
#[derive(Debug)]
pub struct TcpTransport {
    addr: SocketAddrV4,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Resolve the service address. Fails with [`ApiError::Resolve`] if the
    /// host has no IPv4 record.
    pub fn new(host: &str, port: u16) -> Result<Self, ApiError> {
        let addr = resolve(host, port)?;
        debug!("resolved {host}:{port} to {addr}");
        Ok(Self { addr, stream: None })
    }

    pub fn addr(&self) -> SocketAddrV4 {
        self.addr
    }

    /// Open a fresh connection, replacing any previous one.
    pub fn connect(&mut self) -> Result<(), ApiError> {
        self.disconnect();
        let stream = TcpStream::connect(self.addr).map_err(|source| ApiError::Connect {
            addr: self.addr.to_string(),
            source,
        })?;
        debug!("connected to {}", self.addr);
        self.stream = Some(stream);
        Ok(())
    }

    /// Write all of `bytes`, looping over short writes.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), ApiError> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        write_all(stream, bytes)
    }

    /// Read one complete response from the open connection.
    pub fn receive(&mut self) -> Result<String, ApiError> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        read_response(stream)
    }

    /// Close the connection. Does nothing if already closed.
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!("disconnected from {}", self.addr);
        }
    }

    /// Connect and immediately disconnect, to fail fast on an unreachable
    /// service.
    pub fn probe(&mut self) -> Result<(), ApiError> {
        self.connect()?;
        self.disconnect();
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn exchange(&mut self, request: &[u8]) -> Result<String, ApiError> {
        self.connect()?;
        let result = self.send(request).and_then(|()| self.receive());
        self.disconnect();
        if let Err(e) = &result {
            if !e.is_fatal() {
                error!("exchange with {} failed: {e}", self.addr);
            }
        }
        result
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn not_connected() -> ApiError {
    ApiError::Io(ErrorKind::NotConnected.into())
}

/// Write-loop over any sink, stopping early if the peer accepts zero bytes.
pub fn write_all<W: Write>(sink: &mut W, bytes: &[u8]) -> Result<(), ApiError> {
    let mut sent = 0;
    while sent < bytes.len() {
        match sink.write(&bytes[sent..]) {
            Ok(0) => {
                return Err(ApiError::ConnectionClosed {
                    sent,
                    total: bytes.len(),
                })
            }
            Ok(n) => sent += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(ApiError::Io(e)),
        }
    }
    sink.flush()?;
    Ok(())
}
