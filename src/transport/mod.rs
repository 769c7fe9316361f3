// Copyright 2024 Kafka Client Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! One TCP endpoint: bounded-time connect/send/receive over a single
//! blocking socket, with the 4-byte length-prefix framing every legacy
//! Kafka frame uses.
//!
//! This crate's Connection is a single-threaded, cooperative, blocking
//! caller (spec.md §5): it suspends only at explicit socket I/O and at
//! backoff sleeps, never across an await point. A [`TcpTransport`] is
//! therefore built on `std::net::TcpStream`, not an async runtime -- unlike
//! the broker side of this wire protocol, which serves many connections at
//! once and needs one.

pub mod mock;

use std::io::Read;
use std::io::Write;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;

use crate::error::ClientError;

/// Whether to prefer IPv4 or IPv6 addresses when a hostname resolves to
/// both, or to require one and fail on a host that offers only the other.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum IpVersion {
    #[default]
    Any,
    V4Only,
    V6Only,
}

impl IpVersion {
    fn accepts(self, addr: &std::net::SocketAddr) -> bool {
        match self {
            IpVersion::Any => true,
            IpVersion::V4Only => addr.is_ipv4(),
            IpVersion::V6Only => addr.is_ipv6(),
        }
    }
}

/// One network endpoint a Connection can send a request to and read a
/// response from. The real implementation is [`TcpTransport`]; tests drive
/// [`mock::MockTransport`] instead.
pub trait Transport {
    fn send(&mut self, endpoint: &str, frame: &[u8]) -> Result<(), ClientError>;
    fn receive(&mut self, endpoint: &str) -> Result<Vec<u8>, ClientError>;
}

/// A connected (or lazily-connecting) blocking TCP socket to one broker.
pub struct TcpTransport {
    endpoint: String,
    connect_timeout: Duration,
    io_timeout: Duration,
    ip_version: IpVersion,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration, io_timeout: Duration) -> TcpTransport {
        TcpTransport {
            endpoint: endpoint.into(),
            connect_timeout,
            io_timeout,
            ip_version: IpVersion::Any,
            stream: None,
        }
    }

    pub fn with_ip_version(mut self, ip_version: IpVersion) -> TcpTransport {
        self.ip_version = ip_version;
        self
    }

    fn ensure_connected(&mut self) -> Result<&mut TcpStream, ClientError> {
        if self.stream.is_none() {
            let addr = self.resolve()?;
            log::debug!("connecting to {} ({addr})", self.endpoint);
            let stream = TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(|e| {
                ClientError::CannotBind {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                }
            })?;
            stream
                .set_read_timeout(Some(self.io_timeout))
                .map_err(|e| ClientError::CannotBind {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                })?;
            stream
                .set_write_timeout(Some(self.io_timeout))
                .map_err(|e| ClientError::CannotBind {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                })?;
            stream.set_nodelay(true).ok();
            self.stream = Some(stream);
        }
        Ok(self.stream.as_mut().expect("just inserted"))
    }

    fn resolve(&self) -> Result<std::net::SocketAddr, ClientError> {
        let addrs = self
            .endpoint
            .to_socket_addrs()
            .map_err(|e| ClientError::CannotBind {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;
        addrs
            .filter(|addr| self.ip_version.accepts(addr))
            .next()
            .ok_or_else(|| ClientError::IncompatibleHostIpVersion {
                host: self.endpoint.clone(),
            })
    }

    /// Drops the underlying socket so the next `send`/`receive` reconnects.
    /// Called by the Connection when an I/O error suggests the peer is gone.
    pub fn reset(&mut self) {
        self.stream = None;
    }
}

/// Whether `kind` is what `set_read_timeout`/`set_write_timeout` raise once
/// the configured deadline elapses (spec.md §4.4/§5): `WouldBlock` on most
/// platforms, `TimedOut` on others.
fn is_timeout(kind: std::io::ErrorKind) -> bool {
    matches!(kind, std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
}

impl Transport for TcpTransport {
    fn send(&mut self, endpoint: &str, frame: &[u8]) -> Result<(), ClientError> {
        debug_assert_eq!(endpoint, self.endpoint);
        let timeout_ms = self.io_timeout.as_millis() as u64;
        let result = {
            let stream = self.ensure_connected()?;
            stream.write_all(frame)
        };
        result.map_err(|e| {
            self.stream = None;
            if is_timeout(e.kind()) {
                ClientError::IoTimeout {
                    endpoint: endpoint.to_string(),
                    timeout_ms,
                }
            } else {
                ClientError::CannotSend {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn receive(&mut self, endpoint: &str) -> Result<Vec<u8>, ClientError> {
        debug_assert_eq!(endpoint, self.endpoint);
        let timeout_ms = self.io_timeout.as_millis() as u64;

        let mut len_buf = [0u8; 4];
        let read_len = {
            let stream = self.ensure_connected()?;
            stream.read_exact(&mut len_buf)
        };
        if let Err(e) = read_len {
            self.stream = None;
            return Err(if is_timeout(e.kind()) {
                ClientError::IoTimeout {
                    endpoint: endpoint.to_string(),
                    timeout_ms,
                }
            } else {
                ClientError::CannotRecv {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
            });
        }
        let len = i32::from_be_bytes(len_buf);
        if len < 0 {
            return Err(ClientError::RequestOrResponseMalformed(format!(
                "negative frame length {len}"
            )));
        }

        let mut body = vec![0u8; len as usize];
        let read_body = {
            let stream = self.ensure_connected()?;
            stream.read_exact(&mut body)
        };
        read_body.map_err(|e| {
            self.stream = None;
            if is_timeout(e.kind()) {
                ClientError::IoTimeout {
                    endpoint: endpoint.to_string(),
                    timeout_ms,
                }
            } else {
                ClientError::CannotRecv {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
            }
        })?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_timeout_error_kinds() {
        assert!(is_timeout(std::io::ErrorKind::WouldBlock));
        assert!(is_timeout(std::io::ErrorKind::TimedOut));
        assert!(!is_timeout(std::io::ErrorKind::ConnectionReset));
        assert!(!is_timeout(std::io::ErrorKind::UnexpectedEof));
    }
}
