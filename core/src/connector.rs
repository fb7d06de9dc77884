//! Hostname resolution and TCP connect.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::ExchangeError;

/// Resolve `hostname` to its first IPv4 address.
pub fn resolve_ipv4(hostname: &str, port: u16) -> Result<SocketAddr, ExchangeError> {
    let resolution = |message: String| ExchangeError::Resolution {
        host: hostname.to_string(),
        port,
        message,
    };
    (hostname, port)
        .to_socket_addrs()
        .map_err(|e| resolution(e.to_string()))?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| resolution("no ipv4 address".to_string()))
}

/// Open a TCP connection with Nagle's algorithm disabled.
///
/// One attempt only. Configured timeouts are applied to the connect and to
/// the returned stream.
pub fn connect(hostname: &str, port: u16, config: &ClientConfig) -> Result<TcpStream, ExchangeError> {
    let addr = resolve_ipv4(hostname, port)?;
    let connection = |source: std::io::Error| ExchangeError::Connection {
        host: hostname.to_string(),
        port,
        source,
    };

    let stream = match nonzero(config.connect_timeout) {
        Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
        None => TcpStream::connect(addr),
    }
    .map_err(connection)?;

    stream.set_nodelay(true).map_err(connection)?;
    stream.set_read_timeout(nonzero(config.read_timeout)).map_err(connection)?;
    stream.set_write_timeout(nonzero(config.write_timeout)).map_err(connection)?;

    tracing::debug!(%addr, "tcp connected");
    Ok(stream)
}

/// A zero timeout set in code is treated as no timeout.
fn nonzero(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|d| !d.is_zero())
}
