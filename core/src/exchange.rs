//! One request/response cycle over one connection.
//!
//! # Design
//! The exchange is a straight line of stages with no loops back:
//!
//! ```text
//! Init -> Connected -> SecureChannelEstablished -> RequestSent
//!      -> ResponseReceived -> Parsed
//! ```
//!
//! Each stage returns early on failure via `?`. The socket is owned by a
//! `Connection` from the moment it connects, and `Connection::drop` shuts it
//! down and closes it, so cleanup happens exactly once on every exit path. The
//! TLS session lives inside the same guard and is released with it.
//! `Transport::Plain` skips `SecureChannelEstablished`. There are no terminal
//! `Done`/`Failed` variants: the `Result` returned by `run` is the terminal
//! state, and a failure's `ExchangeError::stage` names the last stage reached.
//!
//! A spec's `debug` flag logs the wire request and the raw response at `info`,
//! so the flag takes effect under the usual `info` filter.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use uuid::Uuid;

use crate::config::ClientConfig;
use crate::connector;
use crate::error::ExchangeError;
use crate::http::{RequestSpec, Transport};
use crate::response::ResponseRecord;
use crate::tls;
use crate::wire;

/// Progress of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    Connected,
    SecureChannelEstablished,
    RequestSent,
    ResponseReceived,
    Parsed,
}

/// Correlates log events, async dispatches and their callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Socket plus optional TLS session; shuts the socket down when dropped.
struct Connection {
    tcp: TcpStream,
    session: Option<rustls::ClientConnection>,
}

impl Connection {
    fn new(tcp: TcpStream) -> Self {
        Self { tcp, session: None }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.session {
            Some(session) => rustls::Stream::new(session, &mut self.tcp).read(buf),
            None => self.tcp.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.session {
            Some(session) => rustls::Stream::new(session, &mut self.tcp).write(buf),
            None => self.tcp.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.session {
            Some(session) => rustls::Stream::new(session, &mut self.tcp).flush(),
            None => self.tcp.flush(),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.tcp.shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                tracing::debug!(error = %e, "socket shutdown failed");
            }
        }
        tracing::trace!("connection closed");
    }
}

/// Run one exchange inside its own span.
pub(crate) fn run(
    spec: &RequestSpec,
    config: &ClientConfig,
    id: ExchangeId,
) -> Result<ResponseRecord, ExchangeError> {
    let span = tracing::debug_span!(
        "exchange",
        %id,
        host = %spec.hostname,
        port = spec.port,
        method = %spec.method,
    );
    let _entered = span.enter();

    let result = run_stages(spec, config);
    match &result {
        Ok(record) => tracing::debug!(
            status = record.status(),
            body_len = record.body().len(),
            truncated = record.is_truncated(),
            "exchange complete"
        ),
        Err(e) => tracing::warn!(
            stage = ?e.stage(),
            error = %e,
            cause = ?std::error::Error::source(e).map(|s| s.to_string()),
            "exchange failed"
        ),
    }
    result
}

fn run_stages(spec: &RequestSpec, config: &ClientConfig) -> Result<ResponseRecord, ExchangeError> {
    let mut conn = Connection::new(connector::connect(&spec.hostname, spec.port, config)?);
    reached(Stage::Connected);

    if spec.transport == Transport::Tls {
        conn.session = Some(tls::establish(&mut conn.tcp, &spec.hostname, &config.tls)?);
        reached(Stage::SecureChannelEstablished);
    }

    let request = wire::serialize_request(spec, config.request_buffer_capacity);
    if spec.debug {
        tracing::info!(request = %String::from_utf8_lossy(&request), "sending request");
    }
    conn.write_all(&request).map_err(ExchangeError::Write)?;
    conn.flush().map_err(ExchangeError::Write)?;
    reached(Stage::RequestSent);

    let raw = wire::read_response(&mut conn, config.response_buffer_capacity)?;
    reached(Stage::ResponseReceived);
    if spec.debug {
        tracing::info!(
            bytes = raw.bytes.len(),
            response = %String::from_utf8_lossy(&raw.bytes),
            "received response"
        );
    }

    let record = wire::parse_response(&raw.bytes, raw.discarded > 0)?;
    reached(Stage::Parsed);
    if spec.debug {
        tracing::info!(
            status = record.status(),
            headers = %record.headers_str(),
            body = %record.body_str(),
            "parsed response"
        );
    }
    Ok(record)
}

fn reached(stage: Stage) {
    tracing::trace!(?stage, "stage reached");
}
