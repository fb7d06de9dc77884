//! Request description types.
//!
//! # Design
//! A `RequestSpec` is plain data: the caller fills it in, the exchange engine
//! reads it. All string fields are owned, so `Clone` is a deep copy with no
//! aliasing back to the caller. The async dispatcher relies on that to hand an
//! independent copy to another thread.
//!
//! The header block is kept as the caller wrote it (`"Name: value\r\n"` lines)
//! and is written to the wire verbatim.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Port used when a spec does not name one.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Conventional port for `Transport::Plain`.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Delete,
    Patch,
    Post,
    Put,
}

impl Method {
    /// The request-line token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// Whether the serializer frames a body with `Content-Length`.
    pub fn sends_body(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method token is not one of the five supported methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Whether the exchange negotiates TLS on top of the TCP connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Tls,
    Plain,
}

/// Caller-supplied description of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub method: Method,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub path: String,
    /// Raw header lines, each already terminated by `\r\n`.
    #[serde(default)]
    pub headers: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub transport: Transport,
    /// Trace the wire request and the raw response at `debug` level.
    #[serde(default)]
    pub debug: bool,
}

fn default_port() -> u16 {
    DEFAULT_HTTPS_PORT
}

impl RequestSpec {
    /// A TLS request to port 443 with no headers and no body.
    pub fn new(method: Method, hostname: &str, path: &str) -> Self {
        Self {
            method,
            hostname: hostname.to_string(),
            port: DEFAULT_HTTPS_PORT,
            path: path.to_string(),
            headers: None,
            body: None,
            transport: Transport::Tls,
            debug: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replace the header block. Lines are not validated.
    pub fn with_headers(mut self, headers: &str) -> Self {
        self.headers = Some(headers.to_string());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
