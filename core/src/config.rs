//! Client configuration.
//!
//! # Design
//! Every knob defaults to the behavior of a bare exchange: no timeouts and
//! 10 KiB buffers in each direction. Timeouts are opt-in; with none set, an
//! exchange whose peer never closes the connection blocks forever.
//!
//! Durations are written in milliseconds when a config is deserialized. The
//! TLS trust configuration is code-only and always starts as the shared
//! process-wide one.

use std::time::Duration;

use serde::Deserialize;

use crate::tls::TlsConfig;

/// Capacity of the serialized request buffer.
pub const DEFAULT_REQUEST_BUFFER_BYTES: usize = 10 * 1024;

/// Capacity of the response buffer; bytes beyond it are discarded.
pub const DEFAULT_RESPONSE_BUFFER_BYTES: usize = 10 * 1024;

/// Settings shared by every exchange a `Client` performs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(rename = "connect_timeout_ms", with = "opt_millis")]
    pub connect_timeout: Option<Duration>,
    #[serde(rename = "read_timeout_ms", with = "opt_millis")]
    pub read_timeout: Option<Duration>,
    #[serde(rename = "write_timeout_ms", with = "opt_millis")]
    pub write_timeout: Option<Duration>,
    pub request_buffer_capacity: usize,
    pub response_buffer_capacity: usize,
    #[serde(skip)]
    pub tls: TlsConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            request_buffer_capacity: DEFAULT_REQUEST_BUFFER_BYTES,
            response_buffer_capacity: DEFAULT_RESPONSE_BUFFER_BYTES,
            tls: TlsConfig::shared(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `SNAPREQ_*` environment variables.
    ///
    /// Recognized: `SNAPREQ_CONNECT_TIMEOUT_MS`, `SNAPREQ_READ_TIMEOUT_MS`,
    /// `SNAPREQ_WRITE_TIMEOUT_MS`, `SNAPREQ_REQUEST_BUFFER_BYTES`,
    /// `SNAPREQ_RESPONSE_BUFFER_BYTES`. Values that do not parse are logged
    /// and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<u64>() {
                Ok(n) => Some(n),
                Err(e) => {
                    tracing::warn!(key, value = %raw, error = %e, "ignoring unparsable setting");
                    None
                }
            }
        };

        let mut config = Self::default();
        if let Some(ms) = number("SNAPREQ_CONNECT_TIMEOUT_MS") {
            config.connect_timeout = timeout_from_millis(ms);
        }
        if let Some(ms) = number("SNAPREQ_READ_TIMEOUT_MS") {
            config.read_timeout = timeout_from_millis(ms);
        }
        if let Some(ms) = number("SNAPREQ_WRITE_TIMEOUT_MS") {
            config.write_timeout = timeout_from_millis(ms);
        }
        if let Some(n) = number("SNAPREQ_REQUEST_BUFFER_BYTES") {
            config.request_buffer_capacity = n as usize;
        }
        if let Some(n) = number("SNAPREQ_RESPONSE_BUFFER_BYTES") {
            config.response_buffer_capacity = n as usize;
        }
        config
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn with_response_buffer_capacity(mut self, bytes: usize) -> Self {
        self.response_buffer_capacity = bytes;
        self
    }

    pub fn with_request_buffer_capacity(mut self, bytes: usize) -> Self {
        self.request_buffer_capacity = bytes;
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }
}

/// `0` means no timeout; sockets reject a zero duration.
fn timeout_from_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.and_then(super::timeout_from_millis))
    }
}
