//! Error types for a single exchange.
//!
//! # Design
//! One variant per stage of the exchange, so a failure always says where it
//! happened. There is no partial-success variant: an exchange either yields a
//! `ResponseRecord` or one of these.

use std::io;

use crate::exchange::Stage;

/// Why an exchange produced no response.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The hostname did not resolve to an IPv4 address.
    #[error("could not resolve {host}:{port}: {message}")]
    Resolution {
        host: String,
        port: u16,
        message: String,
    },

    /// Socket setup or TCP connect failed.
    #[error("could not connect to {host}:{port}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// TLS session setup or handshake failed.
    #[error("tls: {message}")]
    Tls {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request could not be written in full.
    #[error("could not write request")]
    Write(#[source] io::Error),

    /// The transport reported an error while draining the response.
    #[error("could not read response")]
    Read(#[source] io::Error),

    /// The received bytes do not start with a usable status line.
    #[error("malformed response: {0}")]
    Parse(String),

    /// The thread for an async exchange could not be created.
    #[error("could not spawn exchange thread")]
    Dispatch(#[source] io::Error),
}

impl ExchangeError {
    /// Last stage reached before the failure.
    pub fn stage(&self) -> Stage {
        match self {
            ExchangeError::Resolution { .. }
            | ExchangeError::Connection { .. }
            | ExchangeError::Dispatch(_) => Stage::Init,
            ExchangeError::Tls { .. } => Stage::Connected,
            ExchangeError::Write(_) => Stage::SecureChannelEstablished,
            ExchangeError::Read(_) => Stage::RequestSent,
            ExchangeError::Parse(_) => Stage::ResponseReceived,
        }
    }

    /// Resolution and connect failures: the peer was never reached.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            ExchangeError::Resolution { .. } | ExchangeError::Connection { .. }
        )
    }

    pub(crate) fn tls(message: impl Into<String>) -> Self {
        ExchangeError::Tls {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn tls_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ExchangeError::Tls {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
