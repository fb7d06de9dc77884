//! Single-shot HTTP/1.0 exchanges over TLS or plain TCP.
//!
//! # Overview
//! `request` connects, negotiates TLS, writes one request, reads until the
//! peer closes, and parses the result into a `ResponseRecord`.
//! `request_async` does the same on its own thread and delivers the outcome
//! to a callback.
//!
//! # Design
//! - Every exchange owns its connection, TLS session and buffers; the only
//!   process-wide state is the lazily built TLS trust configuration.
//! - Responses are framed by connection close and split at the first blank
//!   line. There is no keep-alive, chunked decoding, redirect handling or
//!   compression.
//! - Both buffers are bounded (10 KiB by default). Oversized requests are
//!   truncated and oversized responses lose their tail; both are logged.
//! - Failures carry the stage that failed and never come with a partial
//!   response.

pub mod client;
pub mod config;
pub mod connector;
mod dispatch;
pub mod error;
pub mod exchange;
pub mod http;
pub mod response;
pub mod tls;
pub mod wire;

pub use client::{request, request_async, Client};
pub use config::ClientConfig;
pub use error::ExchangeError;
pub use exchange::{ExchangeId, Stage};
pub use http::{Method, RequestSpec, Transport, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT};
pub use response::ResponseRecord;
pub use tls::TlsConfig;
pub use wire::{parse_response, serialize_request};
