//! Blocking and fire-and-forget entry points.
//!
//! # Design
//! `Client` holds only its `ClientConfig` and carries no state between
//! exchanges: every call opens its own connection, negotiates its own TLS
//! session and closes both before returning. Cloning a client is cheap (the
//! TLS configuration is behind an `Arc`), which is what the async path relies
//! on when it moves a client into a new thread.
//!
//! The free functions `request` and `request_async` use a default client.

use crate::config::ClientConfig;
use crate::dispatch;
use crate::error::ExchangeError;
use crate::exchange::{self, ExchangeId};
use crate::http::RequestSpec;
use crate::response::ResponseRecord;

/// Performs exchanges with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run one exchange and block until it completes or fails.
    pub fn request(&self, spec: &RequestSpec) -> Result<ResponseRecord, ExchangeError> {
        exchange::run(spec, &self.config, ExchangeId::new())
    }

    /// Run one exchange on a new thread and hand the outcome to `on_complete`.
    ///
    /// `spec` is deep-copied before this returns, so the caller may change or
    /// drop it immediately. `Ok` only means the thread started; the exchange
    /// result arrives through `on_complete`, which is called exactly once.
    /// On `Err` the callback is never called.
    pub fn request_async<F>(&self, spec: &RequestSpec, on_complete: F) -> Result<ExchangeId, ExchangeError>
    where
        F: FnOnce(Result<ResponseRecord, ExchangeError>) + Send + 'static,
    {
        dispatch::spawn(self.clone(), spec.clone(), on_complete)
    }
}

/// `Client::request` with the default configuration.
pub fn request(spec: &RequestSpec) -> Result<ResponseRecord, ExchangeError> {
    Client::default().request(spec)
}

/// `Client::request_async` with the default configuration.
pub fn request_async<F>(spec: &RequestSpec, on_complete: F) -> Result<ExchangeId, ExchangeError>
where
    F: FnOnce(Result<ResponseRecord, ExchangeError>) + Send + 'static,
{
    Client::default().request_async(spec, on_complete)
}
