//! Secure channel setup over an already connected TCP stream.
//!
//! # Design
//! The trust configuration (root store + crypto provider) is process-wide and
//! built at most once, under a mutex, the first time an exchange needs it.
//! Sessions are per exchange: `establish` creates a fresh
//! `rustls::ClientConnection`, sets SNI, and finishes the handshake over the
//! borrowed socket, so handshake failures are reported as TLS errors rather
//! than surfacing later as write errors. The socket stays with the caller,
//! which keeps ownership of cleanup.

use std::net::TcpStream;
use std::sync::{Arc, Mutex};

use rustls::pki_types::{CertificateDer, ServerName};

use crate::error::ExchangeError;

static SHARED: Mutex<Option<Arc<rustls::ClientConfig>>> = Mutex::new(None);

/// The process-wide client configuration, built on first use.
///
/// A failed build is not cached; the next caller tries again.
pub fn shared_client_config() -> Result<Arc<rustls::ClientConfig>, ExchangeError> {
    let mut slot = SHARED
        .lock()
        .map_err(|_| ExchangeError::tls("shared tls configuration lock poisoned"))?;
    if let Some(config) = slot.as_ref() {
        return Ok(Arc::clone(config));
    }

    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = Arc::new(build_client_config(roots)?);
    tracing::debug!(roots = webpki_roots::TLS_SERVER_ROOTS.len(), "initialized shared tls configuration");
    *slot = Some(Arc::clone(&config));
    Ok(config)
}

fn build_client_config(roots: rustls::RootCertStore) -> Result<rustls::ClientConfig, ExchangeError> {
    let config = rustls::ClientConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()
    .map_err(|e| ExchangeError::tls_with("protocol version setup", e))?
    .with_root_certificates(roots)
    .with_no_client_auth();
    Ok(config)
}

/// Which trust configuration a client uses.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    custom: Option<Arc<rustls::ClientConfig>>,
}

impl TlsConfig {
    /// Mozilla roots, shared by every client in the process.
    pub fn shared() -> Self {
        Self { custom: None }
    }

    /// Trust exactly the given DER certificates.
    pub fn with_root_certificates<I>(certs: I) -> Result<Self, ExchangeError>
    where
        I: IntoIterator<Item = CertificateDer<'static>>,
    {
        let mut roots = rustls::RootCertStore::empty();
        for cert in certs {
            roots
                .add(cert)
                .map_err(|e| ExchangeError::tls_with("invalid root certificate", e))?;
        }
        Ok(Self {
            custom: Some(Arc::new(build_client_config(roots)?)),
        })
    }

    pub(crate) fn resolve(&self) -> Result<Arc<rustls::ClientConfig>, ExchangeError> {
        match &self.custom {
            Some(config) => Ok(Arc::clone(config)),
            None => shared_client_config(),
        }
    }
}

impl From<Arc<rustls::ClientConfig>> for TlsConfig {
    fn from(config: Arc<rustls::ClientConfig>) -> Self {
        Self { custom: Some(config) }
    }
}

/// Start a client session for `hostname` on `tcp` and complete the handshake.
pub fn establish(
    tcp: &mut TcpStream,
    hostname: &str,
    config: &TlsConfig,
) -> Result<rustls::ClientConnection, ExchangeError> {
    let client_config = config.resolve()?;
    let server_name = ServerName::try_from(hostname)
        .map_err(|e| ExchangeError::tls_with(format!("invalid server name '{hostname}'"), e))?
        .to_owned();

    let mut session = rustls::ClientConnection::new(client_config, server_name)
        .map_err(|e| ExchangeError::tls_with("session creation", e))?;

    while session.is_handshaking() {
        match session.complete_io(tcp) {
            Ok((0, 0)) => {
                return Err(ExchangeError::tls("peer closed the connection during handshake"));
            }
            Ok(_) => {}
            Err(e) => return Err(ExchangeError::tls_with("handshake", e)),
        }
    }

    tracing::trace!(
        version = ?session.protocol_version(),
        suite = ?session.negotiated_cipher_suite().map(|s| s.suite()),
        "tls handshake complete"
    );
    Ok(session)
}
