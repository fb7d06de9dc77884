//! Thread-per-exchange dispatch for `request_async`.
//!
//! The thread owns its copy of the spec and its client; nothing is shared with
//! the dispatching thread and the thread is never joined.

use std::thread;

use crate::client::Client;
use crate::error::ExchangeError;
use crate::exchange::{self, ExchangeId};
use crate::http::RequestSpec;
use crate::response::ResponseRecord;

pub(crate) fn spawn<F>(client: Client, spec: RequestSpec, on_complete: F) -> Result<ExchangeId, ExchangeError>
where
    F: FnOnce(Result<ResponseRecord, ExchangeError>) + Send + 'static,
{
    let id = ExchangeId::new();
    let handle = thread::Builder::new()
        .name(format!("snapreq-{}", &id.to_string()[..8]))
        .spawn(move || {
            let result = exchange::run(&spec, client.config(), id);
            on_complete(result);
        })
        .map_err(|e| {
            tracing::warn!(%id, error = %e, "could not spawn exchange thread");
            ExchangeError::Dispatch(e)
        })?;

    tracing::debug!(%id, thread = ?handle.thread().id(), "dispatched exchange");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    use super::*;
    use crate::http::{Method, Transport};

    #[test]
    fn callback_runs_exactly_once_on_a_named_thread() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let spec = RequestSpec::new(Method::Get, "127.0.0.1", "/")
            .with_port(port)
            .with_transport(Transport::Plain);

        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let counted = Arc::clone(&calls);
        let id = spawn(Client::default(), spec, move |result| {
            counted.fetch_add(1, Ordering::SeqCst);
            let name = thread::current().name().map(str::to_owned);
            tx.send((result.is_err(), name)).unwrap();
        })
        .unwrap();

        let (failed, name) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(failed);
        assert_eq!(name.unwrap(), format!("snapreq-{}", &id.to_string()[..8]));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
