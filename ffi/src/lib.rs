//! C-ABI wrapper around `snapreq`.
//!
//! # Overview
//! Exposes one blocking and one fire-and-forget exchange through `extern "C"`
//! functions, plus a release function for the results they hand out.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Request strings are borrowed only for the duration of the call. The async
//!   entry point copies them into an owned spec before it returns.
//! - Every outcome is a heap-allocated `FfiResponseResult`; the C caller owns
//!   it and must pass it to `snapreq_release_response`.
//! - Clients are configured from `SNAPREQ_*` environment variables on every
//!   call.
//! - Logs go to stderr through a `tracing` subscriber installed by
//!   `snapreq_init_logging`, or on the first request whose spec sets `debug`.
//!   `RUST_LOG` overrides the default `snapreq=info` filter.

pub mod types;

use std::ffi::{c_void, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use snapreq::{Client, ClientConfig};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use types::*;

/// Completion callback for `snapreq_request_async`.
///
/// Receives an owned result (release it with `snapreq_release_response`) and
/// the `user_data` pointer given at dispatch.
pub type SnapreqCallback = extern "C" fn(result: *mut FfiResponseResult, user_data: *mut c_void);

fn client() -> Client {
    Client::new(ClientConfig::from_env())
}

/// Whether this library's subscriber became the global default.
static LOGGING: OnceLock<bool> = OnceLock::new();

fn log_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("snapreq=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .finish()
}

fn init_logging() -> bool {
    *LOGGING.get_or_init(|| {
        tracing::subscriber::set_global_default(log_subscriber(std::io::stderr)).is_ok()
    })
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a stderr log subscriber for the whole process.
///
/// Returns 0 when this library's subscriber is active (now or from an earlier
/// call) and 1 when the host process already installed its own. Requests
/// with `debug` set call this implicitly.
#[unsafe(no_mangle)]
pub extern "C" fn snapreq_init_logging() -> i32 {
    catch_unwind(|| if init_logging() { 0 } else { 1 }).unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Exchanges
// ---------------------------------------------------------------------------

/// Run one exchange and block until it completes or fails.
///
/// Never returns null. Argument problems are reported as `NullArg` or
/// `InvalidArg` results; panics as `Panic`.
#[unsafe(no_mangle)]
pub extern "C" fn snapreq_request(spec: *const FfiRequestSpec) -> *mut FfiResponseResult {
    catch_unwind(|| {
        if spec.is_null() {
            return FfiResponseResult::error(FfiErrorCode::NullArg, "spec is null");
        }
        let spec = match unsafe { (*spec).to_core() } {
            Ok(spec) => spec,
            Err(e) => return FfiResponseResult::from_spec_error(e),
        };
        if spec.debug {
            init_logging();
        }
        FfiResponseResult::from_core(client().request(&spec))
    })
    .unwrap_or_else(|_| FfiResponseResult::error(FfiErrorCode::Panic, "panic during request"))
}

/// Wrapper that lets the caller's opaque pointer travel to the worker thread.
struct UserData(*mut c_void);

// The pointer is only handed back to the caller's callback, never dereferenced.
unsafe impl Send for UserData {}

impl UserData {
    fn into_inner(self) -> *mut c_void {
        self.0
    }
}

/// Start one exchange on its own thread and return immediately.
///
/// Returns 0 when the exchange was dispatched; `callback` is then invoked
/// exactly once, from the worker thread, with an owned result. Returns -1
/// when `spec` or `callback` is null, the spec is invalid, or the thread could
/// not be started; `callback` is never invoked in that case.
#[unsafe(no_mangle)]
pub extern "C" fn snapreq_request_async(
    spec: *const FfiRequestSpec,
    callback: Option<SnapreqCallback>,
    user_data: *mut c_void,
) -> i32 {
    catch_unwind(|| {
        let Some(callback) = callback else {
            tracing::warn!("async request without callback");
            return -1;
        };
        if spec.is_null() {
            tracing::warn!("async request with null spec");
            return -1;
        }
        let spec = match unsafe { (*spec).to_core() } {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!(error = ?e, "async request with invalid spec");
                return -1;
            }
        };
        if spec.debug {
            init_logging();
        }

        let user_data = UserData(user_data);
        let dispatched = client().request_async(&spec, move |result| {
            let ffi_result = catch_unwind(AssertUnwindSafe(|| FfiResponseResult::from_core(result)))
                .unwrap_or_else(|_| {
                    FfiResponseResult::error(FfiErrorCode::Panic, "panic while converting response")
                });
            callback(ffi_result, user_data.into_inner());
        });
        match dispatched {
            Ok(id) => {
                tracing::debug!(%id, "async request dispatched");
                0
            }
            Err(_) => -1,
        }
    })
    .unwrap_or(-1)
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Release a result from `snapreq_request` or a completion callback, along
/// with the response and strings it carries. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn snapreq_release_response(result: *mut FfiResponseResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.response.is_null() {
            let response = unsafe { Box::from_raw(result.response) };
            unsafe {
                free_c_buffer(response.headers, response.headers_len);
                free_c_buffer(response.body, response.body_len);
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
