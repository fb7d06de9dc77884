//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Inputs are borrowed C strings that are copied into a core `RequestSpec`
//! before any work starts. Outputs are heap allocations owned by the caller
//! until `snapreq_release_response`. Response buffers are raw byte slices with
//! a trailing NUL and an explicit length, so bodies containing NUL bytes
//! survive the trip.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use snapreq::{ExchangeError, Method, RequestSpec, ResponseRecord, Transport};

// ---------------------------------------------------------------------------
// Request input (caller-provided, borrowed for the duration of a call)
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiMethod {
    Get = 0,
    Delete = 1,
    Patch = 2,
    Post = 3,
    Put = 4,
}

impl From<FfiMethod> for Method {
    fn from(m: FfiMethod) -> Self {
        match m {
            FfiMethod::Get => Method::Get,
            FfiMethod::Delete => Method::Delete,
            FfiMethod::Patch => Method::Patch,
            FfiMethod::Post => Method::Post,
            FfiMethod::Put => Method::Put,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTransport {
    Tls = 0,
    Plain = 1,
}

impl From<FfiTransport> for Transport {
    fn from(t: FfiTransport) -> Self {
        match t {
            FfiTransport::Tls => Transport::Tls,
            FfiTransport::Plain => Transport::Plain,
        }
    }
}

/// One request, described with borrowed C strings.
///
/// `hostname` and `path` are required. `headers` and `body` may be null.
/// A `port` of 0 selects 443 for TLS and 80 for plain transport.
#[repr(C)]
pub struct FfiRequestSpec {
    pub method: FfiMethod,
    pub hostname: *const c_char,
    pub port: u16,
    pub path: *const c_char,
    pub headers: *const c_char,
    pub body: *const c_char,
    pub transport: FfiTransport,
    pub debug: bool,
}

/// Why an `FfiRequestSpec` could not be turned into a core spec.
#[derive(Debug)]
pub(crate) enum SpecError {
    Null(&'static str),
    Invalid(String),
}

impl FfiRequestSpec {
    /// Copy every field into an owned `RequestSpec`.
    ///
    /// # Safety
    /// Every non-null pointer must reference a NUL-terminated string that
    /// stays valid for the duration of this call.
    pub(crate) unsafe fn to_core(&self) -> Result<RequestSpec, SpecError> {
        let hostname = unsafe { required(self.hostname, "hostname") }?;
        let path = unsafe { required(self.path, "path") }?;
        if hostname.is_empty() {
            return Err(SpecError::Invalid("hostname is empty".to_string()));
        }

        let transport = Transport::from(self.transport);
        let port = match (self.port, transport) {
            (0, Transport::Tls) => snapreq::DEFAULT_HTTPS_PORT,
            (0, Transport::Plain) => snapreq::DEFAULT_HTTP_PORT,
            (p, _) => p,
        };

        let mut spec = RequestSpec::new(self.method.into(), hostname, path)
            .with_port(port)
            .with_transport(transport)
            .with_debug(self.debug);
        if let Some(headers) = unsafe { optional(self.headers, "headers") }? {
            spec = spec.with_headers(headers);
        }
        if let Some(body) = unsafe { optional(self.body, "body") }? {
            spec = spec.with_body(body);
        }
        Ok(spec)
    }
}

unsafe fn required<'a>(ptr: *const c_char, field: &'static str) -> Result<&'a str, SpecError> {
    match unsafe { optional(ptr, field) }? {
        Some(s) => Ok(s),
        None => Err(SpecError::Null(field)),
    }
}

unsafe fn optional<'a>(ptr: *const c_char, field: &'static str) -> Result<Option<&'a str>, SpecError> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(Some)
        .map_err(|e| SpecError::Invalid(format!("{field} is not valid UTF-8: {e}")))
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResponseResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Resolution = 1,
    Connection = 2,
    Tls = 3,
    Write = 4,
    Read = 5,
    Parse = 6,
    Dispatch = 7,
    NullArg = 8,
    InvalidArg = 9,
    Panic = 10,
}

impl From<&ExchangeError> for FfiErrorCode {
    fn from(e: &ExchangeError) -> Self {
        match e {
            ExchangeError::Resolution { .. } => FfiErrorCode::Resolution,
            ExchangeError::Connection { .. } => FfiErrorCode::Connection,
            ExchangeError::Tls { .. } => FfiErrorCode::Tls,
            ExchangeError::Write(_) => FfiErrorCode::Write,
            ExchangeError::Read(_) => FfiErrorCode::Read,
            ExchangeError::Parse(_) => FfiErrorCode::Parse,
            ExchangeError::Dispatch(_) => FfiErrorCode::Dispatch,
        }
    }
}

/// A parsed response exposed to C.
///
/// `headers` runs from the status line through the CRLF ending the last
/// header line. `body` is null when the response had no blank line. Both
/// buffers are NUL-terminated; the lengths exclude the terminator.
#[repr(C)]
pub struct FfiResponse {
    pub status: u16,
    pub headers: *mut c_char,
    pub headers_len: usize,
    pub body: *mut c_char,
    pub body_len: usize,
    /// Set when the response outgrew the buffer and its tail was dropped.
    pub truncated: bool,
}

/// Result envelope for every exchange.
///
/// On success `error_code` is `Ok`, `error_message` is null and `response` is
/// non-null. On failure `response` is null and `error_message` is a
/// human-readable C string.
#[repr(C)]
pub struct FfiResponseResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub response: *mut FfiResponse,
}

impl FfiResponseResult {
    pub(crate) fn from_core(result: Result<ResponseRecord, ExchangeError>) -> *mut Self {
        match result {
            Ok(record) => Self::ok(record),
            Err(e) => Self::error((&e).into(), &error_chain(&e)),
        }
    }

    pub(crate) fn ok(record: ResponseRecord) -> *mut Self {
        let truncated = record.is_truncated();
        let (status, headers, body) = record.into_parts();
        let (headers, headers_len) = into_c_buffer(headers);
        let (body, body_len) = match body {
            Some(b) => into_c_buffer(b),
            None => (std::ptr::null_mut(), 0),
        };
        let response = Box::new(FfiResponse {
            status,
            headers,
            headers_len,
            body,
            body_len,
            truncated,
        });
        Box::into_raw(Box::new(FfiResponseResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            response: Box::into_raw(response),
        }))
    }

    pub(crate) fn error(code: FfiErrorCode, message: &str) -> *mut Self {
        let message = CString::new(message.replace('\0', " "))
            .map(CString::into_raw)
            .unwrap_or(std::ptr::null_mut());
        Box::into_raw(Box::new(FfiResponseResult {
            error_code: code,
            error_message: message,
            response: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn from_spec_error(e: SpecError) -> *mut Self {
        match e {
            SpecError::Null(field) => Self::error(FfiErrorCode::NullArg, &format!("{field} is null")),
            SpecError::Invalid(msg) => Self::error(FfiErrorCode::InvalidArg, &msg),
        }
    }
}

/// `"outer: inner: innermost"` for an error and its sources.
fn error_chain(e: &ExchangeError) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Leak `bytes` plus a trailing NUL; returns the pointer and the length
/// without the terminator.
fn into_c_buffer(mut bytes: Vec<u8>) -> (*mut c_char, usize) {
    let len = bytes.len();
    bytes.push(0);
    let raw = Box::into_raw(bytes.into_boxed_slice());
    (raw as *mut u8 as *mut c_char, len)
}

/// Reclaim a buffer produced by `into_c_buffer`.
///
/// # Safety
/// `ptr` and `len` must come from the same `into_c_buffer` call.
pub(crate) unsafe fn free_c_buffer(ptr: *mut c_char, len: usize) {
    if ptr.is_null() {
        return;
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr as *mut u8, len + 1);
    drop(unsafe { Box::from_raw(slice) });
}
