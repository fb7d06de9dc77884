//! HTTP/1.0 wire format: request serialization and response framing.
//!
//! # Design
//! Requests are rendered into a bounded buffer; anything past the capacity is
//! cut off. Responses are framed by connection close only: bytes are
//! accumulated until the peer ends the stream, then split at the first blank
//! line. `Content-Length` and chunked encoding in the response are ignored.

use std::io::{self, Read};

use crate::error::ExchangeError;
use crate::http::RequestSpec;
use crate::response::ResponseRecord;

const HEADER_END: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 4096;

/// Render `spec` as an HTTP/1.0 request of at most `capacity` bytes.
///
/// GET requests end after the header block. Every other method gets a
/// `Content-Length` header, a blank line and the body (length 0 and nothing
/// after the blank line when there is no body).
pub fn serialize_request(spec: &RequestSpec, capacity: usize) -> Vec<u8> {
    let headers = spec.headers.as_deref().unwrap_or("");
    let mut out = format!(
        "{} {} HTTP/1.0\r\nHost: {}\r\n{}",
        spec.method, spec.path, spec.hostname, headers
    )
    .into_bytes();

    if spec.method.sends_body() {
        let body = spec.body.as_deref().unwrap_or("");
        out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
        out.extend_from_slice(body.as_bytes());
    } else {
        out.extend_from_slice(b"\r\n");
    }

    if out.len() > capacity {
        tracing::warn!(
            len = out.len(),
            capacity,
            "serialized request exceeds buffer capacity; truncating"
        );
        out.truncate(capacity);
    }
    out
}

/// Bytes drained from a connection until end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub bytes: Vec<u8>,
    /// Bytes received beyond `capacity` and dropped.
    pub discarded: usize,
}

/// Read until the peer closes, keeping at most `capacity` bytes.
///
/// A TLS peer that closes without `close_notify` shows up as
/// `UnexpectedEof`; that is taken as the end of the response.
pub fn read_response<R: Read>(reader: &mut R, capacity: usize) -> Result<RawResponse, ExchangeError> {
    let mut bytes = Vec::with_capacity(capacity.min(READ_CHUNK));
    let mut discarded = 0usize;
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::debug!("peer closed without close_notify");
                break;
            }
            Err(e) => return Err(ExchangeError::Read(e)),
        };
        let room = capacity - bytes.len();
        let keep = n.min(room);
        bytes.extend_from_slice(&chunk[..keep]);
        discarded += n - keep;
        tracing::trace!(read = n, total = bytes.len(), "read response bytes");
    }

    if discarded > 0 {
        tracing::warn!(capacity, discarded, "response exceeds buffer capacity; tail dropped");
    }
    Ok(RawResponse { bytes, discarded })
}

/// Split received bytes into status, header block and body.
///
/// The header block runs through the `\r\n` that ends the last header line;
/// the body is whatever follows the blank line. With no blank line the whole
/// input is the header block and there is no body.
pub fn parse_response(bytes: &[u8], truncated: bool) -> Result<ResponseRecord, ExchangeError> {
    let (headers, body) = match find(bytes, HEADER_END) {
        Some(at) => (&bytes[..at + 2], Some(bytes[at + HEADER_END.len()..].to_vec())),
        None => (bytes, None),
    };
    let status = parse_status_line(headers)?;
    Ok(ResponseRecord {
        status,
        headers: headers.to_vec(),
        body,
        truncated,
    })
}

/// Extract the code from `HTTP/<version> NNN[ reason]`.
fn parse_status_line(headers: &[u8]) -> Result<u16, ExchangeError> {
    let line = match find(headers, b"\r\n") {
        Some(end) => &headers[..end],
        None => headers,
    };
    if !line.starts_with(b"HTTP/") {
        return Err(ExchangeError::Parse(format!(
            "status line does not start with HTTP/: {:?}",
            String::from_utf8_lossy(&line[..line.len().min(32)])
        )));
    }

    let mut parts = line.splitn(3, |b| *b == b' ');
    let _version = parts.next();
    let code = parts
        .next()
        .ok_or_else(|| ExchangeError::Parse("status line has no status code".to_string()))?;
    if code.len() != 3 || !code.iter().all(u8::is_ascii_digit) {
        return Err(ExchangeError::Parse(format!(
            "invalid status code {:?}",
            String::from_utf8_lossy(code)
        )));
    }
    Ok(code
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0')))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, RequestSpec};

    fn spec(method: Method) -> RequestSpec {
        RequestSpec::new(method, "api.example.com", "/v1/items")
    }

    #[test]
    fn get_has_no_content_length_or_body() {
        let wire = serialize_request(
            &spec(Method::Get)
                .with_headers("Accept: */*\r\n")
                .with_body("ignored"),
            1024,
        );
        assert_eq!(
            wire,
            b"GET /v1/items HTTP/1.0\r\nHost: api.example.com\r\nAccept: */*\r\n\r\n"
        );
    }

    #[test]
    fn post_frames_body_with_byte_length() {
        let body = "héllo wörld";
        let wire = serialize_request(&spec(Method::Post).with_body(body), 1024);
        let text = String::from_utf8(wire).unwrap();
        assert!(text.contains(&format!("Content-Length: {}\r\n\r\n", body.len())));
        assert!(text.ends_with(body));
        assert_eq!(body.len(), 13);
    }

    #[test]
    fn every_non_get_method_carries_content_length() {
        for method in [Method::Delete, Method::Patch, Method::Post, Method::Put] {
            let wire = serialize_request(&spec(method).with_body("abc"), 1024);
            let text = String::from_utf8(wire).unwrap();
            assert!(text.starts_with(&format!("{method} /v1/items HTTP/1.0\r\n")));
            assert!(text.ends_with("Content-Length: 3\r\n\r\nabc"), "{method}");
        }
    }

    #[test]
    fn missing_headers_and_body_render_empty() {
        let wire = serialize_request(&spec(Method::Delete), 1024);
        assert_eq!(
            wire,
            b"DELETE /v1/items HTTP/1.0\r\nHost: api.example.com\r\nContent-Length: 0\r\n\r\n"
        );
    }

    #[test]
    fn oversized_request_is_truncated_to_capacity() {
        let body = "x".repeat(200);
        let wire = serialize_request(&spec(Method::Put).with_body(&body), 64);
        assert_eq!(wire.len(), 64);
        assert!(wire.starts_with(b"PUT /v1/items HTTP/1.0\r\n"));
    }

    #[test]
    fn parses_status_headers_and_body() {
        let r = parse_response(b"HTTP/1.0 200 OK\r\nX: 1\r\n\r\nhello", false).unwrap();
        assert_eq!(r.status(), 200);
        assert_eq!(r.headers(), b"HTTP/1.0 200 OK\r\nX: 1\r\n");
        assert_eq!(r.body(), b"hello");
        assert!(r.has_body());
    }

    #[test]
    fn splits_at_first_blank_line_only() {
        let r = parse_response(b"HTTP/1.1 201 Created\r\n\r\na\r\n\r\nb", false).unwrap();
        assert_eq!(r.status(), 201);
        assert_eq!(r.headers(), b"HTTP/1.1 201 Created\r\n");
        assert_eq!(r.body(), b"a\r\n\r\nb");
    }

    #[test]
    fn missing_delimiter_yields_absent_body() {
        let r = parse_response(b"HTTP/1.0 204 No Content\r\nX: 1", false).unwrap();
        assert_eq!(r.status(), 204);
        assert!(!r.has_body());
        assert!(r.body().is_empty());
        assert_eq!(r.headers(), b"HTTP/1.0 204 No Content\r\nX: 1");
    }

    #[test]
    fn status_without_reason_phrase() {
        let r = parse_response(b"HTTP/1.0 404\r\n\r\n", false).unwrap();
        assert_eq!(r.status(), 404);
        assert_eq!(r.body(), b"");
    }

    #[test]
    fn short_or_malformed_status_lines_fail() {
        let inputs: [&[u8]; 8] = [
            b"",
            b"HTTP",
            b"HTTP/1.0",
            b"HTTP/1.0 20",
            b"HTTP/1.0 2000 OK\r\n\r\n",
            b"HTTP/1.0 2x0 OK\r\n\r\n",
            b"SSH-2.0-OpenSSH\r\n\r\n",
            b"\r\n\r\nHTTP/1.0 200 OK",
        ];
        for input in inputs {
            let err = parse_response(input, false).unwrap_err();
            assert!(matches!(err, ExchangeError::Parse(_)), "{input:?}");
        }
    }

    #[test]
    fn read_accumulates_until_eof() {
        let data = b"HTTP/1.0 200 OK\r\n\r\n".repeat(500);
        let raw = read_response(&mut &data[..], 64 * 1024).unwrap();
        assert_eq!(raw.bytes, data);
        assert_eq!(raw.discarded, 0);
    }

    #[test]
    fn read_drops_bytes_beyond_capacity() {
        let data = vec![b'a'; 10_000];
        let raw = read_response(&mut &data[..], 1024).unwrap();
        assert_eq!(raw.bytes.len(), 1024);
        assert_eq!(raw.discarded, 10_000 - 1024);
    }

    struct Scripted(Vec<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() {
                return Ok(0);
            }
            match self.0.remove(0) {
                Ok(bytes) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Err(e) => Err(e),
            }
        }
    }

    #[test]
    fn read_treats_unexpected_eof_as_end_of_stream() {
        let mut reader = Scripted(vec![
            Ok(b"HTTP/1.0 200 OK\r\n\r\nok".to_vec()),
            Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
        ]);
        let raw = read_response(&mut reader, 1024).unwrap();
        assert_eq!(raw.bytes, b"HTTP/1.0 200 OK\r\n\r\nok");
    }

    #[test]
    fn read_retries_interrupted() {
        let mut reader = Scripted(vec![
            Err(io::Error::from(io::ErrorKind::Interrupted)),
            Ok(b"abc".to_vec()),
        ]);
        let raw = read_response(&mut reader, 1024).unwrap();
        assert_eq!(raw.bytes, b"abc");
    }

    #[test]
    fn read_surfaces_transport_errors() {
        let mut reader = Scripted(vec![
            Ok(b"HTTP/1.0".to_vec()),
            Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        ]);
        let err = read_response(&mut reader, 1024).unwrap_err();
        assert!(matches!(err, ExchangeError::Read(e) if e.kind() == io::ErrorKind::ConnectionReset));
    }
}
