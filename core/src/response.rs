//! Parsed result of a completed exchange.
//!
//! The record keeps the bytes as received. Header lookup is a convenience over
//! the raw block, not a full header map: the first matching line wins.

/// Status, raw header block and raw body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub(crate) status: u16,
    pub(crate) headers: Vec<u8>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) truncated: bool,
}

impl ResponseRecord {
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status line and header lines, each still terminated by `\r\n`.
    pub fn headers(&self) -> &[u8] {
        &self.headers
    }

    pub fn headers_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.headers)
    }

    /// Body bytes; empty when the response carried no blank-line delimiter.
    pub fn body(&self) -> &[u8] {
        self.body.as_deref().unwrap_or(&[])
    }

    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.body())
    }

    /// Whether a blank line separated headers from a body segment.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// The peer sent more bytes than the response buffer holds; the tail was
    /// dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Value of the first header line whose name matches `name`, ignoring
    /// ASCII case. The status line is never matched.
    pub fn header(&self, name: &str) -> Option<&str> {
        let text = std::str::from_utf8(&self.headers).ok()?;
        text.split("\r\n").skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }

    /// Move out `(status, headers, body)`.
    pub fn into_parts(self) -> (u16, Vec<u8>, Option<Vec<u8>>) {
        (self.status, self.headers, self.body)
    }
}
