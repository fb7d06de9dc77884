use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Upper bound for `/bytes/{n}`.
pub const MAX_GENERATED_BYTES: usize = 1024 * 1024;

/// What the server saw, sent back as JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    /// Fresh for every request served.
    pub id: Uuid,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Header names are lowercase; repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/status/{code}", any(status))
        .route("/bytes/{n}", get(bytes))
        .fallback(echo)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn echo(
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    tracing::debug!(%method, %uri, body_len = body.len(), "echo");
    Json(Echo {
        id: Uuid::new_v4(),
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        headers: flatten(&headers),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Reply with an arbitrary status code and an empty body.
async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

/// Reply with `n` bytes of `a-z` repeated, for exercising client buffer limits.
async fn bytes(Path(n): Path<usize>) -> Result<Vec<u8>, StatusCode> {
    if n > MAX_GENERATED_BYTES {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }
    Ok(generated(n))
}

pub fn generated(n: usize) -> Vec<u8> {
    (b'a'..=b'z').cycle().take(n).collect()
}

fn flatten(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}
