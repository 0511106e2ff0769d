use std::{num::ParseIntError, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Largest body `/bytes/{n}` will generate.
pub const MAX_GENERATED_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub id: Uuid,
    pub size: usize,
}

pub type Uploads = Arc<RwLock<Vec<UploadReceipt>>>;

/// Listen address, read from `HOST` and `PORT`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ParseIntError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ParseIntError> {
        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match var("PORT") {
            Some(port) => port.parse()?,
            None => 3000,
        };
        Ok(Self { host, port })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Body served by `/bytes/{n}`: byte `i` is `i % 251`.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn app() -> Router {
    let uploads: Uploads = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/bytes/{n}", get(generate_bytes))
        .route("/headers", get(repeated_headers))
        .route("/status/{code}", get(fixed_status))
        .route("/upload", post(upload))
        .route("/uploads", get(list_uploads))
        .with_state(uploads)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("mock server listening on {addr}");
    }
    axum::serve(listener, app()).await
}

async fn generate_bytes(Path(n): Path<usize>) -> Result<impl IntoResponse, StatusCode> {
    if n > MAX_GENERATED_BYTES {
        log::debug!("refusing to generate {n} bytes");
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        pattern(n),
    ))
}

async fn repeated_headers() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.append("x-trace", HeaderValue::from_static("first"));
    headers.append("x-trace", HeaderValue::from_static("second"));
    (headers, "repeated headers")
}

async fn fixed_status(Path(code): Path<u16>) -> Result<impl IntoResponse, StatusCode> {
    // informational codes cannot end an exchange
    if code < 200 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let reason = status.canonical_reason().unwrap_or("").to_string();
    Ok((status, reason))
}

async fn upload(State(uploads): State<Uploads>, body: Bytes) -> (StatusCode, Json<UploadReceipt>) {
    let receipt = UploadReceipt {
        id: Uuid::new_v4(),
        size: body.len(),
    };
    log::info!("upload {} received {} bytes", receipt.id, receipt.size);
    uploads.write().await.push(receipt.clone());
    (StatusCode::CREATED, Json(receipt))
}

async fn list_uploads(State(uploads): State<Uploads>) -> Json<Vec<UploadReceipt>> {
    Json(uploads.read().await.clone())
}
