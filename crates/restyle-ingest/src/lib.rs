#![warn(missing_docs)]
//! # restyle-ingest
//!
//! ## Purpose
//! Exposes the system's own minimal inbound HTTP surface: one demonstrative
//! photo-upload endpoint.
//!
//! ## Responsibilities
//! - Accept `POST /api/upload` with multipart field `photo`.
//! - Report a structured receipt (`ok`, `filename`, `size`) on success.
//! - Reject requests without a file part with a structured 400 body.
//!
//! ## Data flow
//! Multipart request -> field scan for `photo` -> bytes are read, measured
//! and discarded -> JSON receipt. Persisting the bytes is intentionally out
//! of scope; the receipt's size is the only observation made.
//!
//! ## Ownership and lifetimes
//! Handlers are stateless; the router owns nothing beyond its routes.
//!
//! ## Error model
//! Malformed or field-less uploads answer `400` with
//! `{ "ok": false, "error": ... }`; there is no other failure surface.
//!
//! ## Security and privacy notes
//! Uploaded bytes are never written to disk or logged; only the advertised
//! filename and byte count appear in the receipt.

use std::net::SocketAddr;

use axum::Json;
use axum::Router;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::{Deserialize, Serialize};

/// Multipart field name carrying the uploaded photo.
pub const UPLOAD_FIELD: &str = "photo";

/// Successful upload acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Always `true` for a receipt.
    pub ok: bool,
    /// Filename advertised by the client, or the field name when absent.
    pub filename: String,
    /// Number of bytes received in the photo part.
    pub size: usize,
}

/// Structured upload rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRejection {
    /// Always `false` for a rejection.
    pub ok: bool,
    /// Human-readable rejection reason.
    pub error: String,
}

/// Builds the upload router.
///
/// Kept separate from [`serve`] so tests can drive the router in-process.
pub fn router() -> Router {
    Router::new().route("/api/upload", post(upload_photo))
}

/// Binds the listener and serves the upload router until shutdown.
///
/// # Errors
/// Returns the underlying I/O error when binding or serving fails.
pub async fn serve(addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("upload endpoint listening on {addr}");
    axum::serve(listener, router()).await
}

async fn upload_photo(mut multipart: Multipart) -> Response {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(UPLOAD_FIELD) {
                    continue;
                }

                let filename = field
                    .file_name()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UPLOAD_FIELD)
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        log::info!("received upload '{filename}' ({} bytes)", bytes.len());
                        return Json(UploadReceipt {
                            ok: true,
                            filename,
                            size: bytes.len(),
                        })
                        .into_response();
                    }
                    Err(error) => {
                        return rejection(format!("failed to read uploaded file: {error}"));
                    }
                }
            }
            Ok(None) => {
                return rejection(format!("missing multipart field '{UPLOAD_FIELD}'"));
            }
            Err(error) => {
                return rejection(format!("malformed multipart body: {error}"));
            }
        }
    }
}

fn rejection(error: String) -> Response {
    log::warn!("upload rejected: {error}");
    (
        StatusCode::BAD_REQUEST,
        Json(UploadRejection { ok: false, error }),
    )
        .into_response()
}
