use axum::extract::ConnectInfo;
use axum::http::Uri;
use axum::Json;
use serde_json::json;
use std::net::SocketAddr;

use crate::app::ApiError;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Unknown routes; logged since they are usually scanners or typos.
pub async fn handler_404(uri: Uri, addr: Option<ConnectInfo<SocketAddr>>) -> ApiError {
    let ip = addr
        .map(|ConnectInfo(a)| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::warn!(path = %uri.path(), %ip, "request for unknown route");
    ApiError::not_found()
}
