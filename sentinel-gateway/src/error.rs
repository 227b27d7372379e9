//! Maps [`SentinelError`] onto an HTTP response, the same shape every
//! Sentinel collaborator's `to_json()` already produces, plus an optional
//! `trace` field carrying the current tracing span id so a client can hand
//! it back to support.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sentinel_core::error::SentinelError;
use tracing::Span;

#[derive(Debug)]
pub struct GatewayError(pub SentinelError);

impl From<SentinelError> for GatewayError {
    fn from(e: SentinelError) -> Self {
        Self(e)
    }
}

impl From<anyhow::Error> for GatewayError {
    fn from(e: anyhow::Error) -> Self {
        Self(SentinelError::normalize(e))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = self.0.to_json();
        if let Some(map) = body.as_object_mut() {
            let span = Span::current();
            if !span.is_disabled() {
                map.insert("trace".to_string(), serde_json::json!(format!("{:?}", span.id())));
            }
        }
        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
