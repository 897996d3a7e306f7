use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use uuid::Uuid;

use crate::utils::sanitize::{sanitize_form, sanitize_json};
use crate::validation::CALLBACK_DATA_MAX_LEN;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Bodies are only buffered when body logging is on. The cap is measured on
/// the form-encoded wire body, where each byte of the largest accepted `data`
/// field can take up to three characters.
const MAX_BODY_LOG_SIZE: usize = 3 * CALLBACK_DATA_MAX_LEN + 1024;

/// Tags every request with an id, logs it with latency, and optionally logs a
/// masked copy of the body. State is the `LOG_REQUEST_BODY` switch.
pub async fn request_logger_middleware(
    State(log_body): State<bool>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let header_value = HeaderValue::from_str(&request_id).ok();

    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    if let Some(value) = &header_value {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    if log_body {
        let (parts, body) = req.into_parts();
        let bytes = match axum::body::to_bytes(body, MAX_BODY_LOG_SIZE).await {
            Ok(bytes) => bytes,
            Err(_) => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    uri = %uri,
                    "Request body too large or failed to read"
                );
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
        };

        let is_form = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let sanitized_body = if is_form {
            sanitize_form(&bytes)
        } else if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            serde_json::to_string(&sanitize_json(&json)).unwrap_or_else(|_| "[invalid json]".to_string())
        } else {
            format!("[opaque, {} bytes]", bytes.len())
        };

        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            body_size = bytes.len(),
            body = %sanitized_body,
            "Incoming request"
        );

        req = Request::from_parts(parts, Body::from(bytes));
    } else {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            "Incoming request"
        );
    }

    let response = next.run(req).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        latency_ms = start.elapsed().as_millis(),
        "Outgoing response"
    );

    let (mut parts, body) = response.into_parts();
    if let Some(value) = header_value {
        parts.headers.insert(REQUEST_ID_HEADER, value);
    }

    Response::from_parts(parts, body)
}
