use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::config::Secret;

/// Guards operator routes with the configured admin key, sent either bare or
/// as a bearer token. An empty key locks the routes entirely.
pub async fn admin_auth(
    State(admin_api_key): State<Secret>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if admin_api_key.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h));

    match presented {
        Some(key) if bool::from(key.as_bytes().ct_eq(admin_api_key.expose().as_bytes())) => {
            Ok(next.run(req).await)
        }
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
