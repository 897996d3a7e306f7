pub mod payments;
pub mod registrations;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::health::check_health;
use crate::AppState;

/// Dependency report; 503 once a critical dependency is down.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = check_health(&state.dependencies, state.start_time).await;

    let status_code = if report.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(report))
}
