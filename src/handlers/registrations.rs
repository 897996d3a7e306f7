use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::AppState;

/// Operator view of a registration's payment state.
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let registration = state
        .repository
        .find_by_registration_id(&id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, registration_id = %id, "registration lookup failed");
            AppError::Internal("payment storage unavailable".to_string())
        })?
        .ok_or_else(|| AppError::NotFound(format!("Registration {} not found", id)))?;

    Ok(Json(registration))
}
