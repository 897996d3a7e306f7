use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    response::IntoResponse,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validation::{sanitize_string, validate_callback_form, validate_registration_id};
use crate::AppState;

/// Body the provider posts to `server_url`.
#[derive(Debug, Deserialize)]
pub struct CallbackForm {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackAck {
    pub outcome: String,
    pub registration_id: String,
    pub payment_status: String,
    pub registration_status: String,
}

pub async fn callback(
    State(state): State<AppState>,
    form: Result<Form<CallbackForm>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;
    validate_callback_form(&form.data, &form.signature)?;

    let outcome = state.reconcile.execute(&form.data, &form.signature).await?;
    let registration = outcome.registration();

    Ok(Json(CallbackAck {
        outcome: outcome.as_str().to_string(),
        registration_id: registration.id.clone(),
        payment_status: registration.payment_status.to_string(),
        registration_status: registration.status.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutBody {
    pub registration_id: String,
}

pub async fn create_checkout(
    State(state): State<AppState>,
    body: Result<Json<CheckoutBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    validate_registration_id(&body.registration_id)?;

    let form = state
        .checkout
        .execute(&sanitize_string(&body.registration_id))
        .await?;

    Ok(Json(form))
}
