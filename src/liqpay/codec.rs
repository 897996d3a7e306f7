//! Transport encoding for provider payloads: JSON wrapped in standard base64.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not a well-formed record: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
#[error("failed to serialize payload: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

pub fn encode<T: Serialize>(record: &T) -> Result<String, EncodeError> {
    let json = serde_json::to_string(record)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

pub fn decode<T: DeserializeOwned>(data: &str) -> Result<T, DecodeError> {
    let bytes = STANDARD.decode(data.trim())?;
    let json = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&json)?)
}

/// Decoded body of a provider callback.
///
/// Only `status` is required. Fields this service does not interpret are kept
/// in `extra` so a decoded payload encodes back to the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liqpay_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_date: Option<i64>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallbackPayload {
    pub fn new(status: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            order_id: Some(order_id.into()),
            action: None,
            amount: None,
            currency: None,
            payment_id: None,
            transaction_id: None,
            liqpay_order_id: None,
            public_key: None,
            version: None,
            description: None,
            create_date: None,
            end_date: None,
            err_code: None,
            err_description: None,
            extra: Map::new(),
        }
    }

    /// Provider-side identifier to store alongside the payment, if any.
    pub fn provider_reference(&self) -> Option<String> {
        self.payment_id
            .map(|id| id.to_string())
            .or_else(|| self.liqpay_order_id.clone())
    }
}
