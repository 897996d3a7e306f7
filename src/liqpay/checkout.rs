use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

pub const API_VERSION: u32 = 3;

/// Parameters of a checkout session, sent to the provider as the `data` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub version: u32,
    pub public_key: String,
    pub action: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub description: String,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CheckoutRequest {
    pub fn pay(
        public_key: impl Into<String>,
        order_id: impl Into<String>,
        amount: BigDecimal,
        currency: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            version: API_VERSION,
            public_key: public_key.into(),
            action: "pay".to_string(),
            amount,
            currency: currency.into(),
            description: description.into(),
            order_id: order_id.into(),
            server_url: None,
            result_url: None,
            language: None,
        }
    }
}

/// Signed form the browser posts to the provider's checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub checkout_url: String,
    pub data: String,
    pub signature: String,
    pub order_id: String,
}
