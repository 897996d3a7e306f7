//! LiqPay-style payment provider: signed, base64-encoded JSON messages.

pub mod checkout;
pub mod codec;
pub mod signature;
pub mod status;

use std::fmt;

pub use checkout::{CheckoutForm, CheckoutRequest};
pub use codec::{CallbackPayload, DecodeError, EncodeError};
pub use status::{map_status, ProviderStatus, StatusTransition};

use crate::config::Secret;

pub const DEFAULT_CHECKOUT_URL: &str = "https://www.liqpay.ua/api/3/checkout";

/// Merchant credentials plus the operations that need them.
#[derive(Clone)]
pub struct LiqPay {
    public_key: String,
    private_key: Secret,
    checkout_url: String,
}

impl LiqPay {
    pub fn new(public_key: impl Into<String>, private_key: Secret, checkout_url: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key,
            checkout_url: checkout_url.into(),
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn checkout_url(&self) -> &str {
        &self.checkout_url
    }

    pub fn sign(&self, data: &str) -> String {
        signature::sign(self.private_key.expose(), data)
    }

    pub fn verify(&self, data: &str, signature: &str) -> bool {
        signature::verify(self.private_key.expose(), data, signature)
    }

    /// Encodes and signs a checkout request.
    pub fn checkout_form(&self, request: &CheckoutRequest) -> Result<CheckoutForm, EncodeError> {
        let data = codec::encode(request)?;
        let signature = self.sign(&data);

        Ok(CheckoutForm {
            checkout_url: self.checkout_url.clone(),
            data,
            signature,
            order_id: request.order_id.clone(),
        })
    }
}

impl fmt::Debug for LiqPay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiqPay")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .field("checkout_url", &self.checkout_url)
            .finish()
    }
}
