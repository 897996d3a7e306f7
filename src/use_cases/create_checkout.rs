//! Create checkout use case.
//! Issues a fresh order id for a registration and returns the signed form
//! the browser submits to the provider.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::domain::{OrderId, OrderIdError, RegistrationStatus};
use crate::liqpay::{CheckoutForm, CheckoutRequest, EncodeError, LiqPay};
use crate::ports::{RegistrationRepository, RepositoryError};

const CHECKOUT_LANGUAGE: &str = "uk";

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("registration {0} not found")]
    RegistrationNotFound(String),

    #[error("registration {id} cannot be paid: {reason}")]
    NotPayable { id: String, reason: String },

    #[error("{0}")]
    InvalidIdentifier(#[from] OrderIdError),

    #[error("{0}")]
    Encode(#[from] EncodeError),

    #[error("failed to store order: {0}")]
    Persistence(String),
}

impl From<RepositoryError> for CheckoutError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => CheckoutError::RegistrationNotFound(id),
            other => CheckoutError::Persistence(other.to_string()),
        }
    }
}

pub struct CreateCheckout {
    liqpay: LiqPay,
    namespace: String,
    repository: Arc<dyn RegistrationRepository>,
    server_url: Option<String>,
    result_url: Option<String>,
}

impl CreateCheckout {
    pub fn new(
        liqpay: LiqPay,
        namespace: impl Into<String>,
        repository: Arc<dyn RegistrationRepository>,
    ) -> Self {
        Self {
            liqpay,
            namespace: namespace.into(),
            repository,
            server_url: None,
            result_url: None,
        }
    }

    pub fn with_urls(mut self, server_url: Option<String>, result_url: Option<String>) -> Self {
        self.server_url = server_url;
        self.result_url = result_url;
        self
    }

    pub async fn execute(&self, registration_id: &str) -> Result<CheckoutForm, CheckoutError> {
        let registration = self
            .repository
            .find_by_registration_id(registration_id)
            .await?
            .ok_or_else(|| CheckoutError::RegistrationNotFound(registration_id.to_string()))?;

        if registration.payment_status.is_settled() {
            return Err(CheckoutError::NotPayable {
                id: registration.id,
                reason: format!("payment is already {}", registration.payment_status),
            });
        }
        if registration.status == RegistrationStatus::Cancelled {
            return Err(CheckoutError::NotPayable {
                id: registration.id,
                reason: "registration is cancelled".to_string(),
            });
        }

        let order = OrderId::generate(
            &self.namespace,
            &registration.competition_id,
            &registration.id,
            Utc::now(),
        )?;
        let order_id = order.to_string();

        let mut request = CheckoutRequest::pay(
            self.liqpay.public_key(),
            order_id.clone(),
            registration.fee_amount.clone(),
            registration.currency.clone(),
            format!(
                "Competition {} registration {}",
                registration.competition_id, registration.id
            ),
        );
        request.server_url = self.server_url.clone();
        request.result_url = self.result_url.clone();
        request.language = Some(CHECKOUT_LANGUAGE.to_string());

        let form = self.liqpay.checkout_form(&request)?;
        self.repository.attach_order(&registration.id, &order_id).await?;

        tracing::info!(registration_id = %registration.id, order_id = %order_id, "checkout created");
        Ok(form)
    }
}
