//! Reconcile payment use case.
//! Verifies a provider callback and moves the registration's payment state
//! forward, at most once per distinct status.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    OrderId, OrderIdError, PaymentStatus, PaymentUpdate, Registration, Transition,
};
use crate::liqpay::{codec, map_status, CallbackPayload, DecodeError, LiqPay, ProviderStatus};
use crate::ports::{Notifier, RegistrationRepository, RepositoryError, UpdateOutcome};

/// Conditional writes retried after losing a race to a concurrent callback.
const MAX_ATTEMPTS: usize = 3;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("callback signature is not authentic")]
    Authentication,

    #[error("malformed callback payload: {0}")]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    InvalidOrderFormat(#[from] OrderIdError),

    #[error("registration {0} not found")]
    RegistrationNotFound(String),

    #[error("failed to persist payment update: {0}")]
    Persistence(String),
}

impl From<RepositoryError> for ReconcileError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ReconcileError::RegistrationNotFound(id),
            other => ReconcileError::Persistence(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// The payment moved to a new status.
    Applied(Registration),
    /// The callback repeated the status already stored.
    Unchanged(Registration),
    /// The callback asked for a transition the payment state no longer allows,
    /// e.g. a late `processing` after `paid`.
    Ignored(Registration),
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied(_) => "applied",
            Self::Unchanged(_) => "unchanged",
            Self::Ignored(_) => "ignored",
        }
    }

    pub fn registration(&self) -> &Registration {
        match self {
            Self::Applied(r) | Self::Unchanged(r) | Self::Ignored(r) => r,
        }
    }
}

pub struct ReconcilePayment {
    liqpay: LiqPay,
    namespace: String,
    repository: Arc<dyn RegistrationRepository>,
    notifier: Arc<dyn Notifier>,
}

impl ReconcilePayment {
    pub fn new(
        liqpay: LiqPay,
        namespace: impl Into<String>,
        repository: Arc<dyn RegistrationRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            liqpay,
            namespace: namespace.into(),
            repository,
            notifier,
        }
    }

    pub async fn execute(
        &self,
        data: &str,
        signature: &str,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if !self.liqpay.verify(data, signature) {
            warn!("rejected payment callback with invalid signature");
            return Err(ReconcileError::Authentication);
        }

        let payload: CallbackPayload = codec::decode(data)?;
        let raw_order_id = payload.order_id.as_deref().ok_or_else(|| {
            OrderIdError::InvalidOrderFormat("missing order_id".to_string())
        })?;
        let order = OrderId::parse(raw_order_id, &self.namespace)?;

        let provider_status = ProviderStatus::parse(&payload.status);
        let target = map_status(&provider_status);
        let update = PaymentUpdate {
            payment_status: target.payment,
            registration_status: target.registration,
            provider_payment_id: payload.provider_reference(),
        };

        info!(
            order_id = %order,
            provider_status = %provider_status,
            target = %target.payment,
            "verified payment callback"
        );

        for attempt in 1..=MAX_ATTEMPTS {
            let current = self.load(&order).await?;

            match current.payment_status.transition_to(target.payment) {
                Transition::Unchanged => {
                    debug!(registration_id = %current.id, "duplicate callback, nothing to do");
                    return Ok(ReconcileOutcome::Unchanged(current));
                }
                Transition::Forbidden => {
                    info!(
                        registration_id = %current.id,
                        current = %current.payment_status,
                        requested = %target.payment,
                        "ignoring out-of-order payment callback"
                    );
                    return Ok(ReconcileOutcome::Ignored(current));
                }
                Transition::Apply => {}
            }

            match self
                .repository
                .update_registration_and_payment(&current.id, current.payment_status, &update)
                .await?
            {
                UpdateOutcome::Applied(registration) => {
                    info!(
                        registration_id = %registration.id,
                        from = %current.payment_status,
                        to = %registration.payment_status,
                        registration_status = %registration.status,
                        "payment status updated"
                    );
                    if registration.payment_status == PaymentStatus::Paid {
                        self.dispatch_confirmation(&registration.id);
                    }
                    return Ok(ReconcileOutcome::Applied(registration));
                }
                UpdateOutcome::Stale => {
                    debug!(registration_id = %current.id, attempt, "payment changed concurrently, re-reading");
                }
            }
        }

        Err(ReconcileError::Persistence(format!(
            "registration {} kept changing after {} attempts",
            order.registration_id, MAX_ATTEMPTS
        )))
    }

    async fn load(&self, order: &OrderId) -> Result<Registration, ReconcileError> {
        let registration = self
            .repository
            .find_by_registration_id(&order.registration_id)
            .await?
            .ok_or_else(|| {
                warn!(order_id = %order, "payment callback for unknown registration");
                ReconcileError::RegistrationNotFound(order.registration_id.clone())
            })?;

        if registration.competition_id != order.competition_id {
            warn!(
                order_id = %order,
                competition_id = %registration.competition_id,
                "payment callback competition does not match registration"
            );
            return Err(ReconcileError::RegistrationNotFound(
                order.registration_id.clone(),
            ));
        }

        Ok(registration)
    }

    fn dispatch_confirmation(&self, registration_id: &str) {
        let notifier = Arc::clone(&self.notifier);
        let registration_id = registration_id.to_string();

        tokio::spawn(async move {
            if let Err(e) = notifier.notify_payment_confirmed(&registration_id).await {
                warn!(registration_id = %registration_id, error = %e, "payment confirmation not delivered");
            }
        });
    }
}
