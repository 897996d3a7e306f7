//! Ports: the interfaces the use cases depend on. Adapters live in `crate::adapters`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{PaymentStatus, PaymentUpdate, Registration};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("registration {0} not found")]
    NotFound(String),

    #[error("order id {0} is already attached to another registration")]
    DuplicateOrder(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt registration row: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Outcome of a conditional payment update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The row still had the expected payment status and was updated.
    Applied(Registration),
    /// Another writer changed the payment status first; nothing was written.
    Stale,
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn find_by_registration_id(&self, id: &str) -> RepositoryResult<Option<Registration>>;

    /// Writes `update` only if the stored payment status still equals `expected`.
    async fn update_registration_and_payment(
        &self,
        id: &str,
        expected: PaymentStatus,
        update: &PaymentUpdate,
    ) -> RepositoryResult<UpdateOutcome>;

    /// Records the order id of a freshly created checkout.
    async fn attach_order(&self, id: &str, order_id: &str) -> RepositoryResult<Registration>;
}

#[derive(Error, Debug)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_payment_confirmed(&self, registration_id: &str) -> Result<(), NotifyError>;
}
