use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{PaymentStatus, PaymentUpdate, Registration};
use crate::ports::{RegistrationRepository, RepositoryError, RepositoryResult, UpdateOutcome};

/// A thread-safe in-memory registration store.
///
/// Not a system of record: state is lost on restart. Used by the test suite
/// and by `serve --in-memory` for local development against the provider sandbox.
#[derive(Default, Clone)]
pub struct InMemoryRegistrationRepository {
    registrations: Arc<RwLock<HashMap<String, Registration>>>,
}

impl InMemoryRegistrationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, registration: Registration) {
        let mut registrations = self.registrations.write().await;
        registrations.insert(registration.id.clone(), registration);
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryRegistrationRepository {
    async fn find_by_registration_id(&self, id: &str) -> RepositoryResult<Option<Registration>> {
        let registrations = self.registrations.read().await;
        Ok(registrations.get(id).cloned())
    }

    async fn update_registration_and_payment(
        &self,
        id: &str,
        expected: PaymentStatus,
        update: &PaymentUpdate,
    ) -> RepositoryResult<UpdateOutcome> {
        // compare and write under one write guard
        let mut registrations = self.registrations.write().await;
        let registration = registrations
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        if registration.payment_status != expected {
            return Ok(UpdateOutcome::Stale);
        }

        registration.apply(update, Utc::now());
        Ok(UpdateOutcome::Applied(registration.clone()))
    }

    async fn attach_order(&self, id: &str, order_id: &str) -> RepositoryResult<Registration> {
        let mut registrations = self.registrations.write().await;

        let taken = registrations
            .values()
            .any(|r| r.id != id && r.order_id.as_deref() == Some(order_id));
        if taken {
            return Err(RepositoryError::DuplicateOrder(order_id.to_string()));
        }

        let registration = registrations
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        registration.order_id = Some(order_id.to_string());
        registration.updated_at = Utc::now();
        Ok(registration.clone())
    }
}
