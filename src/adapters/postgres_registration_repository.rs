//! Postgres implementation of RegistrationRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{PaymentStatus, PaymentUpdate, Registration};
use crate::ports::{RegistrationRepository, RepositoryError, RepositoryResult, UpdateOutcome};

const COLUMNS: &str = "id, competition_id, member_id, status, payment_status, order_id, \
     fee_amount, currency, provider_payment_id, paid_at, created_at, updated_at";

/// Postgres-backed registration repository.
#[derive(Clone)]
pub struct PostgresRegistrationRepository {
    pool: PgPool,
}

impl PostgresRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, registration: &Registration) -> RepositoryResult<Registration> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            INSERT INTO registrations (
                id, competition_id, member_id, status, payment_status, order_id,
                fee_amount, currency, provider_payment_id, paid_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&registration.id)
        .bind(&registration.competition_id)
        .bind(&registration.member_id)
        .bind(registration.status.as_str())
        .bind(registration.payment_status.as_str())
        .bind(&registration.order_id)
        .bind(&registration.fee_amount)
        .bind(&registration.currency)
        .bind(&registration.provider_payment_id)
        .bind(registration.paid_at)
        .bind(registration.created_at)
        .bind(registration.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }
}

#[async_trait]
impl RegistrationRepository for PostgresRegistrationRepository {
    async fn find_by_registration_id(&self, id: &str) -> RepositoryResult<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RegistrationRow::into_domain).transpose()
    }

    async fn update_registration_and_payment(
        &self,
        id: &str,
        expected: PaymentStatus,
        update: &PaymentUpdate,
    ) -> RepositoryResult<UpdateOutcome> {
        // single conditional write; a concurrent writer turns this into zero rows
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            UPDATE registrations
            SET payment_status = $1,
                status = COALESCE($2, status),
                provider_payment_id = COALESCE($3, provider_payment_id),
                paid_at = CASE WHEN $1 = 'paid' THEN NOW() ELSE paid_at END,
                updated_at = NOW()
            WHERE id = $4 AND payment_status = $5
            RETURNING {COLUMNS}
            "#
        ))
        .bind(update.payment_status.as_str())
        .bind(update.registration_status.map(|s| s.as_str()))
        .bind(&update.provider_payment_id)
        .bind(id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(UpdateOutcome::Applied(row.into_domain()?)),
            None => Ok(UpdateOutcome::Stale),
        }
    }

    async fn attach_order(&self, id: &str, order_id: &str) -> RepositoryResult<Registration> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            UPDATE registrations
            SET order_id = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::DuplicateOrder(order_id.to_string())
            }
            other => RepositoryError::from(other),
        })?;

        row.ok_or_else(|| RepositoryError::NotFound(id.to_string()))?
            .into_domain()
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct RegistrationRow {
    id: String,
    competition_id: String,
    member_id: String,
    status: String,
    payment_status: String,
    order_id: Option<String>,
    fee_amount: BigDecimal,
    currency: String,
    provider_payment_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RegistrationRow {
    fn into_domain(self) -> RepositoryResult<Registration> {
        let status = self
            .status
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("{}: {}", self.id, e)))?;
        let payment_status = self
            .payment_status
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("{}: {}", self.id, e)))?;

        Ok(Registration {
            id: self.id,
            competition_id: self.competition_id,
            member_id: self.member_id,
            status,
            payment_status,
            order_id: self.order_id,
            fee_amount: self.fee_amount,
            currency: self.currency,
            provider_payment_id: self.provider_payment_id,
            paid_at: self.paid_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
