//! Registration and payment domain entities.
//! Framework-agnostic; the storage adapters map these to rows.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownStatus {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Result of checking a requested payment status change against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply,
    Unchanged,
    Forbidden,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Payment statuses only move forward: `pending -> paid | failed`,
    /// `failed -> paid` (retried payment) and `paid -> refunded`.
    /// Nothing leaves `refunded` and nothing returns to `pending`.
    pub fn transition_to(self, next: PaymentStatus) -> Transition {
        use PaymentStatus::*;

        if self == next {
            return Transition::Unchanged;
        }

        match (self, next) {
            (Pending, Paid) | (Pending, Failed) | (Failed, Paid) | (Paid, Refunded) => {
                Transition::Apply
            }
            _ => Transition::Forbidden,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Refunded)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownStatus {
                kind: "payment status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Waitlist,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Waitlist => "waitlist",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "waitlist" => Ok(Self::Waitlist),
            other => Err(UnknownStatus {
                kind: "registration status",
                value: other.to_string(),
            }),
        }
    }
}

/// A competition registration together with the payment collected for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub id: String,
    pub competition_id: String,
    pub member_id: String,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub order_id: Option<String>,
    pub fee_amount: BigDecimal,
    pub currency: String,
    pub provider_payment_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(
        id: impl Into<String>,
        competition_id: impl Into<String>,
        member_id: impl Into<String>,
        fee_amount: BigDecimal,
        currency: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            competition_id: competition_id.into(),
            member_id: member_id.into(),
            status: RegistrationStatus::Pending,
            payment_status: PaymentStatus::Pending,
            order_id: None,
            fee_amount,
            currency: currency.into(),
            provider_payment_id: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a payment update in place. Storage adapters call this so the
    /// in-memory and SQL paths agree on which columns change.
    pub fn apply(&mut self, update: &PaymentUpdate, now: DateTime<Utc>) {
        self.payment_status = update.payment_status;
        if let Some(status) = update.registration_status {
            self.status = status;
        }
        if update.provider_payment_id.is_some() {
            self.provider_payment_id = update.provider_payment_id.clone();
        }
        if update.payment_status == PaymentStatus::Paid {
            self.paid_at = Some(now);
        }
        self.updated_at = now;
    }
}

/// Columns written by a reconciled callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
    pub registration_status: Option<RegistrationStatus>,
    pub provider_payment_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use PaymentStatus::*;

    #[test]
    fn test_forward_transitions_apply() {
        assert_eq!(Pending.transition_to(Paid), Transition::Apply);
        assert_eq!(Pending.transition_to(Failed), Transition::Apply);
        assert_eq!(Paid.transition_to(Refunded), Transition::Apply);
        assert_eq!(Failed.transition_to(Paid), Transition::Apply);
    }

    #[test]
    fn test_same_status_is_unchanged() {
        for status in [Pending, Paid, Failed, Refunded] {
            assert_eq!(status.transition_to(status), Transition::Unchanged);
        }
    }

    #[test]
    fn test_nothing_returns_to_pending_or_leaves_refunded() {
        assert_eq!(Paid.transition_to(Pending), Transition::Forbidden);
        assert_eq!(Failed.transition_to(Pending), Transition::Forbidden);
        assert_eq!(Refunded.transition_to(Pending), Transition::Forbidden);
        assert_eq!(Refunded.transition_to(Paid), Transition::Forbidden);
        assert_eq!(Refunded.transition_to(Failed), Transition::Forbidden);
        assert_eq!(Paid.transition_to(Failed), Transition::Forbidden);
        assert_eq!(Pending.transition_to(Refunded), Transition::Forbidden);
    }

    #[test]
    fn test_status_strings_round_trip() {
        for status in [Pending, Paid, Failed, Refunded] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("settled".parse::<PaymentStatus>().is_err());
        assert_eq!(
            "waitlist".parse::<RegistrationStatus>().unwrap(),
            RegistrationStatus::Waitlist
        );
    }

    #[test]
    fn test_apply_paid_update() {
        let mut registration =
            Registration::new("reg456", "comp123", "member-1", BigDecimal::from(350), "UAH");
        let now = Utc::now();

        registration.apply(
            &PaymentUpdate {
                payment_status: Paid,
                registration_status: Some(RegistrationStatus::Confirmed),
                provider_payment_id: Some("165629".to_string()),
            },
            now,
        );

        assert_eq!(registration.payment_status, Paid);
        assert_eq!(registration.status, RegistrationStatus::Confirmed);
        assert_eq!(registration.provider_payment_id.as_deref(), Some("165629"));
        assert_eq!(registration.paid_at, Some(now));
    }

    #[test]
    fn test_apply_failed_update_keeps_registration_status() {
        let mut registration =
            Registration::new("reg1", "comp1", "member-1", BigDecimal::from(100), "UAH");
        registration.status = RegistrationStatus::Waitlist;

        registration.apply(
            &PaymentUpdate {
                payment_status: Failed,
                registration_status: None,
                provider_payment_id: None,
            },
            Utc::now(),
        );

        assert_eq!(registration.payment_status, Failed);
        assert_eq!(registration.status, RegistrationStatus::Waitlist);
        assert!(registration.paid_at.is_none());
    }
}
