use std::fmt;
use std::str::FromStr;

use crate::domain::{PaymentStatus, RegistrationStatus};

/// Status vocabulary reported by the provider.
///
/// Parsing never fails: codes this service does not know yet end up in
/// [`ProviderStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Success,
    Failure,
    Error,
    Reversed,
    Subscribed,
    Unsubscribed,
    Processing,
    WaitSecure,
    WaitAccept,
    WaitLiqpay,
    HoldWait,
    InvoiceWait,
    Unknown(String),
}

impl ProviderStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "success" => Self::Success,
            "failure" => Self::Failure,
            "error" => Self::Error,
            "reversed" => Self::Reversed,
            "subscribed" => Self::Subscribed,
            "unsubscribed" => Self::Unsubscribed,
            "processing" => Self::Processing,
            "wait_secure" => Self::WaitSecure,
            "wait_accept" => Self::WaitAccept,
            "wait_liqpay" => Self::WaitLiqpay,
            "hold_wait" => Self::HoldWait,
            "invoice_wait" => Self::InvoiceWait,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
            Self::Reversed => "reversed",
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Processing => "processing",
            Self::WaitSecure => "wait_secure",
            Self::WaitAccept => "wait_accept",
            Self::WaitLiqpay => "wait_liqpay",
            Self::HoldWait => "hold_wait",
            Self::InvoiceWait => "invoice_wait",
            Self::Unknown(raw) => raw,
        }
    }
}

impl FromStr for ProviderStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target state requested by a callback. `registration` is `None` when the
/// registration status must be left as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub payment: PaymentStatus,
    pub registration: Option<RegistrationStatus>,
}

pub fn map_status(status: &ProviderStatus) -> StatusTransition {
    match status {
        ProviderStatus::Success => StatusTransition {
            payment: PaymentStatus::Paid,
            registration: Some(RegistrationStatus::Confirmed),
        },
        // failed payments keep the registration so the athlete can retry
        ProviderStatus::Failure | ProviderStatus::Error => StatusTransition {
            payment: PaymentStatus::Failed,
            registration: None,
        },
        ProviderStatus::Reversed => StatusTransition {
            payment: PaymentStatus::Refunded,
            registration: Some(RegistrationStatus::Cancelled),
        },
        _ => StatusTransition {
            payment: PaymentStatus::Pending,
            registration: None,
        },
    }
}
