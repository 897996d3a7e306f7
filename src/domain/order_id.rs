//! Order identifiers exchanged with the payment provider.
//!
//! Wire form: `<namespace>_<competitionId>_<registrationId>_<timestamp>`.
//! Parsing is positional, so identifiers that themselves contain `_` cannot be
//! carried; [`OrderId::generate`] refuses them instead of producing an order id
//! that would parse back to different values.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub const DELIMITER: char = '_';
const MIN_SEGMENTS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderIdError {
    #[error("invalid order format: {0}")]
    InvalidOrderFormat(String),

    #[error("{field} must not be empty or contain '_'")]
    UnencodableIdentifier { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderId {
    pub namespace: String,
    pub competition_id: String,
    pub registration_id: String,
    pub timestamp: String,
}

impl OrderId {
    pub fn parse(raw: &str, namespace: &str) -> Result<Self, OrderIdError> {
        let segments: Vec<&str> = raw.split(DELIMITER).collect();

        if segments.len() < MIN_SEGMENTS {
            return Err(OrderIdError::InvalidOrderFormat(format!(
                "expected at least {} segments, got {}",
                MIN_SEGMENTS,
                segments.len()
            )));
        }

        if segments[0] != namespace {
            return Err(OrderIdError::InvalidOrderFormat(
                "namespace mismatch".to_string(),
            ));
        }

        if segments[1].is_empty() || segments[2].is_empty() {
            return Err(OrderIdError::InvalidOrderFormat(
                "empty competition or registration segment".to_string(),
            ));
        }

        Ok(Self {
            namespace: segments[0].to_string(),
            competition_id: segments[1].to_string(),
            registration_id: segments[2].to_string(),
            timestamp: segments[3].to_string(),
        })
    }

    pub fn generate(
        namespace: &str,
        competition_id: &str,
        registration_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Self, OrderIdError> {
        check_segment("namespace", namespace)?;
        check_segment("competition_id", competition_id)?;
        check_segment("registration_id", registration_id)?;

        Ok(Self {
            namespace: namespace.to_string(),
            competition_id: competition_id.to_string(),
            registration_id: registration_id.to_string(),
            timestamp: at.timestamp_millis().to_string(),
        })
    }
}

fn check_segment(field: &'static str, value: &str) -> Result<(), OrderIdError> {
    if value.is_empty() || value.contains(DELIMITER) {
        return Err(OrderIdError::UnencodableIdentifier { field });
    }
    Ok(())
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            self.namespace,
            self.competition_id,
            self.registration_id,
            self.timestamp,
            d = DELIMITER
        )
    }
}
