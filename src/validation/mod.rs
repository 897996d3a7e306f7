use std::fmt;

/// Provider payloads are a few KB; anything larger is not a real callback.
pub const CALLBACK_DATA_MAX_LEN: usize = 64 * 1024;
/// base64 of a 20 byte SHA-1 digest is 28 characters; leave room for padding variants.
pub const SIGNATURE_MAX_LEN: usize = 64;
pub const REGISTRATION_ID_MAX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Shape check of the callback form before any cryptography runs.
pub fn validate_callback_form(data: &str, signature: &str) -> ValidationResult {
    validate_required("data", data)?;
    validate_max_len("data", data, CALLBACK_DATA_MAX_LEN)?;
    validate_required("signature", signature)?;
    validate_max_len("signature", signature, SIGNATURE_MAX_LEN)?;
    Ok(())
}

/// Registration ids travel inside order ids, so they must be a single
/// underscore-free token.
pub fn validate_registration_id(id: &str) -> ValidationResult {
    let id = sanitize_string(id);
    validate_required("registration_id", &id)?;
    validate_max_len("registration_id", &id, REGISTRATION_ID_MAX_LEN)?;

    if !id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
    {
        return Err(ValidationError::new(
            "registration_id",
            "must contain only letters, digits and '-'",
        ));
    }

    Ok(())
}
