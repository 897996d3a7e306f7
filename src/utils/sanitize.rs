use serde_json::Value;

/// Masks sensitive fields in JSON payloads for logging
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

/// Same masking for `application/x-www-form-urlencoded` bodies, which is how
/// the provider posts callbacks.
pub fn sanitize_form(body: &[u8]) -> String {
    url::form_urlencoded::parse(body)
        .map(|(key, val)| {
            if is_sensitive_field(&key) {
                format!("{}={}", key, mask_str(&val))
            } else {
                format!("{}={}", key, val)
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "signature"
            | "data"
            | "private_key"
            | "password"
            | "secret"
            | "token"
            | "api_key"
            | "authorization"
    )
}

fn mask_str(s: &str) -> String {
    match (s.get(..4), s.len().checked_sub(4).and_then(|i| s.get(i..))) {
        (Some(start), Some(end)) if s.len() > 8 => format!("{}****{}", start, end),
        _ => "****".to_string(),
    }
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_str(s)),
        _ => Value::String("****".to_string()),
    }
}
