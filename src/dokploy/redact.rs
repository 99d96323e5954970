//! Redaction of credential-shaped fields before telemetry is emitted.

use serde_json::Value;

/// Replacement written in place of redacted values.
pub const REDACTED: &str = "***";

/// Key fragments that mark a field as sensitive (matched case-insensitively).
const SENSITIVE_FRAGMENTS: &[&str] = &["password", "token", "key", "secret"];

/// Returns true if a JSON object key names a credential-shaped field.
#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_FRAGMENTS.iter().any(|fragment| key.contains(fragment))
}

/// Returns a copy of `value` with every sensitive field replaced, at any depth.
#[must_use]
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_sensitive_key(k) {
                        Value::String(String::from(REDACTED))
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}
