//! Redaction of sensitive argument values before logging.

use serde_json::Value;

use crate::schema::Arguments;

/// Marker substituted for sensitive values.
pub const REDACTION_MARKER: &str = "***REDACTED***";

/// Lowercase tokens marking an argument key as sensitive.
const SENSITIVE_TOKENS: [&str; 9] = [
    "api_key",
    "password",
    "pwd",
    "token",
    "secret",
    "authorization",
    "auth",
    "credential",
    "private_key",
];

/// Returns a deep copy of `args` with every sensitive value replaced by
/// [`REDACTION_MARKER`].
///
/// A key is sensitive when its lowercase form contains one of the fixed
/// tokens, at any nesting depth within object values. Array elements and
/// scalars are not inspected. The input is never mutated: the registry logs
/// the redacted copy while the handler receives the original map.
#[must_use]
pub fn redact_arguments(args: &Arguments) -> Arguments {
    args.iter()
        .map(|(key, value)| {
            let redacted = if is_sensitive(key) {
                Value::String(REDACTION_MARKER.to_owned())
            } else if let Value::Object(nested) = value {
                Value::Object(redact_arguments(nested))
            } else {
                value.clone()
            };
            (key.clone(), redacted)
        })
        .collect()
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_TOKENS.iter().any(|token| key.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn redacts_sensitive_keys_case_insensitively() {
        let input = args(json!({
            "query": "aspirin",
            "API_KEY": "sk-123",
            "Password": "hunter2",
        }));
        let redacted = redact_arguments(&input);
        assert_eq!(redacted["query"], json!("aspirin"));
        assert_eq!(redacted["API_KEY"], json!(REDACTION_MARKER));
        assert_eq!(redacted["Password"], json!(REDACTION_MARKER));
    }

    #[test]
    fn redacts_compound_key_names() {
        let input = args(json!({ "openai_api_key": "sk-123", "auth_header": "Bearer x" }));
        let redacted = redact_arguments(&input);
        assert_eq!(redacted["openai_api_key"], json!(REDACTION_MARKER));
        assert_eq!(redacted["auth_header"], json!(REDACTION_MARKER));
    }

    #[test]
    fn recurses_through_nested_objects() {
        let input = args(json!({
            "config": { "connection": { "token": "abc", "host": "db" } }
        }));
        let redacted = redact_arguments(&input);
        assert_eq!(
            redacted["config"]["connection"]["token"],
            json!(REDACTION_MARKER)
        );
        assert_eq!(redacted["config"]["connection"]["host"], json!("db"));
    }

    #[test]
    fn does_not_inspect_array_elements() {
        let input = args(json!({ "items": [{ "token": "abc" }] }));
        let redacted = redact_arguments(&input);
        assert_eq!(redacted["items"][0]["token"], json!("abc"));
    }

    #[test]
    fn never_mutates_the_input() {
        let input = args(json!({ "password": "hunter2", "nested": { "secret": "s" } }));
        let snapshot = input.clone();
        let _ = redact_arguments(&input);
        assert_eq!(input, snapshot);
    }
}
