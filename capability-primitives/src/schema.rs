//! Parameter schemas: structural validation and normalization of argument maps.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

/// Keyword-argument map passed to capability handlers.
pub type Arguments = Map<String, Value>;

/// JSON value categories a parameter can be constrained to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// A JSON string.
    Text,
    /// A JSON integer (no fractional part).
    Integer,
    /// Any JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// Any JSON value. Used as the unconstrained fallback when a parameter's
    /// type cannot be mapped, so wrapping a function never fails on it.
    Any,
}

impl ParamType {
    /// Returns whether `value` satisfies this type constraint.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }

    /// Name used in validation messages and JSON-Schema `type` keywords.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_f64() {
                "number"
            } else {
                "integer"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One named parameter of a capability schema.
///
/// A field is either required (no default) or optional, in which case it may
/// carry a default applied during normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamField {
    name: String,
    kind: ParamType,
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
}

impl ParamField {
    /// Creates a required field.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
        }
    }

    /// Creates an optional field whose default is filled in when the caller
    /// omits the argument.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ParamType, default: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: Some(default),
        }
    }

    /// Creates an optional field without a default; an omitted argument stays
    /// absent after normalization.
    #[must_use]
    pub fn optional_without_default(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type constraint.
    #[must_use]
    pub fn kind(&self) -> ParamType {
        self.kind
    }

    /// Returns whether the field is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the default value, if the field carries one.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Structural record type describing the keyword arguments of one capability.
///
/// An empty schema is valid; handlers may take no arguments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    fields: Vec<ParamField>,
}

impl ParamSchema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> ParamSchemaBuilder {
        ParamSchemaBuilder { fields: Vec::new() }
    }

    /// Schema with no parameters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    /// Returns the field named `name`, if declared.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ParamField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks `args` against the schema, collecting every violation rather
    /// than stopping at the first.
    ///
    /// `Null` satisfies an optional field but not a required one (unless the
    /// field type is [`ParamType::Any`]). Keys the schema does not declare are
    /// not a violation; normalization drops them.
    ///
    /// # Errors
    ///
    /// Returns the list of human-readable violations.
    pub fn validate(&self, args: &Arguments) -> std::result::Result<(), Vec<String>> {
        let mut violations = Vec::new();
        for field in &self.fields {
            match args.get(&field.name) {
                None => {
                    if field.required {
                        violations.push(format!("missing required field `{}`", field.name));
                    }
                }
                Some(Value::Null) if !field.required => {}
                Some(value) => {
                    if !field.kind.accepts(value) {
                        violations.push(format!(
                            "field `{}` expected {}, got {}",
                            field.name,
                            field.kind.name(),
                            value_kind(value)
                        ));
                    }
                }
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Produces the argument map the handler actually receives: declared keys
    /// are kept, absent optional fields with defaults are filled in, and
    /// undeclared keys are dropped.
    #[must_use]
    pub fn normalize(&self, mut args: Arguments) -> Arguments {
        let mut normalized = Arguments::new();
        for field in &self.fields {
            if let Some(value) = args.remove(&field.name) {
                normalized.insert(field.name.clone(), value);
            } else if let Some(default) = &field.default {
                normalized.insert(field.name.clone(), default.clone());
            }
        }
        normalized
    }

    /// Renders the schema as a JSON-Schema object, suitable for advertising
    /// the capability to LLM function-calling APIs.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut fragment = Map::new();
            if field.kind != ParamType::Any {
                fragment.insert("type".to_owned(), json!(field.kind.name()));
            }
            if let Some(default) = &field.default {
                fragment.insert("default".to_owned(), default.clone());
            }
            properties.insert(field.name.clone(), Value::Object(fragment));
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Builder for [`ParamSchema`].
#[derive(Debug, Default)]
pub struct ParamSchemaBuilder {
    fields: Vec<ParamField>,
}

impl ParamSchemaBuilder {
    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: ParamField) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a required field.
    #[must_use]
    pub fn required(self, name: impl Into<String>, kind: ParamType) -> Self {
        self.field(ParamField::required(name, kind))
    }

    /// Adds an optional field with a default value.
    #[must_use]
    pub fn optional(self, name: impl Into<String>, kind: ParamType, default: Value) -> Self {
        self.field(ParamField::optional(name, kind, default))
    }

    /// Finalizes the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] when a field name is empty or declared
    /// twice.
    pub fn build(self) -> Result<ParamSchema> {
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(Error::InvalidSchema {
                    reason: "field names cannot be empty".into(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidSchema {
                    reason: format!("field `{}` declared twice", field.name),
                });
            }
        }
        Ok(ParamSchema {
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().expect("object literal")
    }

    fn query_schema() -> ParamSchema {
        ParamSchema::builder()
            .required("query", ParamType::Text)
            .optional("limit", ParamType::Integer, json!(10))
            .build()
            .expect("schema")
    }

    #[test]
    fn validate_accepts_well_typed_arguments() {
        let schema = query_schema();
        assert!(schema.validate(&args(json!({ "query": "aspirin" }))).is_ok());
        assert!(
            schema
                .validate(&args(json!({ "query": "aspirin", "limit": 3 })))
                .is_ok()
        );
    }

    #[test]
    fn validate_reports_missing_required_field() {
        let schema = query_schema();
        let violations = schema
            .validate(&args(json!({ "limit": 3 })))
            .expect_err("missing field");
        assert_eq!(violations, vec!["missing required field `query`"]);
    }

    #[test]
    fn validate_reports_type_mismatches() {
        let schema = query_schema();
        let violations = schema
            .validate(&args(json!({ "query": 7, "limit": "many" })))
            .expect_err("mismatches");
        assert_eq!(violations.len(), 2);
        assert!(violations[0].contains("expected string, got integer"));
        assert!(violations[1].contains("expected integer, got string"));
    }

    #[test]
    fn null_satisfies_optional_but_not_required() {
        let schema = query_schema();
        let violations = schema
            .validate(&args(json!({ "query": null })))
            .expect_err("null for required");
        assert!(violations[0].contains("expected string, got null"));

        assert!(
            schema
                .validate(&args(json!({ "query": "aspirin", "limit": null })))
                .is_ok()
        );
    }

    #[test]
    fn normalize_applies_defaults_and_drops_unknown_keys() {
        let schema = query_schema();
        let normalized = schema.normalize(args(json!({ "query": "aspirin", "page": 2 })));
        assert_eq!(normalized.get("query"), Some(&json!("aspirin")));
        assert_eq!(normalized.get("limit"), Some(&json!(10)));
        assert!(!normalized.contains_key("page"));
    }

    #[test]
    fn normalize_keeps_explicit_values_over_defaults() {
        let schema = query_schema();
        let normalized = schema.normalize(args(json!({ "query": "aspirin", "limit": 3 })));
        assert_eq!(normalized.get("limit"), Some(&json!(3)));
    }

    #[test]
    fn json_schema_lists_properties_and_required() {
        let rendered = query_schema().to_json_schema();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["properties"]["query"]["type"], "string");
        assert_eq!(rendered["properties"]["limit"]["default"], 10);
        assert_eq!(rendered["required"], json!(["query"]));
    }

    #[test]
    fn any_field_accepts_everything_and_has_open_schema() {
        let schema = ParamSchema::builder()
            .required("payload", ParamType::Any)
            .build()
            .expect("schema");
        assert!(schema.validate(&args(json!({ "payload": null }))).is_ok());
        assert!(schema.validate(&args(json!({ "payload": [1, 2] }))).is_ok());
        assert_eq!(
            schema.to_json_schema()["properties"]["payload"],
            json!({})
        );
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let err = ParamSchema::builder()
            .required("q", ParamType::Text)
            .required("q", ParamType::Integer)
            .build()
            .expect_err("duplicate");
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn empty_schema_validates_anything() {
        let schema = ParamSchema::empty();
        assert!(schema.validate(&args(json!({ "extra": true }))).is_ok());
        assert!(schema.normalize(args(json!({ "extra": true }))).is_empty());
    }
}
