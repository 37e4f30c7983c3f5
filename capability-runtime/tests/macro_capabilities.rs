//! End-to-end coverage of the `#[capability]` attribute through the facade:
//! generated descriptors registered in a real registry and invoked over both
//! pipelines.

use capability_runtime::capability;
use capability_runtime::primitives::{Arguments, ParamSchema, ParamType};
use capability_runtime::registry::CapabilityRegistry;
use serde_json::{Value, json};

fn args(value: Value) -> Arguments {
    value.as_object().cloned().expect("object literal")
}

/// Adds two integers.
#[capability(default(b = 10))]
fn add(a: i64, b: i64) -> i64 {
    a + b
}

#[capability]
async fn shout(x: String) -> String {
    x.to_uppercase()
}

/// Greets a person, optionally with a title.
#[capability]
fn greet(name: String, title: Option<String>) -> String {
    match title {
        Some(title) => format!("Hello, {title} {name}"),
        None => format!("Hello, {name}"),
    }
}

#[capability(
    name = "patient_lookup",
    description = "Find a patient record by identifier"
)]
fn lookup(id: String) -> Value {
    json!({ "id": id, "found": false })
}

fn window_schema() -> ParamSchema {
    ParamSchema::builder()
        .required("days", ParamType::Integer)
        .build()
        .expect("schema")
}

/// Summarizes activity over a window of days.
#[capability(schema = window_schema)]
fn activity(days: i64) -> String {
    format!("{days} days")
}

#[test]
fn inferred_schema_marks_defaulted_parameters_optional() {
    let descriptor = add_capability().expect("descriptor");
    let info = descriptor.info();
    assert_eq!(info.name(), "add");
    assert_eq!(info.description(), "Adds two integers.");

    let parameters = info.parameters();
    assert_eq!(parameters["type"], "object");
    assert_eq!(parameters["properties"]["a"]["type"], "integer");
    assert_eq!(parameters["properties"]["b"]["type"], "integer");
    assert_eq!(parameters["required"], json!(["a"]));
}

#[test]
fn missing_doc_comment_falls_back_to_a_generated_description() {
    let descriptor = shout_capability().expect("descriptor");
    assert_eq!(descriptor.description(), "Execute shout");
    assert!(descriptor.is_async());
}

#[test]
fn defaulted_parameters_fill_in_before_the_handler_runs() {
    let registry = CapabilityRegistry::new();
    registry.register(add_capability().expect("descriptor")).expect("register");

    let result = registry
        .invoke_blocking("add", args(json!({ "a": 5 })))
        .expect("invoke");
    assert!(result.is_success());
    assert_eq!(result.data(), Some(&json!(15)));

    let result = registry
        .invoke_blocking("add", args(json!({ "a": 5, "b": 2 })))
        .expect("invoke");
    assert_eq!(result.data(), Some(&json!(7)));
}

#[test]
fn generated_async_capabilities_run_from_blocking_call_sites() {
    let registry = CapabilityRegistry::new();
    registry.register(shout_capability().expect("descriptor")).expect("register");

    let result = registry
        .invoke_blocking("shout", args(json!({ "x": "hi" })))
        .expect("invoke");
    assert!(result.is_success());
    assert_eq!(result.data(), Some(&json!("HI")));
}

#[tokio::test]
async fn generated_async_capabilities_are_awaited_on_the_async_pipeline() {
    let registry = CapabilityRegistry::new();
    registry.register(shout_capability().expect("descriptor")).expect("register");

    let result = registry
        .invoke("shout", args(json!({ "x": "hi" })))
        .await
        .expect("invoke");
    assert!(result.is_success());
    assert_eq!(result.data(), Some(&json!("HI")));
}

#[test]
fn optional_parameters_accept_absence_and_null() {
    let registry = CapabilityRegistry::new();
    registry.register(greet_capability().expect("descriptor")).expect("register");

    let result = registry
        .invoke_blocking("greet", args(json!({ "name": "Ada" })))
        .expect("invoke");
    assert_eq!(result.data(), Some(&json!("Hello, Ada")));

    let result = registry
        .invoke_blocking("greet", args(json!({ "name": "Ada", "title": null })))
        .expect("invoke");
    assert_eq!(result.data(), Some(&json!("Hello, Ada")));

    let result = registry
        .invoke_blocking("greet", args(json!({ "name": "Ada", "title": "Dr" })))
        .expect("invoke");
    assert_eq!(result.data(), Some(&json!("Hello, Dr Ada")));
}

#[test]
fn attribute_overrides_replace_the_inferred_name_and_description() {
    let descriptor = lookup_capability().expect("descriptor");
    assert_eq!(descriptor.name(), "patient_lookup");
    assert_eq!(descriptor.description(), "Find a patient record by identifier");

    let registry = CapabilityRegistry::new();
    registry.register(descriptor).expect("register");
    let result = registry
        .invoke_blocking("patient_lookup", args(json!({ "id": "p-42" })))
        .expect("invoke");
    assert_eq!(result.data(), Some(&json!({ "id": "p-42", "found": false })));
}

#[test]
fn schema_override_replaces_the_inferred_schema() {
    let registry = CapabilityRegistry::new();
    registry.register(activity_capability().expect("descriptor")).expect("register");

    let result = registry
        .invoke_blocking("activity", args(json!({ "days": 3 })))
        .expect("invoke");
    assert_eq!(result.data(), Some(&json!("3 days")));

    let result = registry
        .invoke_blocking("activity", args(json!({ "days": "three" })))
        .expect("invoke");
    assert!(!result.is_success());
    assert!(
        result
            .error()
            .expect("error")
            .starts_with("Schema validation error:")
    );
}

#[test]
fn validation_errors_surface_through_generated_capabilities() {
    let registry = CapabilityRegistry::new();
    registry.register(add_capability().expect("descriptor")).expect("register");

    let result = registry
        .invoke_blocking("add", args(json!({ "a": "five" })))
        .expect("invoke");
    assert!(!result.is_success());
    let error = result.error().expect("error");
    assert!(error.starts_with("Schema validation error:"));
    assert!(error.contains("field `a` expected integer, got string"));
}

#[test]
fn generated_constructors_compose_with_prefixed_batch_registration() {
    let registry = CapabilityRegistry::new();
    registry
        .register_prefixed(
            "med_",
            [
                add_capability().expect("descriptor"),
                shout_capability().expect("descriptor"),
            ],
        )
        .expect("register");

    assert_eq!(registry.list(), vec!["med_add", "med_shout"]);

    let manifest = registry.manifest();
    assert_eq!(manifest[0].name(), "med_add");
    assert_eq!(manifest[0].description(), "Adds two integers.");

    let result = registry
        .invoke_blocking("med_add", args(json!({ "a": 1, "b": 2 })))
        .expect("invoke");
    assert_eq!(result.data(), Some(&json!(3)));
}
