//! Check tool arguments against the tool's schema before dispatch.

use serde_json::Value;

/// Validate arguments against a tool's JSON Schema.
///
/// Top-level only: object shape, required fields, and primitive property
/// types. Returns the first violation found.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    if schema.get("type").and_then(|v| v.as_str()) == Some("object") && !args.is_object() {
        return Err(format!(
            "expected object arguments, got {}",
            json_type_name(args)
        ));
    }

    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for name in required.iter().filter_map(|f| f.as_str()) {
            match obj.get(name) {
                None | Some(Value::Null) => return Err(format!("missing required field '{name}'")),
                _ => {}
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(|v| v.as_object()) {
        for (key, value) in obj {
            if value.is_null() {
                continue;
            }
            let Some(expected) = properties
                .get(key)
                .and_then(|p| p.get("type"))
                .and_then(|t| t.as_str())
            else {
                continue;
            };
            if !value_matches_type(value, expected) {
                return Err(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    json_type_name(value)
                ));
            }
        }
    }

    Ok(())
}

/// Check that a schema is internally consistent: every required field is a
/// declared property.
pub fn check_schema(schema: &Value) -> Result<(), String> {
    let properties = schema.get("properties").and_then(|p| p.as_object());
    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for name in required.iter().filter_map(|f| f.as_str()) {
            if !properties.is_some_and(|p| p.contains_key(name)) {
                return Err(format!("required field '{name}' is not a declared property"));
            }
        }
    }
    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        // Models often write whole numbers as 10.0.
        "integer" => value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "offset": { "type": "integer" },
            },
            "required": ["path"],
        })
    }

    #[test]
    fn rejects_non_object_args() {
        let err = validate_arguments(&json!("x"), &schema()).unwrap_err();
        assert!(err.contains("expected object"));
    }

    #[test]
    fn rejects_missing_or_null_required_field() {
        assert!(validate_arguments(&json!({}), &schema())
            .unwrap_err()
            .contains("missing required field 'path'"));
        assert!(validate_arguments(&json!({"path": null}), &schema()).is_err());
    }

    #[test]
    fn rejects_wrong_primitive_type() {
        let err = validate_arguments(&json!({"path": 3}), &schema()).unwrap_err();
        assert_eq!(err, "field 'path' expected type 'string', got number");
    }

    #[test]
    fn accepts_whole_floats_for_integers_and_extra_fields() {
        assert!(validate_arguments(&json!({"path": "a", "offset": 10.0, "extra": true}), &schema()).is_ok());
        assert!(validate_arguments(&json!({"path": "a", "offset": 1.5}), &schema()).is_err());
    }

    #[test]
    fn check_schema_flags_undeclared_required() {
        assert!(check_schema(&schema()).is_ok());
        let bad = json!({"type": "object", "properties": {}, "required": ["x"]});
        assert!(check_schema(&bad).is_err());
    }
}
