//! Drop object members a schema does not declare.

use serde_json::Value;

/// Remove every member of `document` that is not named in the schema's
/// `properties`, recursing into declared members whose subschema is an
/// object. A schema without `properties` leaves its object untouched.
pub fn remove_extra_properties(schema: &Value, document: &mut Value) {
    let (Some(properties), Value::Object(object)) = (
        schema.get("properties").and_then(Value::as_object),
        document,
    ) else {
        return;
    };
    object.retain(|key, _| properties.contains_key(key));
    for (key, member) in object.iter_mut() {
        if let Some(subschema) = properties.get(key).filter(|s| s.is_object()) {
            remove_extra_properties(subschema, member);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn removes_undeclared_members_recursively() {
        let schema = json!({
            "properties": {
                "name": {"type": "string"},
                "address": {"properties": {"city": {}}},
                "meta": {}
            }
        });
        let mut document = json!({
            "name": "x",
            "age": 3,
            "address": {"city": "c", "zip": "z"},
            "meta": {"anything": true}
        });
        remove_extra_properties(&schema, &mut document);
        assert_eq!(
            document,
            json!({"name": "x", "address": {"city": "c"}, "meta": {"anything": true}})
        );
    }

    #[test]
    fn schemas_without_properties_and_non_objects_are_left_alone() {
        let mut document = json!({"a": 1});
        remove_extra_properties(&json!({"type": "object"}), &mut document);
        assert_eq!(document, json!({"a": 1}));

        let mut scalar = json!(5);
        remove_extra_properties(&json!({"properties": {}}), &mut scalar);
        assert_eq!(scalar, json!(5));

        let mut document = json!({"a": 1});
        remove_extra_properties(&json!({"properties": {}}), &mut document);
        assert_eq!(document, json!({}));
    }
}
