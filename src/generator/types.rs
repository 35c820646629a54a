use serde_json::Value;

use super::names::pascal_case;

/// Maps an OpenAPI schema to the C# type used for it.
pub fn csharp_type(schema: &Value) -> String {
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        return reference_type(reference);
    }
    if let Some(first) = schema
        .get("allOf")
        .and_then(Value::as_array)
        .filter(|all| all.len() == 1)
        .and_then(|all| all.first())
    {
        return csharp_type(first);
    }

    let format = schema.get("format").and_then(Value::as_str);
    match schema.get("type").and_then(Value::as_str) {
        Some("string") => match format {
            Some("date-time") | Some("date") => "DateTimeOffset".to_string(),
            Some("uuid") => "Guid".to_string(),
            Some("byte") | Some("binary") => "byte[]".to_string(),
            _ => "string".to_string(),
        },
        Some("integer") => match format {
            Some("int64") => "long".to_string(),
            _ => "int".to_string(),
        },
        Some("number") => match format {
            Some("float") => "float".to_string(),
            Some("decimal") => "decimal".to_string(),
            _ => "double".to_string(),
        },
        Some("boolean") => "bool".to_string(),
        Some("array") => {
            let item = schema.get("items").map_or_else(|| "object".to_string(), csharp_type);
            format!("ICollection<{item}>")
        }
        _ => match schema.get("additionalProperties") {
            Some(inner @ Value::Object(_)) => format!("IDictionary<string, {}>", csharp_type(inner)),
            Some(Value::Bool(true)) => "IDictionary<string, object>".to_string(),
            _ => "object".to_string(),
        },
    }
}

/// `#/components/schemas/pet_owner` → `PetOwner`.
pub fn reference_type(reference: &str) -> String {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    pascal_case(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_primitive_formats() {
        assert_eq!(csharp_type(&json!({ "type": "integer", "format": "int64" })), "long");
        assert_eq!(csharp_type(&json!({ "type": "integer" })), "int");
        assert_eq!(csharp_type(&json!({ "type": "string", "format": "date-time" })), "DateTimeOffset");
        assert_eq!(csharp_type(&json!({ "type": "string", "format": "uuid" })), "Guid");
        assert_eq!(csharp_type(&json!({ "type": "boolean" })), "bool");
        assert_eq!(csharp_type(&json!({})), "object");
    }

    #[test]
    fn maps_collections_and_references() {
        assert_eq!(
            csharp_type(&json!({ "type": "array", "items": { "$ref": "#/components/schemas/pet" } })),
            "ICollection<Pet>"
        );
        assert_eq!(
            csharp_type(&json!({ "type": "object", "additionalProperties": { "type": "integer" } })),
            "IDictionary<string, int>"
        );
        assert_eq!(csharp_type(&json!({ "allOf": [{ "$ref": "#/definitions/Order" }] })), "Order");
    }
}
