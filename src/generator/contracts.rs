use serde_json::{Map, Value};
use std::collections::HashSet;

use super::GENERATED_CODE_ATTRIBUTE;
use super::names::{pascal_case, single_line, string_literal, xml_escape};
use super::types::{csharp_type, reference_type};
use crate::settings::GenerationConfig;

/// Writes contract types for the document's named schemas.
///
/// Object schemas become partial classes and enumerations become enums.
/// Other schemas are mapped inline where they are used.
///
/// # Arguments
///
/// * `code` - A mutable reference to the string where the generated C# code will be appended.
/// * `openapi` - The OpenAPI document. Schemas are read from `components/schemas` or `definitions`.
/// * `config` - Supplies the type accessibility keyword.
pub fn write_contracts(code: &mut String, openapi: &Value, config: &GenerationConfig) {
    let Some(schemas) = openapi
        .pointer("/components/schemas")
        .or_else(|| openapi.get("definitions"))
        .and_then(Value::as_object)
    else {
        return;
    };

    let access = config.type_accessibility.keyword();
    for (name, schema) in schemas {
        let type_name = pascal_case(name);
        if let Some(values) = schema.get("enum").and_then(Value::as_array) {
            code.push('\n');
            write_enum(code, access, &type_name, schema, values);
        } else if is_object(schema) {
            code.push('\n');
            write_class(code, access, &type_name, schema);
        }
    }
}

fn is_object(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("object")
        || schema.get("properties").is_some()
        || schema.get("allOf").is_some()
}

fn write_summary(code: &mut String, schema: &Value) {
    if let Some(description) = schema
        .get("description")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
    {
        code.push_str("    /// <summary>\n");
        code.push_str(&format!("    /// {}\n", xml_escape(&single_line(description))));
        code.push_str("    /// </summary>\n");
    }
}

fn write_enum(code: &mut String, access: &str, type_name: &str, schema: &Value, values: &[Value]) {
    write_summary(code, schema);
    code.push_str(&format!("    {GENERATED_CODE_ATTRIBUTE}\n"));
    let is_string = values.iter().all(Value::is_string);
    if is_string {
        code.push_str("    [JsonConverter(typeof(JsonStringEnumConverter))]\n");
    }
    code.push_str(&format!("    {access} enum {type_name}\n    {{\n"));
    let mut members = HashSet::new();
    for value in values {
        match value {
            Value::String(raw) if is_string => {
                let member = unique_member(&mut members, pascal_case(raw));
                code.push_str(&format!("        [EnumMember(Value = \"{}\")]\n", string_literal(raw)));
                code.push_str(&format!("        {member},\n"));
            }
            Value::Number(number) if number.is_i64() => {
                code.push_str(&format!("        Value{} = {number},\n", number.to_string().replace('-', "Minus")));
            }
            _ => {}
        }
    }
    code.push_str("    }\n");
}

/// Suffixes `name` with 2, 3, ... until it is not in `taken`.
fn unique_member(taken: &mut HashSet<String>, name: String) -> String {
    let mut candidate = name.clone();
    let mut suffix = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{name}{suffix}");
        suffix += 1;
    }
    candidate
}

fn write_class(code: &mut String, access: &str, type_name: &str, schema: &Value) {
    let mut base = None;
    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();

    let members = schema
        .get("allOf")
        .and_then(Value::as_array)
        .map(|all| all.iter().collect::<Vec<_>>())
        .unwrap_or_default();
    for part in members.into_iter().chain(std::iter::once(schema)) {
        if let Some(reference) = part.get("$ref").and_then(Value::as_str) {
            base.get_or_insert_with(|| reference_type(reference));
            continue;
        }
        if let Some(props) = part.get("properties").and_then(Value::as_object) {
            properties.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(names) = part.get("required").and_then(Value::as_array) {
            required.extend(names.iter().filter_map(Value::as_str).map(String::from));
        }
    }

    write_summary(code, schema);
    code.push_str(&format!("    {GENERATED_CODE_ATTRIBUTE}\n"));
    match base {
        Some(base) => code.push_str(&format!("    {access} partial class {type_name} : {base}\n    {{\n")),
        None => code.push_str(&format!("    {access} partial class {type_name}\n    {{\n")),
    }

    let rendered: Vec<String> = properties
        .iter()
        .map(|(json_name, property)| {
            let mut property_name = pascal_case(json_name);
            if property_name == type_name {
                property_name.push_str("Value");
            }
            let mut property_type = csharp_type(property);
            if !required.iter().any(|r| r == json_name) {
                property_type.push('?');
            }
            format!(
                "        [JsonPropertyName(\"{}\")]\n        public {property_type} {property_name} {{ get; set; }}\n",
                string_literal(json_name)
            )
        })
        .collect();
    code.push_str(&rendered.join("\n"));
    code.push_str("    }\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(openapi: Value) -> String {
        let mut code = String::new();
        write_contracts(&mut code, &openapi, &GenerationConfig::default());
        code
    }

    #[test]
    fn object_schemas_become_classes() {
        let code = render(json!({
            "components": { "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" },
                        "tags": { "type": "array", "items": { "$ref": "#/components/schemas/Tag" } }
                    }
                }
            }}
        }));
        assert!(code.contains("    public partial class Pet\n    {\n"));
        assert!(code.contains("        [JsonPropertyName(\"id\")]\n        public long? Id { get; set; }\n"));
        assert!(code.contains("        public string Name { get; set; }\n"));
        assert!(code.contains("        public ICollection<Tag>? Tags { get; set; }\n"));
    }

    #[test]
    fn all_of_references_become_base_classes() {
        let code = render(json!({
            "definitions": {
                "Dog": {
                    "allOf": [
                        { "$ref": "#/definitions/Pet" },
                        { "type": "object", "properties": { "bark": { "type": "boolean" } } }
                    ]
                }
            }
        }));
        assert!(code.contains("public partial class Dog : Pet"));
        assert!(code.contains("public bool? Bark { get; set; }"));
    }

    #[test]
    fn string_enums_keep_their_wire_values() {
        let code = render(json!({
            "components": { "schemas": {
                "Status": { "type": "string", "enum": ["available", "sold-out"] }
            }}
        }));
        assert!(code.contains("[JsonConverter(typeof(JsonStringEnumConverter))]"));
        assert!(code.contains("        [EnumMember(Value = \"sold-out\")]\n        SoldOut,\n"));
    }

    #[test]
    fn enum_members_are_escaped_and_unique() {
        let code = render(json!({
            "components": { "schemas": {
                "Mode": { "type": "string", "enum": ["a-b", "a_b", "say \"hi\"", "a b"] }
            }}
        }));
        assert!(code.contains("        [EnumMember(Value = \"a-b\")]\n        AB,\n"));
        assert!(code.contains("        [EnumMember(Value = \"a_b\")]\n        AB2,\n"));
        assert!(code.contains("        [EnumMember(Value = \"a b\")]\n        AB3,\n"));
        assert!(code.contains("        [EnumMember(Value = \"say \\\"hi\\\"\")]\n        SayHi,\n"));
    }

    #[test]
    fn internal_accessibility_is_applied() {
        let mut config = GenerationConfig::default();
        config.type_accessibility = crate::settings::TypeAccessibility::Internal;
        let mut code = String::new();
        write_contracts(
            &mut code,
            &json!({ "components": { "schemas": { "Tag": { "type": "object" } } } }),
            &config,
        );
        assert!(code.contains("internal partial class Tag"));
    }
}
