use regex::Regex;
use serde_json::Value;

use super::names::{parameter_name, pascal_case, single_line, string_literal, xml_escape};
use super::types::csharp_type;
use super::GENERATED_CODE_ATTRIBUTE;
use crate::settings::{GenerationConfig, MultipleInterfaces, OPERATION_NAME_PLACEHOLDER};

/// HTTP methods Refit has attributes for.
const REFIT_METHODS: [(&str, &str); 7] = [
    ("get", "Get"),
    ("put", "Put"),
    ("post", "Post"),
    ("delete", "Delete"),
    ("options", "Options"),
    ("head", "Head"),
    ("patch", "Patch"),
];

const ISO_DATE_FORMAT: &str = "yyyy-MM-dd";

/// One operation selected for generation.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub attribute: &'static str,
    pub operation: &'a Value,
    pub path_item: &'a Value,
}

impl<'a> Operation<'a> {
    /// The operationId in PascalCase, or one derived from method and path.
    pub fn name(&self) -> String {
        match self.operation.get("operationId").and_then(Value::as_str) {
            Some(id) => pascal_case(id),
            None => pascal_case(&format!("{} {}", self.method, self.path.replace(['{', '}'], ""))),
        }
    }

    pub fn tags(&self) -> Vec<&'a str> {
        self.operation
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_deprecated(&self) -> bool {
        self.operation
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Selects operations in document order, applying the path, tag and
/// deprecation filters.
pub fn collect_operations<'a>(
    openapi: &'a Value,
    config: &GenerationConfig,
    path_filters: &[Regex],
) -> Vec<Operation<'a>> {
    let Some(paths) = openapi.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut operations = Vec::new();
    for (path, path_item) in paths {
        if !path_filters.is_empty() && !path_filters.iter().any(|filter| filter.is_match(path)) {
            continue;
        }
        for (method, attribute) in REFIT_METHODS {
            let Some(operation) = path_item.get(method).filter(|op| op.is_object()) else {
                continue;
            };
            let candidate = Operation {
                path,
                method,
                attribute,
                operation,
                path_item,
            };
            if !config.include_tags.is_empty()
                && !candidate
                    .tags()
                    .iter()
                    .any(|tag| config.include_tags.iter().any(|wanted| wanted == tag))
            {
                continue;
            }
            if !config.generate_deprecated_operations && candidate.is_deprecated() {
                continue;
            }
            operations.push(candidate);
        }
    }
    operations
}

/// Splits operations into named interfaces according to `mode`.
pub fn group_operations<'a>(
    openapi: &Value,
    operations: Vec<Operation<'a>>,
    mode: MultipleInterfaces,
) -> Vec<(String, Vec<Operation<'a>>)> {
    match mode {
        MultipleInterfaces::Unset => {
            let name = openapi
                .pointer("/info/title")
                .and_then(Value::as_str)
                .map(|title| format!("I{}", pascal_case(title)))
                .unwrap_or_else(|| "IApiClient".to_string());
            vec![(name, operations)]
        }
        MultipleInterfaces::ByEndpoint => operations
            .into_iter()
            .map(|op| (format!("I{}Endpoint", op.name()), vec![op]))
            .collect(),
        MultipleInterfaces::ByTag => {
            let mut groups: Vec<(String, Vec<Operation<'a>>)> = Vec::new();
            for op in operations {
                let tag = op.tags().first().copied().unwrap_or("Default");
                let name = format!("I{}Api", pascal_case(tag));
                match groups.iter().position(|(existing, _)| *existing == name) {
                    Some(index) => groups[index].1.push(op),
                    None => groups.push((name, vec![op])),
                }
            }
            groups
        }
    }
}

struct Parameter {
    name: String,
    location: String,
    required: bool,
    schema: Value,
}

/// Writes Refit interfaces for the selected operations.
pub struct InterfaceWriter<'a> {
    openapi: &'a Value,
    config: &'a GenerationConfig,
}

impl<'a> InterfaceWriter<'a> {
    pub fn new(openapi: &'a Value, config: &'a GenerationConfig) -> Self {
        Self { openapi, config }
    }

    /// Appends one Refit interface to `code`.
    ///
    /// Each operation becomes a method carrying its HTTP attribute. The method
    /// also gets an XML summary, optional `Accept` headers, and its path,
    /// query, header, and body parameters.
    ///
    /// # Arguments
    ///
    /// * `code` - A mutable reference to the string where the generated C# code will be appended.
    /// * `name` - The interface name, already prefixed with `I`.
    /// * `operations` - The operations that belong to this interface, in document order.
    pub fn write(&self, code: &mut String, name: &str, operations: &[Operation<'a>]) {
        code.push_str(&format!("    {GENERATED_CODE_ATTRIBUTE}\n"));
        code.push_str(&format!(
            "    {} partial interface {name}\n    {{\n",
            self.config.type_accessibility.keyword()
        ));
        let methods: Vec<String> = operations.iter().map(|op| self.method(op)).collect();
        code.push_str(&methods.join("\n"));
        code.push_str("    }\n");
    }

    fn method_name(&self, operation: &Operation<'a>) -> String {
        let by_endpoint = self.config.multiple_interfaces == MultipleInterfaces::ByEndpoint;
        let base = if by_endpoint {
            "Execute".to_string()
        } else {
            operation.name()
        };
        match &self.config.operation_name_template {
            Some(template) => template.replace(OPERATION_NAME_PLACEHOLDER, &base),
            None => base,
        }
    }

    fn method(&self, operation: &Operation<'a>) -> String {
        let mut code = String::new();

        let summary = operation
            .operation
            .get("summary")
            .or_else(|| operation.operation.get("description"))
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty());
        if let Some(summary) = summary {
            code.push_str("        /// <summary>\n");
            code.push_str(&format!("        /// {}\n", xml_escape(&single_line(summary))));
            code.push_str("        /// </summary>\n");
        }
        if operation.is_deprecated() {
            code.push_str("        [System.Obsolete]\n");
        }
        if self.config.add_accept_headers {
            let accept = self.accept_types(operation);
            if !accept.is_empty() {
                code.push_str(&format!("        [Headers(\"Accept: {}\")]\n", accept.join(", ")));
            }
        }
        code.push_str(&format!(
            "        [{}(\"{}\")]\n",
            operation.attribute,
            string_literal(operation.path)
        ));

        let return_type = match (self.success_type(operation), self.config.return_iapi_response) {
            (Some(body), true) => format!("Task<IApiResponse<{body}>>"),
            (Some(body), false) => format!("Task<{body}>"),
            (None, true) => "Task<IApiResponse>".to_string(),
            (None, false) => "Task".to_string(),
        };
        code.push_str(&format!(
            "        {return_type} {}({});\n",
            self.method_name(operation),
            self.parameters(operation).join(", ")
        ));
        code
    }

    /// Path and operation parameters, with operation-level entries replacing
    /// path-level ones of the same name and location.
    fn collect_parameters(&self, operation: &Operation<'a>) -> Vec<Parameter> {
        let mut parameters: Vec<Parameter> = Vec::new();
        let declared = [operation.path_item, operation.operation]
            .into_iter()
            .filter_map(|owner| owner.get("parameters").and_then(Value::as_array))
            .flatten();

        for raw in declared {
            let raw = self.resolve(raw);
            let (Some(name), Some(location)) = (
                raw.get("name").and_then(Value::as_str),
                raw.get("in").and_then(Value::as_str),
            ) else {
                continue;
            };
            let parameter = Parameter {
                name: name.to_string(),
                location: location.to_string(),
                required: matches!(location, "path" | "body")
                    || raw.get("required").and_then(Value::as_bool).unwrap_or(false),
                schema: raw.get("schema").cloned().unwrap_or_else(|| raw.clone()),
            };
            match parameters
                .iter()
                .position(|p| p.name == parameter.name && p.location == parameter.location)
            {
                Some(index) => parameters[index] = parameter,
                None => parameters.push(parameter),
            }
        }
        parameters
    }

    fn parameters(&self, operation: &Operation<'a>) -> Vec<String> {
        let mut required = Vec::new();
        let mut optional = Vec::new();

        for parameter in self.collect_parameters(operation) {
            let identifier = parameter_name(&parameter.name);
            let alias = if identifier.trim_start_matches('@') == parameter.name {
                String::new()
            } else {
                format!("[AliasAs(\"{}\")] ", string_literal(&parameter.name))
            };
            let type_name = csharp_type(&parameter.schema);

            let rendered = match parameter.location.as_str() {
                "path" => format!("{alias}{type_name} {identifier}"),
                "query" => {
                    let is_date = parameter.schema.get("format").and_then(Value::as_str) == Some("date");
                    let query = if self.config.use_iso_date_format && is_date {
                        format!("[Query(Format = \"{ISO_DATE_FORMAT}\")] ")
                    } else {
                        String::new()
                    };
                    format!("{query}{alias}{}", typed(&type_name, &identifier, parameter.required))
                }
                "header" if self.config.generate_operation_headers => format!(
                    "[Header(\"{}\")] {}",
                    string_literal(&parameter.name),
                    typed("string", &identifier, parameter.required)
                ),
                "body" => format!("[Body] {type_name} {identifier}"),
                _ => continue,
            };
            if parameter.required {
                required.push(rendered);
            } else {
                optional.push(rendered);
            }
        }

        if let Some(body) = self.request_body_type(operation) {
            required.push(format!("[Body] {body} body"));
        }
        required.extend(optional);
        if self.config.use_cancellation_tokens {
            required.push("CancellationToken cancellationToken = default".to_string());
        }
        required
    }

    fn request_body_type(&self, operation: &Operation<'a>) -> Option<String> {
        let body = self.resolve(operation.operation.get("requestBody")?);
        let content = body.get("content")?.as_object()?;
        let media = content
            .get("application/json")
            .or_else(|| content.values().next())?;
        Some(media.get("schema").map_or_else(|| "object".to_string(), csharp_type))
    }

    fn success_response(&self, operation: &Operation<'a>) -> Option<&'a Value> {
        let responses = operation.operation.get("responses")?.as_object()?;
        let status = responses
            .keys()
            .find(|code| code.as_str() == "200")
            .or_else(|| responses.keys().find(|code| code.starts_with('2')))
            .or_else(|| responses.keys().find(|code| code.as_str() == "default"))?;
        Some(self.resolve(&responses[status]))
    }

    fn success_type(&self, operation: &Operation<'a>) -> Option<String> {
        let response = self.success_response(operation)?;
        if let Some(schema) = response.get("schema") {
            return Some(csharp_type(schema));
        }
        let content = response.get("content")?.as_object()?;
        let media = content
            .iter()
            .find(|(media_type, _)| media_type.contains("json"))
            .or_else(|| content.iter().next())
            .map(|(_, media)| media)?;
        media.get("schema").map(csharp_type)
    }

    fn accept_types(&self, operation: &Operation<'a>) -> Vec<String> {
        if let Some(content) = self
            .success_response(operation)
            .and_then(|response| response.get("content"))
            .and_then(Value::as_object)
        {
            return content.keys().cloned().collect();
        }
        operation
            .operation
            .get("produces")
            .or_else(|| self.openapi.get("produces"))
            .and_then(Value::as_array)
            .map(|types| types.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    }

    /// Follows a local `$ref`, or returns `value` unchanged.
    fn resolve(&self, value: &'a Value) -> &'a Value {
        value
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|reference| reference.strip_prefix('#'))
            .and_then(|pointer| self.openapi.pointer(pointer))
            .unwrap_or(value)
    }
}

fn typed(type_name: &str, identifier: &str, required: bool) -> String {
    if required {
        format!("{type_name} {identifier}")
    } else {
        format!("{type_name}? {identifier} = default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unnamed_operations_get_a_name_from_method_and_path() {
        let openapi = json!({ "paths": { "/pets/{petId}/photos": { "post": { "responses": {} } } } });
        let config = GenerationConfig::default();
        let operations = collect_operations(&openapi, &config, &[]);
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].name(), "PostPetsPetIdPhotos");
    }

    #[test]
    fn swagger_body_parameters_and_aliases() {
        let openapi = json!({
            "swagger": "2.0",
            "produces": ["application/json"],
            "paths": { "/pets/{pet_id}": { "put": {
                "operationId": "updatePet",
                "parameters": [
                    { "name": "pet_id", "in": "path", "required": true, "type": "integer" },
                    { "name": "pet", "in": "body", "schema": { "$ref": "#/definitions/Pet" } }
                ],
                "responses": { "200": { "description": "ok", "schema": { "$ref": "#/definitions/Pet" } } }
            } } },
            "definitions": { "Pet": { "type": "object" } }
        });
        let config = GenerationConfig::default();
        let operations = collect_operations(&openapi, &config, &[]);
        let writer = InterfaceWriter::new(&openapi, &config);
        let mut code = String::new();
        writer.write(&mut code, "IPets", &operations);

        assert!(code.contains("        [Headers(\"Accept: application/json\")]\n"));
        assert!(code.contains(
            "        Task<Pet> UpdatePet([AliasAs(\"pet_id\")] int petId, [Body] Pet pet);\n"
        ));
    }
}
