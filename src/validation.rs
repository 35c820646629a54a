use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::document;
use crate::error::Result;

const HTTP_METHODS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("Error"),
            Self::Warning => f.write_str("Warning"),
        }
    }
}

/// A single validation finding. `location` is a JSON pointer into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            message: message.into(),
            location: location.into(),
        }
    }

    pub fn warning(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            message: message.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.message, self.location)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenApiStats {
    pub path_items: usize,
    pub operations: usize,
    pub parameters: usize,
    pub request_bodies: usize,
    pub responses: usize,
    pub headers: usize,
    pub schemas: usize,
    pub links: usize,
    pub callbacks: usize,
}

impl fmt::Display for OpenApiStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path Items: {}", self.path_items)?;
        writeln!(f, "Operations: {}", self.operations)?;
        writeln!(f, "Parameters: {}", self.parameters)?;
        writeln!(f, "Request Bodies: {}", self.request_bodies)?;
        writeln!(f, "Responses: {}", self.responses)?;
        writeln!(f, "Headers: {}", self.headers)?;
        writeln!(f, "Schemas: {}", self.schemas)?;
        writeln!(f, "Links: {}", self.links)?;
        write!(f, "Callbacks: {}", self.callbacks)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub statistics: OpenApiStats,
}

impl ValidationOutcome {
    /// Builds an outcome whose verdict is "valid" unless an error was found.
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>, statistics: OpenApiStats) -> Self {
        let valid = !diagnostics.iter().any(|d| d.kind == DiagnosticKind::Error);
        Self {
            valid,
            diagnostics,
            statistics,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == DiagnosticKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == DiagnosticKind::Warning)
    }
}

/// Checks an OpenAPI document before code is generated from it.
#[async_trait]
pub trait SpecValidator: Send + Sync {
    async fn validate(&self, reference: &str) -> Result<ValidationOutcome>;
}

/// Structural checks over a JSON or YAML OpenAPI document.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenApiValidator;

#[async_trait]
impl SpecValidator for OpenApiValidator {
    async fn validate(&self, reference: &str) -> Result<ValidationOutcome> {
        let openapi = document::load(reference).await?;
        Ok(inspect(&openapi))
    }
}

/// Runs every check against an already loaded document.
pub fn inspect(openapi: &Value) -> ValidationOutcome {
    let mut diagnostics = Vec::new();
    let mut stats = OpenApiStats::default();

    if version_of(openapi).is_none() {
        diagnostics.push(Diagnostic::error(
            "Missing OpenAPI version ('openapi' or 'swagger' field)",
            "#",
        ));
    }

    let info = openapi.get("info");
    for field in ["title", "version"] {
        if info.and_then(|i| i.get(field)).and_then(Value::as_str).is_none() {
            diagnostics.push(Diagnostic::error(
                format!("Missing required field 'info.{field}'"),
                "#/info",
            ));
        }
    }

    match openapi.get("paths").and_then(Value::as_object) {
        Some(paths) => inspect_paths(paths, &mut diagnostics, &mut stats),
        None => diagnostics.push(Diagnostic::error("Missing required field 'paths'", "#/paths")),
    }

    stats.schemas = openapi
        .pointer("/components/schemas")
        .or_else(|| openapi.get("definitions"))
        .and_then(Value::as_object)
        .map_or(0, |schemas| schemas.len());

    check_references(openapi, openapi, &mut String::from("#"), &mut diagnostics);

    ValidationOutcome::from_diagnostics(diagnostics, stats)
}

fn version_of(openapi: &Value) -> Option<&str> {
    openapi
        .get("openapi")
        .or_else(|| openapi.get("swagger"))
        .and_then(Value::as_str)
}

fn inspect_paths(
    paths: &serde_json::Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
    stats: &mut OpenApiStats,
) {
    let mut operation_ids: HashMap<&str, String> = HashMap::new();

    for (path, path_item) in paths {
        let path_location = format!("#/paths/{}", escape_pointer(path));
        stats.path_items += 1;
        if !path.starts_with('/') {
            diagnostics.push(Diagnostic::error(
                format!("Path '{path}' must begin with '/'"),
                path_location.clone(),
            ));
        }
        stats.parameters += count_array(path_item.get("parameters"));

        for method in HTTP_METHODS {
            let Some(operation) = path_item.get(method).filter(|op| op.is_object()) else {
                continue;
            };
            let location = format!("{path_location}/{method}");
            stats.operations += 1;
            stats.parameters += count_array(operation.get("parameters"));
            if operation.get("requestBody").is_some() {
                stats.request_bodies += 1;
            }
            stats.callbacks += count_object(operation.get("callbacks"));

            match operation.get("operationId").and_then(Value::as_str) {
                Some(id) => {
                    if let Some(first) = operation_ids.insert(id, location.clone()) {
                        diagnostics.push(Diagnostic::error(
                            format!("Duplicate operationId '{id}' (first declared at {first})"),
                            location.clone(),
                        ));
                    }
                }
                None => diagnostics.push(Diagnostic::warning(
                    format!("Operation {} {path} has no operationId", method.to_uppercase()),
                    location.clone(),
                )),
            }

            match operation.get("responses").and_then(Value::as_object) {
                Some(responses) if !responses.is_empty() => {
                    stats.responses += responses.len();
                    for response in responses.values() {
                        stats.headers += count_object(response.get("headers"));
                        stats.links += count_object(response.get("links"));
                    }
                }
                _ => diagnostics.push(Diagnostic::warning(
                    format!("Operation {} {path} declares no responses", method.to_uppercase()),
                    format!("{location}/responses"),
                )),
            }
        }
    }
}

/// Reports every local `$ref` that does not resolve inside `root`.
fn check_references(root: &Value, node: &Value, location: &mut String, diagnostics: &mut Vec<Diagnostic>) {
    match node {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                if let Some(pointer) = reference.strip_prefix('#') {
                    if root.pointer(pointer).is_none() {
                        diagnostics.push(Diagnostic::error(
                            format!("Unresolved reference '{reference}'"),
                            location.clone(),
                        ));
                    }
                }
            }
            for (key, child) in map {
                let len = location.len();
                location.push('/');
                location.push_str(&escape_pointer(key));
                check_references(root, child, location, diagnostics);
                location.truncate(len);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let len = location.len();
                location.push('/');
                location.push_str(&index.to_string());
                check_references(root, child, location, diagnostics);
                location.truncate(len);
            }
        }
        _ => {}
    }
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn count_array(value: Option<&Value>) -> usize {
    value.and_then(Value::as_array).map_or(0, Vec::len)
}

fn count_object(value: Option<&Value>) -> usize {
    value.and_then(Value::as_object).map_or(0, |map| map.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "openapi": "3.0.1",
            "info": { "title": "Petstore", "version": "1.0.0" },
            "paths": {
                "/pets/{petId}": {
                    "parameters": [{ "name": "petId", "in": "path", "required": true }],
                    "get": {
                        "operationId": "getPetById",
                        "responses": {
                            "200": {
                                "description": "ok",
                                "headers": { "X-Rate-Limit": { "schema": { "type": "integer" } } },
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
                            },
                            "404": { "description": "missing" }
                        }
                    },
                    "delete": {
                        "operationId": "deletePet",
                        "responses": { "204": { "description": "gone" } }
                    }
                },
                "/pets": {
                    "post": {
                        "operationId": "addPet",
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } } },
                        "responses": { "201": { "description": "created" } }
                    }
                }
            },
            "components": { "schemas": { "Pet": { "type": "object" } } }
        })
    }

    #[test]
    fn valid_document_produces_statistics() {
        let outcome = inspect(&petstore());
        assert!(outcome.valid, "{:?}", outcome.diagnostics);
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(
            outcome.statistics,
            OpenApiStats {
                path_items: 2,
                operations: 3,
                parameters: 1,
                request_bodies: 1,
                responses: 4,
                headers: 1,
                schemas: 1,
                links: 0,
                callbacks: 0,
            }
        );
    }

    #[test]
    fn missing_required_fields_are_errors() {
        let outcome = inspect(&json!({ "info": { "title": "x" } }));
        assert!(!outcome.valid);
        let messages: Vec<_> = outcome.errors().map(|d| d.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("version ('openapi'")));
        assert!(messages.iter().any(|m| m.contains("info.version")));
        assert!(messages.iter().any(|m| m.contains("'paths'")));
    }

    #[test]
    fn warnings_alone_keep_the_document_valid() {
        let mut doc = petstore();
        doc["paths"]["/pets"]["post"]
            .as_object_mut()
            .unwrap()
            .remove("operationId");
        let outcome = inspect(&doc);
        assert!(outcome.valid);
        assert_eq!(outcome.warnings().count(), 1);
        assert_eq!(outcome.warnings().next().unwrap().location, "#/paths/~1pets/post");
    }

    #[test]
    fn duplicate_operation_ids_and_dangling_refs_are_errors() {
        let mut doc = petstore();
        doc["paths"]["/pets"]["post"]["operationId"] = json!("getPetById");
        doc["components"]["schemas"].as_object_mut().unwrap().remove("Pet");
        let outcome = inspect(&doc);
        assert!(!outcome.valid);
        assert!(outcome.errors().any(|d| d.message.starts_with("Duplicate operationId 'getPetById'")));
        assert_eq!(
            outcome
                .errors()
                .filter(|d| d.message == "Unresolved reference '#/components/schemas/Pet'")
                .count(),
            2
        );
    }

    #[test]
    fn diagnostics_render_kind_message_and_location() {
        let diagnostic = Diagnostic::warning("no operationId", "#/paths/~1pets/get");
        assert_eq!(diagnostic.to_string(), "Warning: no operationId (#/paths/~1pets/get)");
    }
}
