use serde_json::Value;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::locator::{self, SpecLocation};

/// Loads an OpenAPI document from a URL or a local file as JSON or YAML.
pub async fn load(reference: &str) -> Result<Value> {
    let content = match locator::classify(reference) {
        SpecLocation::Remote => fetch(reference).await?,
        SpecLocation::Local => tokio::fs::read_to_string(reference)
            .await
            .map_err(|source| PipelineError::OpenApiFileRead {
                path: Path::new(reference).to_path_buf(),
                source,
            })?,
    };
    parse(reference, &content)
}

async fn fetch(url: &str) -> Result<String> {
    tracing::debug!(%url, "downloading OpenAPI document");
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Picks YAML for `.yaml`/`.yml` references and for content that is not a JSON object.
pub fn parse(reference: &str, content: &str) -> Result<Value> {
    let lower = reference.to_ascii_lowercase();
    let looks_like_yaml = lower.ends_with(".yaml") || lower.ends_with(".yml");
    if looks_like_yaml || !content.trim_start().starts_with('{') {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_and_yaml() {
        let json = parse("openapi.json", r#"{"openapi":"3.0.1","paths":{}}"#).unwrap();
        assert_eq!(json["openapi"], "3.0.1");

        let yaml = parse("openapi.yaml", "openapi: 3.0.1\npaths: {}\n").unwrap();
        assert_eq!(yaml["openapi"], "3.0.1");
    }

    #[test]
    fn content_decides_when_extension_is_unknown() {
        let yaml = parse("https://example.com/spec", "swagger: '2.0'\n").unwrap();
        assert_eq!(yaml["swagger"], "2.0");
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = parse("openapi.json", "{ not json").unwrap_err();
        assert!(matches!(err, PipelineError::Json(_)));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = load("definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, PipelineError::OpenApiFileRead { .. }));
    }
}
