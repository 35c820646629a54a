use std::error::Error as _;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning an OpenAPI document into C# client code.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The command line or settings file was rejected before any work started.
    #[error("{0}")]
    Usage(String),

    /// Upstream validation found errors. Its diagnostics were already reported.
    #[error("OpenAPI specification is invalid ({errors} error(s))")]
    SpecificationInvalid { errors: usize },

    /// An I/O error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse YAML data.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failed to download a remote OpenAPI document.
    #[error("Failed to fetch OpenAPI document: {0}")]
    Fetch(#[from] reqwest::Error),

    /// A `--match-paths` entry is not a valid regular expression.
    #[error("Invalid path match pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Failed to read the settings file.
    #[error("Failed to read settings file: {}", .path.display())]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the OpenAPI file.
    #[error("Failed to read OpenAPI file: {}", .path.display())]
    OpenApiFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The code generator could not produce output.
    #[error("Code generation failed: {0}")]
    Generation(String),
}

/// The only distinction the reporter draws between failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SpecificationInvalid,
    Other,
}

impl PipelineError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::SpecificationInvalid { .. } => FailureKind::SpecificationInvalid,
            _ => FailureKind::Other,
        }
    }

    /// Categorical name printed next to unexpected failures.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Usage(_) => "UsageError",
            Self::SpecificationInvalid { .. } => "SpecificationInvalid",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::Yaml(_) => "YamlError",
            Self::Fetch(_) => "FetchError",
            Self::InvalidPattern(_) => "PatternError",
            Self::SettingsRead { .. } => "SettingsReadError",
            Self::OpenApiFileRead { .. } => "DocumentReadError",
            Self::Generation(_) => "GenerationError",
        }
    }

    /// Process exit code for this failure, following the BSD `sysexits` values.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) | Self::InvalidPattern(_) => 64,
            Self::SpecificationInvalid { .. } | Self::Json(_) | Self::Yaml(_) => 65,
            Self::SettingsRead { .. } | Self::OpenApiFileRead { .. } => 66,
            Self::Fetch(_) => 69,
            Self::Generation(_) => 70,
            Self::Io(_) => 74,
        }
    }

    /// The chain of underlying causes, outermost first.
    pub fn trace(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut source = self.source();
        while let Some(cause) = source {
            lines.push(cause.to_string());
            source = cause.source();
        }
        lines
    }
}

/// A type alias for `Result<T, PipelineError>`.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specification_invalid_is_its_own_kind() {
        let err = PipelineError::SpecificationInvalid { errors: 2 };
        assert_eq!(err.kind(), FailureKind::SpecificationInvalid);
        assert_eq!(PipelineError::usage("nope").kind(), FailureKind::Other);
    }

    #[test]
    fn exit_codes_are_nonzero_and_vary_by_failure() {
        let usage = PipelineError::usage("x");
        let generation = PipelineError::generation("x");
        let io = PipelineError::from(std::io::Error::other("disk"));
        assert_eq!(usage.exit_code(), 64);
        assert_eq!(generation.exit_code(), 70);
        assert_eq!(io.exit_code(), 74);
    }

    #[test]
    fn trace_walks_the_source_chain() {
        let err = PipelineError::SettingsRead {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.trace(), vec!["no such file".to_string()]);
        assert_eq!(err.category(), "SettingsReadError");
    }
}
