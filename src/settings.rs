use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analytics::Analytics;
use crate::cli::Args;
use crate::error::{PipelineError, Result};
use crate::locator::{self, SpecLocation};

pub const DEFAULT_NAMESPACE: &str = "GeneratedCode";
pub const OPERATION_NAME_PLACEHOLDER: &str = "{operationName}";

pub const MISSING_INPUT: &str =
    "You should specify either an OpenAPI specification (URL or file path) or a settings file (--settings-file)";
pub const CONFLICTING_INPUT: &str = "You should either specify an OpenAPI specification directly or use --settings-file, not both";
pub const EMPTY_SETTINGS_REFERENCE: &str =
    "The settings file must specify 'openApiPath' when it is used as the input (--settings-file)";
pub const MISSING_TEMPLATE_PLACEHOLDER: &str =
    "'--operation-name-template' must contain the {operationName} placeholder";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum MultipleInterfaces {
    #[default]
    Unset,
    ByEndpoint,
    ByTag,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeAccessibility {
    #[default]
    Public,
    Internal,
}

impl TypeAccessibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
        }
    }
}

/// The settings document accepted by `--settings-file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsFile {
    pub open_api_path: String,
    pub namespace: Option<String>,
    pub output_folder: Option<String>,
    pub output_filename: Option<String>,
    pub add_auto_generated_header: bool,
    pub add_accept_headers: bool,
    pub generate_contracts: bool,
    #[serde(rename = "returnIApiResponse")]
    pub return_iapi_response: bool,
    pub use_cancellation_tokens: bool,
    pub generate_operation_headers: bool,
    pub use_iso_date_format: bool,
    pub type_accessibility: TypeAccessibility,
    pub additional_namespaces: Vec<String>,
    pub multiple_interfaces: MultipleInterfaces,
    pub include_path_matches: Vec<String>,
    pub include_tags: Vec<String>,
    pub generate_deprecated_operations: bool,
    pub operation_name_template: Option<String>,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            open_api_path: String::new(),
            namespace: None,
            output_folder: None,
            output_filename: None,
            add_auto_generated_header: true,
            add_accept_headers: true,
            generate_contracts: true,
            return_iapi_response: false,
            use_cancellation_tokens: false,
            generate_operation_headers: true,
            use_iso_date_format: false,
            type_accessibility: TypeAccessibility::Public,
            additional_namespaces: Vec::new(),
            multiple_interfaces: MultipleInterfaces::Unset,
            include_path_matches: Vec::new(),
            include_tags: Vec::new(),
            generate_deprecated_operations: true,
            operation_name_template: None,
        }
    }
}

impl SettingsFile {
    /// Maps command-line flags onto the settings document shape. Most toggles
    /// are on unless the matching `--no-*` flag was given.
    pub fn from_args(args: &Args) -> Self {
        Self {
            open_api_path: args.input.clone().unwrap_or_default(),
            namespace: args.namespace.clone(),
            output_folder: None,
            output_filename: None,
            add_auto_generated_header: !args.no_auto_generated_header,
            add_accept_headers: !args.no_accept_headers,
            generate_contracts: !args.interface_only,
            return_iapi_response: args.return_iapi_response,
            use_cancellation_tokens: args.use_cancellation_tokens,
            generate_operation_headers: !args.no_operation_headers,
            use_iso_date_format: args.use_iso_date_format,
            type_accessibility: if args.internal_type_accessibility {
                TypeAccessibility::Internal
            } else {
                TypeAccessibility::Public
            },
            additional_namespaces: args.additional_namespaces.clone(),
            multiple_interfaces: args.multiple_interfaces.unwrap_or_default(),
            include_path_matches: args.match_paths.clone(),
            include_tags: args.tags.clone(),
            generate_deprecated_operations: !args.no_deprecated_operations,
            operation_name_template: args.operation_name_template.clone(),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| PipelineError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Fully resolved configuration handed to the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub open_api_path: String,
    pub namespace: String,
    pub add_auto_generated_header: bool,
    pub add_accept_headers: bool,
    pub generate_contracts: bool,
    pub return_iapi_response: bool,
    pub use_cancellation_tokens: bool,
    pub generate_operation_headers: bool,
    pub use_iso_date_format: bool,
    pub type_accessibility: TypeAccessibility,
    pub additional_namespaces: Vec<String>,
    pub multiple_interfaces: MultipleInterfaces,
    pub include_path_matches: Vec<String>,
    pub include_tags: Vec<String>,
    pub generate_deprecated_operations: bool,
    pub operation_name_template: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        apply_defaults(SettingsFile::default())
    }
}

/// The defaulting routine shared by both resolution phases.
pub fn apply_defaults(document: SettingsFile) -> GenerationConfig {
    let namespace = document
        .namespace
        .filter(|ns| !ns.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    let operation_name_template = document
        .operation_name_template
        .filter(|template| !template.trim().is_empty());

    GenerationConfig {
        open_api_path: document.open_api_path,
        namespace,
        add_auto_generated_header: document.add_auto_generated_header,
        add_accept_headers: document.add_accept_headers,
        generate_contracts: document.generate_contracts,
        return_iapi_response: document.return_iapi_response,
        use_cancellation_tokens: document.use_cancellation_tokens,
        generate_operation_headers: document.generate_operation_headers,
        use_iso_date_format: document.use_iso_date_format,
        type_accessibility: document.type_accessibility,
        additional_namespaces: document
            .additional_namespaces
            .into_iter()
            .filter(|ns| !ns.trim().is_empty())
            .collect(),
        multiple_interfaces: document.multiple_interfaces,
        include_path_matches: document.include_path_matches,
        include_tags: document.include_tags,
        generate_deprecated_operations: document.generate_deprecated_operations,
        operation_name_template,
    }
}

/// Pure mapping from command-line flags to a configuration.
pub fn build_config(args: &Args) -> GenerationConfig {
    apply_defaults(SettingsFile::from_args(args))
}

/// The outcome of validating the command line.
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    /// The effective specification reference, never empty.
    pub reference: String,
    pub location: SpecLocation,
    /// Tentative configuration, superseded by [`resolve_for_execution`].
    pub config: GenerationConfig,
}

/// Validates the command line and resolves the tentative configuration.
///
/// This is the first of two resolution phases. The configuration it returns
/// is only used until [`resolve_for_execution`] re-reads the settings file
/// right before generation. Both phases go through [`apply_defaults`].
///
/// Unless `--no-logging` is set, this also configures `analytics`. That step
/// is best-effort and never fails validation.
///
/// # Arguments
///
/// * `args` - The parsed command line.
/// * `analytics` - Configured before any check runs.
///
/// # Returns
///
/// * `Result<ValidatedInput>` - A `Usage` error for a rejected command line, or
///   a read/parse error when the settings file cannot be loaded.
pub fn validate(args: &Args, analytics: &dyn Analytics) -> Result<ValidatedInput> {
    if !args.no_logging {
        if let Err(err) = analytics.configure() {
            tracing::debug!(error = %err, "analytics configuration failed");
        }
    }

    let input = args.input.as_deref().filter(|input| !input.trim().is_empty());
    let (reference, config) = match (input, args.settings_file.as_deref()) {
        (None, None) => return Err(PipelineError::usage(MISSING_INPUT)),
        (Some(_), Some(_)) => return Err(PipelineError::usage(CONFLICTING_INPUT)),
        (Some(input), None) => (input.to_string(), build_config(args)),
        (None, Some(settings_path)) => {
            let config = resolve_for_validation(settings_path)?;
            if config.open_api_path.trim().is_empty() {
                return Err(PipelineError::usage(EMPTY_SETTINGS_REFERENCE));
            }
            (config.open_api_path.clone(), config)
        }
    };

    let location = locator::classify(&reference);
    if location == SpecLocation::Remote {
        tracing::debug!(%reference, "remote specification, skipping local checks");
        return Ok(ValidatedInput {
            reference,
            location,
            config,
        });
    }

    if let Some(template) = args
        .operation_name_template
        .as_deref()
        .filter(|template| !template.trim().is_empty())
    {
        if !template.contains(OPERATION_NAME_PLACEHOLDER) {
            return Err(PipelineError::usage(MISSING_TEMPLATE_PLACEHOLDER));
        }
    }

    if !Path::new(&reference).exists() {
        return Err(PipelineError::usage(format!(
            "File not found - {}",
            locator::absolute_path(&reference).display()
        )));
    }

    Ok(ValidatedInput {
        reference,
        location,
        config,
    })
}

/// Resolves the configuration a settings file describes, for validation.
pub fn resolve_for_validation(settings_path: &Path) -> Result<GenerationConfig> {
    Ok(apply_defaults(SettingsFile::read(settings_path)?))
}

/// Resolves the final configuration right before generation.
///
/// A settings file is read again because it is the authoritative source at
/// execution time. Only `reference` is applied on top of it; other command
/// line overrides do not carry over.
pub fn resolve_for_execution(args: &Args, reference: &str) -> Result<GenerationConfig> {
    let document = match &args.settings_file {
        Some(path) => SettingsFile::read(path)?,
        None => SettingsFile::from_args(args),
    };
    let mut config = apply_defaults(document);
    config.open_api_path = reference.to_string();
    if template_lacks_placeholder(&config) {
        tracing::warn!(
            template = config.operation_name_template.as_deref().unwrap_or_default(),
            "operation name template has no {OPERATION_NAME_PLACEHOLDER} placeholder; every operation will share one method name"
        );
    }
    Ok(config)
}

/// Whether a configured operation name template is missing its placeholder.
///
/// The command line rejects such templates up front. A settings file is
/// only read at execution time, so this is where its template gets checked.
pub fn template_lacks_placeholder(config: &GenerationConfig) -> bool {
    config
        .operation_name_template
        .as_deref()
        .is_some_and(|template| !template.contains(OPERATION_NAME_PLACEHOLDER))
}

/// Where the generated file goes: `--output`, then the settings file's
/// `outputFolder`/`outputFilename`, else empty so the writer picks its default.
pub fn resolve_output_path(args: &Args) -> Result<PathBuf> {
    if let Some(output) = &args.output {
        return Ok(output.clone());
    }
    let Some(settings_path) = &args.settings_file else {
        return Ok(PathBuf::new());
    };

    let document = SettingsFile::read(settings_path)?;
    let filename = document
        .output_filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| crate::output::DEFAULT_OUTPUT_FILE.to_string());
    Ok(match document.output_folder.filter(|dir| !dir.trim().is_empty()) {
        Some(folder) => PathBuf::from(folder).join(filename),
        None => PathBuf::from(filename),
    })
}
