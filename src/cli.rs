use clap::Parser;
use std::path::PathBuf;

use crate::settings::MultipleInterfaces;

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(
        value_name = "INPUT",
        help = "URL or file path to the OpenAPI specification"
    )]
    pub input: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Path to a JSON settings file describing the generation (includes its own OpenAPI path)"
    )]
    pub settings_file: Option<PathBuf>,

    #[arg(long, help = "Default namespace to use for generated types")]
    pub namespace: Option<String>,

    #[arg(short, long, value_name = "PATH", help = "Path to the output file [default: Output.cs]")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Don't add the <auto-generated> header")]
    pub no_auto_generated_header: bool,

    #[arg(long, help = "Don't add Accept headers to the generated operations")]
    pub no_accept_headers: bool,

    #[arg(long, help = "Don't generate contract types")]
    pub interface_only: bool,

    #[arg(long, help = "Return Task<IApiResponse<T>> instead of Task<T>")]
    pub return_iapi_response: bool,

    #[arg(long, help = "Add a CancellationToken parameter to every operation")]
    pub use_cancellation_tokens: bool,

    #[arg(long, help = "Don't generate header parameters for operations")]
    pub no_operation_headers: bool,

    #[arg(long, help = "Format date query parameters as ISO 8601 (yyyy-MM-dd)")]
    pub use_iso_date_format: bool,

    #[arg(long, help = "Generate types with internal accessibility instead of public")]
    pub internal_type_accessibility: bool,

    #[arg(long, value_name = "NAMESPACE", num_args = 1.., help = "Additional namespaces to import")]
    pub additional_namespaces: Vec<String>,

    #[arg(long, value_enum, help = "Split the generated client into multiple interfaces")]
    pub multiple_interfaces: Option<MultipleInterfaces>,

    #[arg(long, value_name = "REGEX", num_args = 1.., help = "Only include paths matching one of these patterns")]
    pub match_paths: Vec<String>,

    #[arg(long, value_name = "TAG", num_args = 1.., help = "Only include operations with one of these tags")]
    pub tags: Vec<String>,

    #[arg(long, help = "Don't generate deprecated operations")]
    pub no_deprecated_operations: bool,

    #[arg(
        long,
        value_name = "TEMPLATE",
        help = "Operation name pattern; must contain {operationName}"
    )]
    pub operation_name_template: Option<String>,

    #[arg(long, help = "Skip validation of the OpenAPI specification")]
    pub skip_validation: bool,

    #[arg(long, help = "Don't record anonymous usage analytics")]
    pub no_logging: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_input_and_list_flags() {
        let args = Args::parse_from([
            "oas2cs",
            "petstore.json",
            "--tags",
            "pet",
            "store",
            "--multiple-interfaces",
            "by-tag",
            "--no-accept-headers",
        ]);
        assert_eq!(args.input.as_deref(), Some("petstore.json"));
        assert_eq!(args.tags, vec!["pet", "store"]);
        assert_eq!(args.multiple_interfaces, Some(MultipleInterfaces::ByTag));
        assert!(args.no_accept_headers);
        assert!(!args.skip_validation);
    }

    #[test]
    fn input_and_settings_file_both_parse() {
        // Mutual exclusion is reported by the settings resolver, not by clap.
        let args = Args::try_parse_from([
            "oas2cs",
            "petstore.json",
            "--settings-file",
            "petstore.json.settings",
        ])
        .unwrap();
        assert!(args.input.is_some());
        assert!(args.settings_file.is_some());
    }
}
