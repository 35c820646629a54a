use anyhow::{Result, bail};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::OnceLock;

use crate::cli::Args;
use crate::error::PipelineError;

const ANALYTICS_TARGET: &str = "oas2cs::analytics";

/// Anonymous usage analytics.
///
/// Every call is best-effort: callers log and drop the returned errors.
pub trait Analytics: Send + Sync {
    /// Prepares the analytics backend. Calling it more than once is harmless.
    fn configure(&self) -> Result<()>;

    /// Anonymous key users can quote when asking for support.
    fn support_key(&self) -> Option<String>;

    fn log_feature_usage(&self, args: &Args) -> Result<()>;

    fn log_error(&self, error: &PipelineError, args: &Args) -> Result<()>;
}

/// Used for `--no-logging` and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn configure(&self) -> Result<()> {
        Ok(())
    }

    fn support_key(&self) -> Option<String> {
        None
    }

    fn log_feature_usage(&self, _args: &Args) -> Result<()> {
        Ok(())
    }

    fn log_error(&self, _error: &PipelineError, _args: &Args) -> Result<()> {
        Ok(())
    }
}

/// Records analytics events as structured `tracing` events. There is no
/// network transport.
#[derive(Debug, Default)]
pub struct TracingAnalytics {
    support_key: OnceLock<String>,
}

impl TracingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Analytics for TracingAnalytics {
    fn configure(&self) -> Result<()> {
        if self.support_key.get().is_some() {
            return Ok(());
        }
        let key = machine_support_key()?;
        let _ = self.support_key.set(key);
        Ok(())
    }

    fn support_key(&self) -> Option<String> {
        self.support_key.get().cloned()
    }

    fn log_feature_usage(&self, args: &Args) -> Result<()> {
        let Some(key) = self.support_key.get() else {
            bail!("analytics not configured");
        };
        tracing::info!(
            target: ANALYTICS_TARGET,
            support_key = %key,
            features = ?used_features(args),
            "feature usage"
        );
        Ok(())
    }

    fn log_error(&self, error: &PipelineError, args: &Args) -> Result<()> {
        let Some(key) = self.support_key.get() else {
            bail!("analytics not configured");
        };
        tracing::info!(
            target: ANALYTICS_TARGET,
            support_key = %key,
            category = error.category(),
            exit_code = error.exit_code(),
            features = ?used_features(args),
            "generation failed"
        );
        Ok(())
    }
}

/// Hashes the user and host names so the key cannot be traced back to either.
fn machine_support_key() -> Result<String> {
    let user = std::env::var("USER").or_else(|_| std::env::var("USERNAME")).ok();
    let host = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok();
    if user.is_none() && host.is_none() {
        bail!("no user or host name available to derive a support key");
    }

    let mut hasher = Sha256::new();
    hasher.update(user.unwrap_or_default().as_bytes());
    hasher.update(b"@");
    hasher.update(host.unwrap_or_default().as_bytes());
    let digest = hasher.finalize();

    let mut key = String::with_capacity(16);
    for byte in &digest[..8] {
        write!(key, "{byte:02x}")?;
    }
    Ok(key)
}

/// Names of the options a run used, never their values.
pub fn used_features(args: &Args) -> Vec<&'static str> {
    let flags = [
        (args.settings_file.is_some(), "settings-file"),
        (args.namespace.is_some(), "namespace"),
        (args.output.is_some(), "output"),
        (args.no_auto_generated_header, "no-auto-generated-header"),
        (args.no_accept_headers, "no-accept-headers"),
        (args.interface_only, "interface-only"),
        (args.return_iapi_response, "return-iapi-response"),
        (args.use_cancellation_tokens, "use-cancellation-tokens"),
        (args.no_operation_headers, "no-operation-headers"),
        (args.use_iso_date_format, "use-iso-date-format"),
        (args.internal_type_accessibility, "internal-type-accessibility"),
        (!args.additional_namespaces.is_empty(), "additional-namespaces"),
        (args.multiple_interfaces.is_some(), "multiple-interfaces"),
        (!args.match_paths.is_empty(), "match-paths"),
        (!args.tags.is_empty(), "tags"),
        (args.no_deprecated_operations, "no-deprecated-operations"),
        (args.operation_name_template.is_some(), "operation-name-template"),
        (args.skip_validation, "skip-validation"),
    ];
    flags
        .into_iter()
        .filter_map(|(used, name)| used.then_some(name))
        .collect()
}
