use std::time::Instant;

use crate::analytics::{Analytics, NoopAnalytics, TracingAnalytics};
use crate::cli::Args;
use crate::error::{PipelineError, Result};
use crate::generator::{GeneratorFactory, RefitGeneratorFactory};
use crate::output;
use crate::reporter::Reporter;
use crate::settings::{self, ValidatedInput};
use crate::validation::{OpenApiValidator, SpecValidator};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a finished run hands back to `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub exit_code: u8,
}

impl ExecutionOutcome {
    pub fn success() -> Self {
        Self { exit_code: 0 }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One generation run, from command line to exit code.
pub struct Pipeline {
    validator: Box<dyn SpecValidator>,
    generators: Box<dyn GeneratorFactory>,
    analytics: Box<dyn Analytics>,
}

impl Pipeline {
    /// Creates a pipeline from its three collaborators.
    ///
    /// # Arguments
    ///
    /// * `validator` - Checks the OpenAPI document before anything is generated.
    /// * `generators` - Builds a client generator from the resolved configuration.
    /// * `analytics` - Receives feature usage and failures. Its errors never fail a run.
    pub fn new(
        validator: Box<dyn SpecValidator>,
        generators: Box<dyn GeneratorFactory>,
        analytics: Box<dyn Analytics>,
    ) -> Self {
        Self {
            validator,
            generators,
            analytics,
        }
    }

    /// The structural validator, the Refit generator, and tracing analytics
    /// unless `--no-logging` was given.
    pub fn with_defaults(args: &Args) -> Self {
        let analytics: Box<dyn Analytics> = if args.no_logging {
            Box::new(NoopAnalytics)
        } else {
            Box::new(TracingAnalytics::new())
        };
        Self::new(Box::new(OpenApiValidator), Box::new(RefitGeneratorFactory), analytics)
    }

    /// Runs a full generation for `args`, reporting progress through `reporter`.
    ///
    /// The command line is validated first. A rejected command line prints a
    /// single error line and stops there. Otherwise the document is validated
    /// (unless `--skip-validation` is set), the settings are resolved again,
    /// and the generated client is written to disk. Any failure after the
    /// command line was accepted is reported and sent to analytics.
    ///
    /// # Arguments
    ///
    /// * `args` - The parsed command line.
    /// * `reporter` - Where status lines, diagnostics, and failures are printed.
    ///
    /// # Returns
    ///
    /// * `ExecutionOutcome` - Exit code 0 on success, otherwise the failure's exit code.
    pub async fn run(&self, args: &Args, reporter: &mut Reporter) -> ExecutionOutcome {
        let started = Instant::now();

        let input = match settings::validate(args, self.analytics.as_ref()) {
            Ok(input) => input,
            Err(err @ PipelineError::Usage(_)) => {
                tracing::debug!(error = %err, "command line rejected");
                reporter.usage_error(&err.to_string());
                return ExecutionOutcome {
                    exit_code: err.exit_code(),
                };
            }
            Err(err) => return self.fail(err, args, reporter),
        };

        match self.execute(args, &input, started, reporter).await {
            Ok(()) => ExecutionOutcome::success(),
            Err(err) => self.fail(err, args, reporter),
        }
    }

    async fn execute(
        &self,
        args: &Args,
        input: &ValidatedInput,
        started: Instant,
        reporter: &mut Reporter,
    ) -> Result<()> {
        reporter.banner(VERSION)?;
        reporter.support_key(self.analytics.support_key().as_deref())?;

        if args.skip_validation {
            tracing::debug!("skipping OpenAPI validation");
        } else {
            self.validate_specification(&input.reference, reporter).await?;
        }

        let config = settings::resolve_for_execution(args, &input.reference)?;
        tracing::debug!(reference = %config.open_api_path, namespace = %config.namespace, "generating client");
        let generator = self.generators.create(&config).await?;
        let code = generator.generate()?;

        let output_path = settings::resolve_output_path(args)?;
        let written = output::write_output(&code, &output_path, reporter).await?;
        tracing::info!(path = %written.display(), "client written");

        if let Err(err) = self.analytics.log_feature_usage(args) {
            tracing::debug!(error = %err, "feature usage not recorded");
        }

        reporter.duration(started.elapsed())?;
        Ok(())
    }

    async fn validate_specification(&self, reference: &str, reporter: &mut Reporter) -> Result<()> {
        reporter.line(format_args!("Validating {reference}"))?;
        let outcome = self.validator.validate(reference).await?;

        if !outcome.valid {
            for diagnostic in outcome.errors().chain(outcome.warnings()) {
                if let Err(err) = reporter.diagnostic(diagnostic) {
                    tracing::debug!(error = %err, "failed to report diagnostic");
                }
            }
            return Err(PipelineError::SpecificationInvalid {
                errors: outcome.errors().count(),
            });
        }

        for warning in outcome.warnings() {
            if let Err(err) = reporter.diagnostic(warning) {
                tracing::debug!(error = %err, "failed to report diagnostic");
            }
        }
        reporter.statistics(&outcome.statistics)?;
        Ok(())
    }

    fn fail(&self, err: PipelineError, args: &Args, reporter: &mut Reporter) -> ExecutionOutcome {
        tracing::debug!(category = err.category(), error = %err, "generation failed");
        reporter.failure(&err);
        if let Err(analytics_err) = self.analytics.log_error(&err, args) {
            tracing::debug!(error = %analytics_err, "failure not recorded");
        }
        ExecutionOutcome {
            exit_code: err.exit_code(),
        }
    }
}
