use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use oas2cs::{Args, Pipeline, Reporter};

/// Logs go to stderr so the status lines on stdout stay readable.
fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "oas2cs=info",
        2 => "oas2cs=debug",
        _ => "oas2cs=trace",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_file(verbose >= 3)
                .with_line_number(verbose >= 3)
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let arguments = Args::parse();

    if let Err(err) = init_tracing(arguments.verbose) {
        eprintln!("Failed to initialize logging: {err}");
    }

    let pipeline = Pipeline::with_defaults(&arguments);
    let mut reporter = Reporter::stdout();
    let outcome = pipeline.run(&arguments, &mut reporter).await;

    ExitCode::from(outcome.exit_code)
}
