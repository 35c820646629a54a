use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{FailureKind, PipelineError};
use crate::validation::{Diagnostic, OpenApiStats};

enum Sink {
    Stdout(io::Stdout),
    Buffer(Vec<u8>),
    Writer(Box<dyn Write + Send>),
}

/// User-facing status lines for a single run.
pub struct Reporter {
    sink: Sink,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Reporter {
    /// Prints to standard output.
    pub fn stdout() -> Self {
        Self {
            sink: Sink::Stdout(io::stdout()),
        }
    }

    /// Keeps every line in memory, see [`Reporter::captured`].
    pub fn buffered() -> Self {
        Self {
            sink: Sink::Buffer(Vec::new()),
        }
    }

    /// Prints to any writer, such as a log file or a pipe.
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Sink::Writer(writer),
        }
    }

    /// Everything written so far by a buffered reporter.
    pub fn captured(&self) -> String {
        match &self.sink {
            Sink::Buffer(buffer) => String::from_utf8_lossy(buffer).into_owned(),
            _ => String::new(),
        }
    }

    /// Writes one line of text followed by a newline.
    ///
    /// Every other reporting method goes through this one.
    ///
    /// # Arguments
    ///
    /// * `text` - Anything printable. Pass `format_args!` to avoid an allocation.
    ///
    /// # Returns
    ///
    /// * `io::Result<()>` - The error from the underlying sink, if writing failed.
    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        match &mut self.sink {
            Sink::Stdout(out) => writeln!(out.lock(), "{text}"),
            Sink::Buffer(buffer) => writeln!(buffer, "{text}"),
            Sink::Writer(writer) => writeln!(writer, "{text}"),
        }
    }

    /// Writes the `oas2cs v<version>` line that opens every accepted run.
    ///
    /// # Arguments
    ///
    /// * `version` - The tool version, normally [`crate::pipeline::VERSION`].
    pub fn banner(&mut self, version: &str) -> io::Result<()> {
        self.line(format_args!("oas2cs v{version}"))
    }

    pub fn support_key(&mut self, key: Option<&str>) -> io::Result<()> {
        self.line(format_args!("Support key: {}", key.unwrap_or("unavailable")))
    }

    /// Writes one validation error or warning as `<Kind>: <message> (<location>)`.
    pub fn diagnostic(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        self.line(diagnostic)
    }

    /// Writes the document statistics, one indented `  - ` line per counter.
    pub fn statistics(&mut self, stats: &OpenApiStats) -> io::Result<()> {
        self.line("OpenAPI statistics:")?;
        for line in stats.to_string().lines() {
            self.line(format_args!("  - {line}"))?;
        }
        Ok(())
    }

    pub fn output(&mut self, path: &Path, bytes: usize) -> io::Result<()> {
        self.line(format_args!("Output: {} ({bytes} bytes)", path.display()))
    }

    pub fn duration(&mut self, elapsed: Duration) -> io::Result<()> {
        self.line(format_args!("Duration: {}", format_duration(elapsed)))
    }

    /// A rejected command line, printed without any failure detail.
    pub fn usage_error(&mut self, message: &str) {
        let _ = self.line(format_args!("Error: {message}"));
    }

    /// Reports a failure caught by the pipeline.
    ///
    /// Specification-invalid failures print nothing generic; their
    /// diagnostics were reported when they were found.
    pub fn failure(&mut self, error: &PipelineError) {
        if error.kind() == FailureKind::SpecificationInvalid {
            let _ = self.line("OpenAPI specification validation failed");
            return;
        }

        let _ = self.line(format_args!("Exception: {error}"));
        let _ = self.line(format_args!("Type: {}", error.category()));
        let _ = self.line("Stack Trace:");
        let trace = error.trace();
        if trace.is_empty() {
            let _ = self.line(format_args!("   at {error:?}"));
        }
        for cause in trace {
            let _ = self.line(format_args!("   at {cause}"));
        }
    }
}

/// `HH:MM:SS.mmm`
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        elapsed.subsec_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_millis(1_234)), "00:00:01.234");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05.000");
    }

    #[test]
    fn unexpected_failures_print_message_type_and_trace() {
        let mut reporter = Reporter::buffered();
        reporter.failure(&PipelineError::OpenApiFileRead {
            path: "spec.json".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        });
        let report = reporter.captured();
        assert!(report.contains("Exception: Failed to read OpenAPI file: spec.json"));
        assert!(report.contains("Type: DocumentReadError"));
        assert!(report.contains("Stack Trace:\n   at permission denied"));
    }

    #[test]
    fn specification_invalid_prints_no_generic_detail() {
        let mut reporter = Reporter::buffered();
        reporter.failure(&PipelineError::SpecificationInvalid { errors: 1 });
        let report = reporter.captured();
        assert!(!report.contains("Exception:"));
        assert!(!report.contains("Stack Trace:"));
    }

    #[test]
    fn missing_support_key_reads_unavailable() {
        let mut reporter = Reporter::buffered();
        reporter.support_key(None).unwrap();
        reporter.support_key(Some("abc123")).unwrap();
        assert_eq!(reporter.captured(), "Support key: unavailable\nSupport key: abc123\n");
    }
}
