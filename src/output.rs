use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::locator;
use crate::reporter::Reporter;

pub const DEFAULT_OUTPUT_FILE: &str = "Output.cs";

/// Rewrites `\r\n` and lone `\r` line endings as `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Falls back to [`DEFAULT_OUTPUT_FILE`] in the current directory.
pub fn resolve_output_file(output_path: &Path) -> PathBuf {
    if output_path.as_os_str().is_empty() {
        locator::absolute_path(DEFAULT_OUTPUT_FILE)
    } else {
        locator::absolute_path(output_path)
    }
}

/// Writes generated code, replacing any existing file.
///
/// Line endings are normalized to `\n` and missing parent directories are
/// created. The reporter gets an `Output:` line with the path and byte count.
///
/// # Arguments
///
/// * `code` - The generated source.
/// * `output_path` - Target file. An empty path means `Output.cs` in the working directory.
/// * `reporter` - Receives the `Output:` line.
///
/// # Returns
///
/// * `Result<PathBuf>` - The absolute path that was written.
pub async fn write_output(code: &str, output_path: &Path, reporter: &mut Reporter) -> Result<PathBuf> {
    let code = normalize_line_endings(code);
    let path = resolve_output_file(output_path);

    if let Some(directory) = path.parent() {
        if !directory.exists() {
            tracing::debug!(directory = %directory.display(), "creating output directory");
            tokio::fs::create_dir_all(directory).await?;
        }
    }

    reporter.output(&path, code.len())?;
    tokio::fs::write(&path, code.as_bytes()).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn normalizes_mixed_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn empty_output_path_uses_default_file() {
        let path = resolve_output_file(Path::new(""));
        assert!(path.is_absolute());
        assert!(path.ends_with(DEFAULT_OUTPUT_FILE));
    }

    #[tokio::test]
    async fn creates_directories_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("deeper").join("Client.cs");
        let mut reporter = Reporter::buffered();

        write_output("old", &target, &mut reporter).await.unwrap();
        let written = write_output("line1\r\nline2\r\n", &target, &mut reporter).await.unwrap();

        assert_eq!(written, target);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "line1\nline2\n");
        let report = reporter.captured();
        assert!(report.contains(&format!("Output: {} (12 bytes)", target.display())));
    }
}
