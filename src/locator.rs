use std::path::{Path, PathBuf};
use url::Url;

/// Where a specification reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecLocation {
    Remote,
    Local,
}

/// Classifies a reference as a remote `http`/`https` URL or a local path.
pub fn classify(reference: &str) -> SpecLocation {
    match Url::parse(reference) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => SpecLocation::Remote,
        _ => SpecLocation::Local,
    }
}

/// Resolves a local reference against the current directory.
///
/// The path does not have to exist, which is what makes it usable in
/// "file not found" messages.
pub fn absolute_path(reference: impl AsRef<Path>) -> PathBuf {
    let path = reference.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_are_remote() {
        assert_eq!(classify("https://petstore3.swagger.io/api/v3/openapi.json"), SpecLocation::Remote);
        assert_eq!(classify("http://localhost:5000/swagger.yaml"), SpecLocation::Remote);
    }

    #[test]
    fn other_schemes_and_paths_are_local() {
        assert_eq!(classify("ftp://example.com/openapi.json"), SpecLocation::Local);
        assert_eq!(classify("file:///tmp/openapi.json"), SpecLocation::Local);
        assert_eq!(classify("./specs/openapi.json"), SpecLocation::Local);
        assert_eq!(classify("openapi.yaml"), SpecLocation::Local);
        assert_eq!(classify(r"C:\specs\openapi.json"), SpecLocation::Local);
    }

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let resolved = absolute_path("does-not-exist.json");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("does-not-exist.json"));
    }
}
