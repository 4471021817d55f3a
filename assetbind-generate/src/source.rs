//! Locating the ABI or artifact JSON a binding is generated from.
//!
//! Parsing is left to [`assetbind_common::artifact`]; a source only produces
//! the JSON text.
//!
//! # Examples
//!
//! ```no_run
//! # use assetbind_generate::Source;
//! let json = Source::local("abi/Equity.json")
//!     .artifact_json()
//!     .expect("failed to load an artifact");
//! ```

use anyhow::{anyhow, Context, Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// A source of an artifact JSON or a bare ABI JSON array.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// File on the local file system.
    Local(PathBuf),

    /// Resource available via HTTP(S).
    Http(Url),
}

impl Source {
    /// Parses a source from a string, resolving relative paths against the
    /// current working directory.
    ///
    /// Accepted are relative and absolute paths, `file://` URLs and HTTP(S)
    /// URLs. Use [`Source::with_root`] to resolve relative paths against
    /// another directory, for example the crate manifest directory.
    pub fn parse(source: &str) -> Result<Self> {
        let root = env::current_dir()?.canonicalize()?;
        Source::with_root(root, source)
    }

    /// Parses a source from a string and resolves relative paths against
    /// `root`.
    pub fn with_root(root: impl AsRef<Path>, source: &str) -> Result<Self> {
        let root = root.as_ref();
        let base = Url::from_directory_path(root)
            .map_err(|_| anyhow!("root path '{}' is not absolute", root.display()))?;
        let url = base.join(source)?;

        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| anyhow!("file URL '{}' is not a valid path", url))?;
                Ok(Source::Local(path))
            }
            "http" | "https" => Ok(Source::Http(url)),
            _ => Err(anyhow!("unsupported URL '{}'", url)),
        }
    }

    /// Creates a local filesystem source from a path.
    pub fn local(path: impl AsRef<Path>) -> Self {
        Source::Local(path.as_ref().into())
    }

    /// Creates an HTTP source from a URL.
    pub fn http(url: &str) -> Result<Self> {
        Ok(Source::Http(Url::parse(url)?))
    }

    /// Retrieves the JSON text of the source, either from the file system or
    /// from the network.
    pub fn artifact_json(&self) -> Result<String> {
        match self {
            Source::Local(path) => get_local_contract(path),
            Source::Http(url) => get_http_contract(url),
        }
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Source::parse(s)
    }
}

fn get_local_contract(path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "reading contract JSON");
    fs::read_to_string(path)
        .with_context(|| format!("failed to read artifact JSON file {}", path.display()))
}

fn get_http_contract(url: &Url) -> Result<String> {
    tracing::debug!(%url, "fetching contract JSON");
    crate::util::http_get(url.as_str())
        .with_context(|| format!("failed to retrieve JSON from {}", url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source() {
        let root = "/rooted";
        for (source, expected) in &[
            (
                "relative/Equity.json",
                Source::local("/rooted/relative/Equity.json"),
            ),
            ("/absolute/Equity.json", Source::local("/absolute/Equity.json")),
            ("file:///abi/Equity.json", Source::local("/abi/Equity.json")),
            (
                "https://assets.example/abi/Equity.json",
                Source::http("https://assets.example/abi/Equity.json").unwrap(),
            ),
        ] {
            assert_eq!(Source::with_root(root, source).unwrap(), *expected);
        }
    }

    #[test]
    fn rejects_unknown_schemes() {
        assert!(Source::with_root("/rooted", "npm:@scope/package/Equity.json").is_err());
        assert!(Source::with_root("relative", "Equity.json").is_err());
    }

    #[test]
    fn reads_local_files() {
        let path = env::temp_dir().join("assetbind-generate-source-test.json");
        fs::write(&path, "[]").unwrap();
        assert_eq!(Source::local(&path).artifact_json().unwrap(), "[]");
        fs::remove_file(&path).unwrap();

        assert!(Source::local("/does/not/exist.json").artifact_json().is_err());
    }
}
