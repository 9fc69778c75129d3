//! Batch configuration, read from a TOML file.
//!
//! ```toml
//! xml_dir = "corpus/thyme2merged"
//! text_dir = "corpus/text"
//! output_dir = "out"
//! skip_pattern = "_path_"
//!
//! [closure]
//! max_passes = 64
//! max_links = 100000
//!
//! [report]
//! context_words = 3
//! ```
//!
//! Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thymeml_closure::ClosureLimits;

use crate::errors::{BatchError, BatchResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Root of the THYME-ML directory tree.
    pub xml_dir: PathBuf,
    /// Root of the text tree, laid out like `xml_dir`. Defaults to `xml_dir`.
    pub text_dir: Option<PathBuf>,
    /// Where closed documents and JSON reports go. Nothing is written when unset.
    pub output_dir: Option<PathBuf>,
    /// Annotation files to pick up in a document directory.
    pub xml_name_pattern: String,
    /// Document directories to leave out. Empty disables skipping.
    pub skip_pattern: String,
    pub write_closed_xml: bool,
    pub write_json: bool,
    pub closure: ClosureConfig,
    pub report: ReportConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            xml_dir: PathBuf::from("."),
            text_dir: None,
            output_dir: None,
            xml_name_pattern: "[.]xml$".to_string(),
            skip_pattern: "_path_".to_string(),
            write_closed_xml: true,
            write_json: true,
            closure: ClosureConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureConfig {
    pub max_passes: usize,
    pub max_links: usize,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        let limits = ClosureLimits::default();
        Self {
            max_passes: limits.max_passes,
            max_links: limits.max_links,
        }
    }
}

impl From<ClosureConfig> for ClosureLimits {
    fn from(config: ClosureConfig) -> Self {
        ClosureLimits {
            max_passes: config.max_passes,
            max_links: config.max_links,
        }
    }
}

/// Options for the conflict excerpts in text reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Words of context on each side of the underlined spans.
    pub context_words: usize,
    /// Excerpts wider than this many characters are left out.
    pub max_excerpt_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            context_words: 3,
            max_excerpt_chars: 240,
        }
    }
}

impl BatchConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> BatchResult<Self> {
        if !path.exists() {
            log::debug!("no configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BatchError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            BatchError::Config { message, .. } => BatchError::Config {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> BatchResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| BatchError::Config {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.xml_name_regex()?;
        config.skip_regex()?;
        Ok(config)
    }

    pub fn text_dir(&self) -> &Path {
        self.text_dir.as_deref().unwrap_or(&self.xml_dir)
    }

    pub fn closure_limits(&self) -> ClosureLimits {
        self.closure.into()
    }

    pub fn xml_name_regex(&self) -> BatchResult<Regex> {
        Regex::new(&self.xml_name_pattern).map_err(|source| BatchError::Pattern {
            key: "xml_name_pattern",
            source,
        })
    }

    pub fn skip_regex(&self) -> BatchResult<Option<Regex>> {
        if self.skip_pattern.is_empty() {
            return Ok(None);
        }
        Regex::new(&self.skip_pattern)
            .map(Some)
            .map_err(|source| BatchError::Pattern {
                key: "skip_pattern",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = BatchConfig::load(Path::new("/nonexistent/thymeml.toml")).unwrap();
        assert_eq!(config, BatchConfig::default());
        assert_eq!(config.text_dir(), Path::new("."));
        assert_eq!(config.closure_limits(), ClosureLimits::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
xml_dir = "corpus/xml"
text_dir = "corpus/text"
write_json = false

[closure]
max_links = 500
"#
        )
        .unwrap();

        let config = BatchConfig::load(file.path()).unwrap();
        assert_eq!(config.xml_dir, PathBuf::from("corpus/xml"));
        assert_eq!(config.text_dir(), Path::new("corpus/text"));
        assert!(!config.write_json);
        assert!(config.write_closed_xml);
        assert_eq!(config.skip_pattern, "_path_");
        assert_eq!(
            config.closure_limits(),
            ClosureLimits {
                max_passes: 64,
                max_links: 500
            }
        );
        assert_eq!(config.report, ReportConfig::default());
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "xml_dir = [").unwrap();

        let err = BatchConfig::load(file.path()).unwrap_err();
        match err {
            BatchError::Config { path, .. } => assert_eq!(path, file.path().display().to_string()),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_pattern() {
        let err = BatchConfig::from_toml(r#"xml_name_pattern = "([""#).unwrap_err();
        assert!(matches!(
            err,
            BatchError::Pattern {
                key: "xml_name_pattern",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_skip_pattern_disables_skipping() {
        let config = BatchConfig::from_toml(r#"skip_pattern = """#).unwrap();
        assert!(config.skip_regex().unwrap().is_none());
        assert!(BatchConfig::default().skip_regex().unwrap().is_some());
    }
}
