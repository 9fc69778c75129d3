//! Command-line arguments of `thyme-check`.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::config::BatchConfig;

/// Check THYME-ML temporal annotations for contradictions
#[derive(Parser, Debug)]
#[command(name = "thyme-check", author, version, about)]
pub struct Cli {
    /// Directory of THYME-ML document directories
    #[arg(value_name = "XML_DIR")]
    pub xml_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", default_value = "thymeml.toml")]
    pub config: PathBuf,

    /// Directory of text files, laid out like XML_DIR
    #[arg(long, value_name = "DIR")]
    pub text_dir: Option<PathBuf>,

    /// Write closed documents and JSON reports here
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Include document directories matching the skip pattern
    #[arg(long)]
    pub no_skip: bool,

    /// Maximum closure passes per document
    #[arg(long, value_name = "N")]
    pub max_passes: Option<usize>,

    /// Maximum inferred links per document
    #[arg(long, value_name = "N")]
    pub max_links: Option<usize>,

    /// Print the batch report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Exit with status 2 when any conflict is found
    #[arg(long)]
    pub fail_on_conflict: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut BatchConfig) {
        if let Some(xml_dir) = &self.xml_dir {
            config.xml_dir = xml_dir.clone();
        }
        if let Some(text_dir) = &self.text_dir {
            config.text_dir = Some(text_dir.clone());
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
        if self.no_skip {
            config.skip_pattern.clear();
        }
        if let Some(max_passes) = self.max_passes {
            config.closure.max_passes = max_passes;
        }
        if let Some(max_links) = self.max_links {
            config.closure.max_links = max_links;
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "thyme-check",
            "corpus/xml",
            "--text-dir",
            "corpus/text",
            "--no-skip",
            "--max-links",
            "10",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert_eq!(cli.config, PathBuf::from("thymeml.toml"));

        let mut config = BatchConfig {
            output_dir: Some(PathBuf::from("out")),
            ..BatchConfig::default()
        };
        cli.apply(&mut config);
        assert_eq!(config.xml_dir, PathBuf::from("corpus/xml"));
        assert_eq!(config.text_dir, Some(PathBuf::from("corpus/text")));
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert!(config.skip_pattern.is_empty());
        assert_eq!(config.closure.max_links, 10);
        assert_eq!(config.closure.max_passes, 64);
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let cli = Cli::try_parse_from(["thyme-check"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Warn);

        let mut config = BatchConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, BatchConfig::default());
    }
}
