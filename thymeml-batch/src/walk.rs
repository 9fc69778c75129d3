//! Discovery of THYME-ML documents in a directory tree.
//!
//! A document directory is a leaf directory holding at least one annotation
//! file. Its text file carries the directory's name and sits at the same
//! relative path under the text root:
//!
//! ```text
//! xml_dir/ID001_clinic_001/ID001_clinic_001.Thyme2v1.gold.xml
//! text_dir/ID001_clinic_001/ID001_clinic_001
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::BatchConfig;
use crate::errors::{BatchError, BatchResult};

/// One annotation file and the text it annotates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    /// Document name, the name of its directory.
    pub name: String,
    /// Directory relative to the XML root.
    pub sub_dir: PathBuf,
    pub xml_path: PathBuf,
    pub text_path: PathBuf,
}

impl DocumentJob {
    /// Annotation file name without its `.xml` extension.
    pub fn stem(&self) -> String {
        let file_name = self
            .xml_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        match file_name.strip_suffix(".xml") {
            Some(stem) => stem.to_string(),
            None => file_name,
        }
    }

    /// `sub_dir/file name`, for logs and reports.
    pub fn label(&self) -> String {
        let file_name = self
            .xml_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.sub_dir.join(file_name).display().to_string()
    }
}

pub struct Discovery {
    xml_name: Regex,
    skip: Option<Regex>,
}

impl Discovery {
    pub fn new(xml_name: Regex, skip: Option<Regex>) -> Self {
        Self { xml_name, skip }
    }

    pub fn from_config(config: &BatchConfig) -> BatchResult<Self> {
        Ok(Self::new(config.xml_name_regex()?, config.skip_regex()?))
    }

    /// All documents under `xml_root`, in path order.
    pub fn discover(&self, xml_root: &Path, text_root: &Path) -> BatchResult<Vec<DocumentJob>> {
        if !xml_root.is_dir() {
            return Err(BatchError::Load {
                path: xml_root.display().to_string(),
                message: "not a directory".to_string(),
            });
        }

        let mut jobs = Vec::new();
        self.visit(xml_root, xml_root, text_root, &mut jobs)?;
        log::info!("found {} annotation files under {}", jobs.len(), xml_root.display());
        Ok(jobs)
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.skip.as_ref().map_or(false, |skip| skip.is_match(name))
    }

    fn visit(
        &self,
        root: &Path,
        dir: &Path,
        text_root: &Path,
        jobs: &mut Vec<DocumentJob>,
    ) -> BatchResult<()> {
        let load_error = |e: std::io::Error| BatchError::Load {
            path: dir.display().to_string(),
            message: e.to_string(),
        };

        let mut sub_dirs = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(load_error)? {
            let path = entry.map_err(load_error)?.path();
            if path.is_dir() {
                sub_dirs.push(path);
            } else {
                files.push(path);
            }
        }
        sub_dirs.sort();
        files.sort();

        if !sub_dirs.is_empty() {
            for sub_dir in sub_dirs {
                let name = file_name(&sub_dir);
                if self.is_skipped(&name) {
                    log::debug!("skipping {}", sub_dir.display());
                    continue;
                }
                self.visit(root, &sub_dir, text_root, jobs)?;
            }
            return Ok(());
        }

        let name = file_name(dir);
        let sub_dir = dir.strip_prefix(root).unwrap_or(Path::new("")).to_path_buf();
        let text_path = text_root.join(&sub_dir).join(&name);
        for xml_path in files {
            if self.xml_name.is_match(&file_name(&xml_path)) {
                jobs.push(DocumentJob {
                    name: name.clone(),
                    sub_dir: sub_dir.clone(),
                    xml_path,
                    text_path: text_path.clone(),
                });
            }
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
