//! Runs the analysis over every discovered document.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thymeml::xml::{load_annotations, write_annotations, LoadedAnnotations};
use thymeml::{AnnotationStore, DocumentText};
use thymeml_closure::DocumentAnalyzer;

use crate::config::BatchConfig;
use crate::errors::{BatchError, BatchResult};
use crate::report::{BatchReport, DocumentReport};
use crate::walk::{Discovery, DocumentJob};

pub struct BatchRunner {
    config: BatchConfig,
    analyzer: DocumentAnalyzer,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Self {
        let analyzer = DocumentAnalyzer::with_limits(config.closure_limits());
        Self { config, analyzer }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Discover and check every document under the configured roots.
    ///
    /// Only discovery failures and the batch summary write are fatal; a
    /// document that fails is listed in the report's `skipped`.
    pub fn run(&self) -> BatchResult<BatchReport> {
        let discovery = Discovery::from_config(&self.config)?;
        let jobs = discovery.discover(&self.config.xml_dir, self.config.text_dir())?;
        let report = self.run_jobs(&jobs);

        if let Some(output_dir) = &self.config.output_dir {
            if self.config.write_json {
                write_json(&output_dir.join("summary.json"), &report.summary)?;
            }
        }
        Ok(report)
    }

    /// Check documents in parallel. Results keep the order of `jobs`.
    pub fn run_jobs(&self, jobs: &[DocumentJob]) -> BatchReport {
        let results: Vec<BatchResult<DocumentReport>> =
            jobs.par_iter().map(|job| self.process(job)).collect();

        let mut report = BatchReport::default();
        for (job, result) in jobs.iter().zip(results) {
            match result {
                Ok(document) => report.push_document(document),
                Err(e) => {
                    log::error!("skipping {}: {}", job.label(), e);
                    report.push_skipped(job.label(), e);
                }
            }
        }
        log::info!(
            "checked {} documents, skipped {}",
            report.summary.documents,
            report.summary.skipped
        );
        report
    }

    /// Load, analyse and report one document, writing its outputs.
    pub fn process(&self, job: &DocumentJob) -> BatchResult<DocumentReport> {
        let text = read(&job.text_path)?;
        let xml = read(&job.xml_path)?;

        let LoadedAnnotations { mut store, renamed } = load_annotations(&xml, &job.name)
            .map_err(|source| BatchError::Format {
                path: job.xml_path.display().to_string(),
                source,
            })?;
        let analysis = self
            .analyzer
            .analyze(&mut store)
            .map_err(|source| BatchError::Store {
                document: job.label(),
                source,
            })?;

        let text = DocumentText::new(text);
        let report = DocumentReport::new(
            job.label(),
            &analysis,
            renamed,
            &store,
            &text,
            &self.config.report,
        );
        self.write_outputs(job, &store, &report)?;
        Ok(report)
    }

    /// Paths of the closed XML and JSON report for `job`, if an output
    /// directory is configured.
    pub fn output_paths(&self, job: &DocumentJob) -> Option<(PathBuf, PathBuf)> {
        let dir = self.config.output_dir.as_ref()?.join(&job.sub_dir);
        let stem = job.stem();
        Some((
            dir.join(format!("{}.closed.xml", stem)),
            dir.join(format!("{}.json", stem)),
        ))
    }

    fn write_outputs(
        &self,
        job: &DocumentJob,
        store: &AnnotationStore,
        report: &DocumentReport,
    ) -> BatchResult<()> {
        let (xml_path, json_path) = match self.output_paths(job) {
            Some(paths) => paths,
            None => return Ok(()),
        };

        if self.config.write_closed_xml {
            write(&xml_path, &write_annotations(store))?;
        }
        if self.config.write_json {
            write_json(&json_path, report)?;
        }
        Ok(())
    }
}

fn read(path: &Path) -> BatchResult<String> {
    fs::read_to_string(path).map_err(|e| BatchError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn write(path: &Path, content: &str) -> BatchResult<()> {
    let output_error = |message: String| BatchError::Output {
        path: path.display().to_string(),
        message,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| output_error(e.to_string()))?;
    }
    fs::write(path, content).map_err(|e| output_error(e.to_string()))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> BatchResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| BatchError::Output {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    write(path, &json)
}
