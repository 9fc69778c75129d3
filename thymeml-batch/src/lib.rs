//! Batch consistency checking of THYME-ML corpora.
//!
//! [`Discovery`] finds the annotation files of a corpus, [`BatchRunner`]
//! analyses each one with [`thymeml_closure::DocumentAnalyzer`] (in parallel
//! across documents) and collects a [`BatchReport`]. Per document it can
//! write the closed annotations back as THYME-ML (`<name>.closed.xml`) and a
//! JSON [`DocumentReport`].
//!
//! ```ignore
//! use thymeml_batch::{BatchConfig, BatchRunner};
//!
//! let config = BatchConfig::load("thymeml.toml".as_ref())?;
//! let report = BatchRunner::new(config).run()?;
//! println!("{}", report);
//! ```

mod cli;
mod config;
mod errors;
mod report;
mod runner;
mod walk;

pub use cli::Cli;
pub use config::{BatchConfig, ClosureConfig, ReportConfig};
pub use errors::{BatchError, BatchResult};
pub use report::{
    BatchReport, BatchSummary, ConflictReport, DocumentReport, LinkReport, SkippedDocument,
};
pub use runner::BatchRunner;
pub use walk::{Discovery, DocumentJob};

#[cfg(test)]
mod tests {
    mod corpus;
}
