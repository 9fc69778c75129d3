//! Temporal-relation consistency engine for THYME-ML documents.
//!
//! Given the annotations of one document in an [`AnnotationStore`], this crate
//!
//! - folds coreferent mentions into their chains ([`CoreferenceMerger`]),
//! - lists TLINKs that became self-referential by that folding,
//! - computes the transitive closure of the TLINKs under a restricted Allen
//!   interval algebra ([`TemporalClosureEngine`]),
//! - finds pairs of TLINKs that contradict each other ([`ConflictDetector`]),
//! - checks the corpus-quality invariants of the annotations ([`QualityChecker`]).
//!
//! [`DocumentAnalyzer`] runs all of it in order.
//!
//! ## Example
//!
//! ```ignore
//! use thymeml::xml::load_annotations;
//! use thymeml_closure::DocumentAnalyzer;
//!
//! let mut store = load_annotations(&xml, "ID001_clinic_001")?.store;
//! let analysis = DocumentAnalyzer::new().analyze(&mut store)?;
//! println!("{} conflicts", analysis.conflicts.len());
//! ```
//!
//! [`AnnotationStore`]: thymeml::AnnotationStore

mod allen;
mod analysis;
mod closure;
mod conflict_detector;
mod merger;
mod quality;

pub use allen::Resolved;
pub use analysis::{AnalysisSummary, DocumentAnalysis, DocumentAnalyzer};
pub use closure::{ClosureLimits, ClosureOutcome, LinkTriple, TemporalClosureEngine};
pub use conflict_detector::{
    count_by_origin, ConflictDetector, ConflictOrigin, ConflictPair, Orientation,
};
pub use merger::{ChainOverlap, CoreferenceMerger, MergeReport};
pub use quality::{ChainIndependence, Inventory, QualityChecker, QualityReport, QualityWarning};

#[cfg(test)]
mod tests {
    mod analysis;
    mod closure_properties;
}
