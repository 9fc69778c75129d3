//! The per-document analysis pipeline.
//!
//! Runs the stages in dependency order over one [`AnnotationStore`]:
//!
//! 1. quality checks on the annotations as loaded,
//! 2. coreference merging,
//! 3. self-reference detection and conflict detection on the merged links,
//! 4. temporal closure,
//! 5. conflict detection on the closed link set.
//!
//! The store is extended in place with the inferred links; everything else is
//! returned as a [`DocumentAnalysis`].

use serde::Serialize;
use thymeml::{AnnotationId, AnnotationStore, StoreError};

use crate::closure::{ClosureLimits, ClosureOutcome, TemporalClosureEngine};
use crate::conflict_detector::{count_by_origin, ConflictDetector, ConflictPair};
use crate::merger::{CoreferenceMerger, MergeReport};
use crate::quality::{QualityChecker, QualityReport, QualityWarning};

/// Headline counters of one analysed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub annotated_tlinks: usize,
    pub inferred_tlinks: usize,
    pub annotated_conflicts: usize,
    pub temporal_closure_conflicts: usize,
    pub identity_coreference_conflicts: usize,
    pub self_referential: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentAnalysis {
    pub document: String,
    pub quality: QualityReport,
    pub merge: MergeReport,
    pub self_referential: Vec<AnnotationId>,
    /// Conflicts among the merged links before closure.
    pub annotated_conflicts: Vec<ConflictPair>,
    pub closure: ClosureOutcome,
    /// Conflicts among all links after closure.
    pub conflicts: Vec<ConflictPair>,
    /// Quality warnings plus chain overlaps found while merging.
    pub warnings: Vec<QualityWarning>,
    pub summary: AnalysisSummary,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentAnalyzer {
    checker: QualityChecker,
    merger: CoreferenceMerger,
    engine: TemporalClosureEngine,
    detector: ConflictDetector,
}

impl DocumentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ClosureLimits) -> Self {
        Self {
            engine: TemporalClosureEngine::with_limits(limits),
            ..Self::default()
        }
    }

    pub fn analyze(&self, store: &mut AnnotationStore) -> Result<DocumentAnalysis, StoreError> {
        let quality = self.checker.check(store);
        let annotated_tlinks = store.tlinks().count();

        let merge = self.merger.merge(store)?;
        let self_referential = self.detector.self_referential(store);
        if !self_referential.is_empty() {
            log::warn!(
                "{}: {} self-referential TLINKs after merging",
                store.document_name(),
                self_referential.len()
            );
        }
        let annotated_conflicts = self.detector.detect(store);

        let closure = self.engine.close(store)?;
        let conflicts = self.detector.detect(store);
        let (temporal_closure_conflicts, identity_coreference_conflicts) =
            count_by_origin(&conflicts);

        let mut warnings = quality.warnings.clone();
        warnings.extend(
            merge
                .overlapping
                .iter()
                .cloned()
                .map(QualityWarning::ChainOverlap),
        );

        let summary = AnalysisSummary {
            annotated_tlinks,
            inferred_tlinks: closure.inferred.len(),
            annotated_conflicts: annotated_conflicts.len(),
            temporal_closure_conflicts,
            identity_coreference_conflicts,
            self_referential: self_referential.len(),
            truncated: closure.truncated,
        };
        log::info!(
            "{}: {} conflicts ({} temporal closure, {} identity coreference), {} self-referential",
            store.document_name(),
            conflicts.len(),
            temporal_closure_conflicts,
            identity_coreference_conflicts,
            self_referential.len()
        );

        Ok(DocumentAnalysis {
            document: store.document_name().to_string(),
            quality,
            merge,
            self_referential,
            annotated_conflicts,
            closure,
            conflicts,
            warnings,
            summary,
        })
    }
}
