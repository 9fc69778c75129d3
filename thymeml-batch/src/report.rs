//! Per-document and per-batch reports.
//!
//! Reports are plain data: they serialize to JSON as they are, and their
//! `Display` impls give the text report printed by `thyme-check`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thymeml::xml::Disambiguation;
use thymeml::{
    flat_spans, AnnotationId, AnnotationStore, DocumentText, Span, SpanDisplay, TemporalLink,
};
use thymeml_closure::{
    AnalysisSummary, ConflictOrigin, ConflictPair, DocumentAnalysis, Inventory, MergeReport,
    Orientation, QualityWarning,
};

use crate::config::ReportConfig;

/// One TLINK as it stands after merging and closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub id: AnnotationId,
    pub source: AnnotationId,
    #[serde(rename = "type")]
    pub link_type: String,
    pub target: AnnotationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_source: Option<AnnotationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_target: Option<AnnotationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<(AnnotationId, AnnotationId)>,
    /// Text under the annotated source, one entry per span.
    pub source_text: Vec<String>,
    pub target_text: Vec<String>,
}

impl LinkReport {
    pub fn of(link: &TemporalLink, store: &AnnotationStore, text: &DocumentText) -> Self {
        let content = |id: &AnnotationId| -> Vec<String> {
            text.annotation_content(store, id)
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        Self {
            id: link.id.clone(),
            source: link.source.clone(),
            link_type: link.link_type.label().to_string(),
            target: link.target.clone(),
            original_source: link.original_source.clone(),
            original_target: link.original_target.clone(),
            derived_from: link.derived_from.clone(),
            source_text: content(link.annotated_source()),
            target_text: content(link.annotated_target()),
        }
    }
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} {}",
            self.id, self.source, self.link_type, self.target
        )?;
        if self.original_source.is_some() || self.original_target.is_some() {
            write!(
                f,
                " (annotated {} {} {})",
                self.original_source.as_ref().unwrap_or(&self.source),
                self.link_type,
                self.original_target.as_ref().unwrap_or(&self.target)
            )?;
        }
        if let Some((first, second)) = &self.derived_from {
            write!(f, " (inferred from {} and {})", first, second)?;
        }
        write!(
            f,
            " \"{}\" -> \"{}\"",
            self.source_text.join(" | "),
            self.target_text.join(" | ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub first: LinkReport,
    pub second: LinkReport,
    pub origin: ConflictOrigin,
    pub orientation: Orientation,
    pub involves_inferred: bool,
    /// The annotated endpoints of both links, underlined in the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl ConflictReport {
    fn of(
        pair: &ConflictPair,
        store: &AnnotationStore,
        text: &DocumentText,
        options: &ReportConfig,
    ) -> Option<Self> {
        let first = store.link(&pair.first).ok()?;
        let second = store.link(&pair.second).ok()?;
        Some(Self {
            first: LinkReport::of(first, store, text),
            second: LinkReport::of(second, store, text),
            origin: pair.origin,
            orientation: pair.orientation,
            involves_inferred: pair.involves_inferred,
            excerpt: excerpt(&[first, second], store, text, options),
        })
    }
}

fn orientation_label(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Aligned => "aligned",
        Orientation::Reversed => "reversed",
    }
}

/// Underlines the first span of each link's annotated endpoints, with an
/// arrow from source to target.
fn excerpt(
    links: &[&TemporalLink],
    store: &AnnotationStore,
    text: &DocumentText,
    options: &ReportConfig,
) -> Option<String> {
    let mut arrows = Vec::new();
    for link in links {
        let source = *flat_spans(store, link.annotated_source()).first()?;
        let target = *flat_spans(store, link.annotated_target()).first()?;
        arrows.push((*link, source, target));
    }

    let spans: Vec<Span> = arrows
        .iter()
        .flat_map(|&(_, source, target)| [source, target])
        .collect();
    let mut display = SpanDisplay::around(text, &spans, options.context_words);
    if display.window_len() > options.max_excerpt_chars {
        return None;
    }

    let mut marked: Vec<Span> = Vec::new();
    for &(link, source, target) in &arrows {
        display.include_with_arrow(
            source,
            format!("{} ({})", link.annotated_source(), link.id),
            link.link_type.label(),
            target,
        );
        marked.push(source);
    }
    for &(link, _, target) in &arrows {
        if !marked.contains(&target) {
            display.include(target, link.annotated_target().to_string());
            marked.push(target);
        }
    }

    Some(display.to_string())
}

/// Everything learned about one annotation file.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub summary: AnalysisSummary,
    pub inventory: Inventory,
    pub merge: MergeReport,
    pub warnings: Vec<QualityWarning>,
    pub renamed: Vec<Disambiguation>,
    pub self_referential: Vec<LinkReport>,
    pub conflicts: Vec<ConflictReport>,
    /// All TLINKs after merging and closure, in store order.
    pub links: Vec<LinkReport>,
}

impl DocumentReport {
    pub fn new(
        document: impl Into<String>,
        analysis: &DocumentAnalysis,
        renamed: Vec<Disambiguation>,
        store: &AnnotationStore,
        text: &DocumentText,
        options: &ReportConfig,
    ) -> Self {
        Self {
            document: document.into(),
            summary: analysis.summary.clone(),
            inventory: analysis.quality.inventory.clone(),
            merge: analysis.merge.clone(),
            warnings: analysis.warnings.clone(),
            renamed,
            self_referential: analysis
                .self_referential
                .iter()
                .filter_map(|id| store.link(id).ok())
                .map(|link| LinkReport::of(link, store, text))
                .collect(),
            conflicts: analysis
                .conflicts
                .iter()
                .filter_map(|pair| ConflictReport::of(pair, store, text, options))
                .collect(),
            links: store
                .tlinks()
                .map(|link| LinkReport::of(link, store, text))
                .collect(),
        }
    }
}

fn write_counts(
    f: &mut fmt::Formatter<'_>,
    what: &str,
    total: usize,
    counts: &BTreeMap<String, usize>,
) -> fmt::Result {
    write!(f, "\n{}: {}", what, total)?;
    if !counts.is_empty() {
        let parts: Vec<String> = counts
            .iter()
            .map(|(label, count)| format!("{} {}", label, count))
            .collect();
        write!(f, " ({})", parts.join(", "))?;
    }
    Ok(())
}

impl fmt::Display for DocumentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = &self.summary;
        write!(f, "== {} ==", self.document)?;
        write_counts(
            f,
            "entities",
            self.inventory.total_entities(),
            &self.inventory.entities,
        )?;
        write_counts(
            f,
            "relations",
            self.inventory.total_relations(),
            &self.inventory.relations,
        )?;
        write!(
            f,
            "\nTLINKs: {} annotated, {} inferred",
            summary.annotated_tlinks, summary.inferred_tlinks
        )?;
        if summary.truncated {
            f.write_str(" (closure truncated)")?;
        }
        write!(
            f,
            "\ncoreference: {} of {} TLINK endpoints merged",
            self.merge.substituted, self.merge.possible
        )?;

        for warning in &self.warnings {
            write!(f, "\nwarning: {}", warning)?;
        }
        for renamed in &self.renamed {
            write!(f, "\nrenamed: {} -> {}", renamed.original, renamed.stored_as)?;
        }
        for link in &self.self_referential {
            write!(f, "\nself-referential: {}", link)?;
        }

        write!(
            f,
            "\nconflicts: {} ({} temporal closure, {} identity coreference)",
            self.conflicts.len(),
            summary.temporal_closure_conflicts,
            summary.identity_coreference_conflicts
        )?;
        for (idx, conflict) in self.conflicts.iter().enumerate() {
            write!(
                f,
                "\n  #{} {}, {}",
                idx + 1,
                conflict.origin.description(),
                orientation_label(conflict.orientation)
            )?;
            if conflict.involves_inferred {
                f.write_str(", involves inferred links")?;
            }
            write!(f, "\n    {}\n    {}", conflict.first, conflict.second)?;
            if let Some(excerpt) = &conflict.excerpt {
                for line in excerpt.lines() {
                    write!(f, "\n    {}", line)?;
                }
            }
        }
        Ok(())
    }
}

/// A document that could not be checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub document: String,
    pub error: String,
}

/// Counters folded over every checked document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub documents: usize,
    pub skipped: usize,
    pub annotated_tlinks: usize,
    pub inferred_tlinks: usize,
    pub annotated_conflicts: usize,
    pub temporal_closure_conflicts: usize,
    pub identity_coreference_conflicts: usize,
    pub self_referential: usize,
    /// Documents whose closure hit a limit.
    pub truncated: usize,
    pub warnings: usize,
}

impl BatchSummary {
    pub fn record(&mut self, report: &DocumentReport) {
        let summary = &report.summary;
        self.documents += 1;
        self.annotated_tlinks += summary.annotated_tlinks;
        self.inferred_tlinks += summary.inferred_tlinks;
        self.annotated_conflicts += summary.annotated_conflicts;
        self.temporal_closure_conflicts += summary.temporal_closure_conflicts;
        self.identity_coreference_conflicts += summary.identity_coreference_conflicts;
        self.self_referential += summary.self_referential;
        if summary.truncated {
            self.truncated += 1;
        }
        self.warnings += report.warnings.len();
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn conflicts(&self) -> usize {
        self.temporal_closure_conflicts + self.identity_coreference_conflicts
    }

    /// 0 on success, 1 when a document failed to load, 2 when
    /// `fail_on_conflict` is set and a conflict was found.
    pub fn exit_code(&self, fail_on_conflict: bool) -> u8 {
        if self.skipped > 0 {
            1
        } else if fail_on_conflict && self.conflicts() > 0 {
            2
        } else {
            0
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents checked, {} skipped",
            self.documents, self.skipped
        )?;
        write!(
            f,
            "\nTLINKs: {} annotated, {} inferred",
            self.annotated_tlinks, self.inferred_tlinks
        )?;
        write!(
            f,
            "\nconflicts: {} ({} temporal closure, {} identity coreference)",
            self.conflicts(),
            self.temporal_closure_conflicts,
            self.identity_coreference_conflicts
        )?;
        write!(f, "\nself-referential TLINKs: {}", self.self_referential)?;
        if self.truncated > 0 {
            write!(f, "\nclosure truncated in {} documents", self.truncated)?;
        }
        write!(f, "\ndata-quality warnings: {}", self.warnings)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
    pub skipped: Vec<SkippedDocument>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn push_document(&mut self, report: DocumentReport) {
        self.summary.record(&report);
        self.documents.push(report);
    }

    pub fn push_skipped(&mut self, document: impl Into<String>, error: impl fmt::Display) {
        self.summary.record_skipped();
        self.skipped.push(SkippedDocument {
            document: document.into(),
            error: error.to_string(),
        });
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for document in &self.documents {
            write!(f, "{}\n\n", document)?;
        }
        if !self.skipped.is_empty() {
            f.write_str("skipped:")?;
            for skipped in &self.skipped {
                write!(f, "\n  {}: {}", skipped.document, skipped.error)?;
            }
            f.write_str("\n\n")?;
        }
        write!(f, "{}", self.summary)
    }
}
