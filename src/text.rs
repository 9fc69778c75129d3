//! Span-to-text lookup over a document's raw text.
//!
//! THYME offsets count characters, not bytes. `DocumentText` keeps the byte
//! position of every character so spans can be sliced directly. Slicing
//! clamps out-of-range offsets instead of failing, so a span running past the
//! end of a truncated text file yields what is there.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::annotation::{Annotation, AnnotationId, Span};
use crate::store::AnnotationStore;

#[derive(Debug, Clone)]
pub struct DocumentText {
    text: String,
    /// Byte offset of each character, followed by `text.len()`.
    char_bytes: Vec<usize>,
    /// Character ranges of the non-whitespace word segments, in order.
    words: Vec<Span>,
}

impl DocumentText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut char_bytes: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
        char_bytes.push(text.len());

        let mut words = Vec::new();
        let mut char_pos = 0;
        for segment in text.split_word_bounds() {
            let len = segment.chars().count();
            if !segment.trim().is_empty() {
                words.push(Span::new(char_pos, char_pos + len));
            }
            char_pos += len;
        }

        Self {
            text,
            char_bytes,
            words,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.char_bytes.len() - 1
    }

    /// Text covered by `span`, with both offsets clamped to the document.
    pub fn slice(&self, span: Span) -> &str {
        let end = span.end.min(self.char_len());
        let start = span.start.min(end);
        &self.text[self.char_bytes[start]..self.char_bytes[end]]
    }

    /// One string per span, in span order.
    pub fn spans_content(&self, spans: &[Span]) -> Vec<&str> {
        spans.iter().map(|&span| self.slice(span)).collect()
    }

    /// Text of every span an annotation covers (see [`flat_spans`]).
    pub fn annotation_content(&self, store: &AnnotationStore, id: &AnnotationId) -> Vec<&str> {
        self.spans_content(&flat_spans(store, id))
    }

    /// Widen `span` to whole words plus `context_words` words on each side.
    pub fn word_window(&self, span: Span, context_words: usize) -> Span {
        let probe_end = span.end.max(span.start + 1);
        let first = self.words.iter().position(|word| word.end > span.start);
        let last = self.words.iter().rposition(|word| word.start < probe_end);

        let start = first
            .map(|idx| self.words[idx.saturating_sub(context_words)].start)
            .map_or(span.start, |start| start.min(span.start));
        let end = last
            .map(|idx| self.words[(idx + context_words).min(self.words.len() - 1)].end)
            .map_or(span.end, |end| end.max(span.end));

        let end = end.min(self.char_len());
        Span::new(start.min(end), end)
    }
}

/// Every text span an annotation covers.
///
/// Entities contribute their own spans. Chains and temporal links contribute
/// the spans of the annotations they reference, in reference order. Unknown
/// identifiers contribute nothing.
pub fn flat_spans(store: &AnnotationStore, id: &AnnotationId) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut seen = HashSet::new();
    collect_spans(store, id, &mut seen, &mut spans);
    spans
}

fn collect_spans<'s>(
    store: &'s AnnotationStore,
    id: &'s AnnotationId,
    seen: &mut HashSet<&'s AnnotationId>,
    spans: &mut Vec<Span>,
) {
    if !seen.insert(id) {
        return;
    }
    match store.get(id) {
        Some(Annotation::Entity(entity)) => spans.extend(entity.spans.iter().copied()),
        Some(Annotation::CoreferenceChain(chain)) => {
            for member in chain.members() {
                collect_spans(store, member, seen, spans);
            }
        }
        Some(Annotation::TemporalLink(link)) => {
            collect_spans(store, &link.source, seen, spans);
            collect_spans(store, &link.target, seen, spans);
        }
        Some(Annotation::OtherRelation(_)) | None => {}
    }
}
