//! Data model and file format for THYME-ML temporal annotations.
//!
//! A THYME-ML document is a clinical note (plain text) paired with an XML file
//! of annotations over it: entities (events, time expressions, the document
//! creation time, other markables) and relations between them (temporal and
//! aspectual links, identity coreference chains, bridging relations).
//!
//! This crate provides:
//!
//! - [`Annotation`] and friends, the typed records,
//! - [`AnnotationStore`], the per-document id-indexed owner of those records,
//! - [`xml`], loading and writing THYME-ML,
//! - [`DocumentText`] and [`SpanDisplay`] for looking at what a span covers.
//!
//! The consistency engine (chain merging, temporal closure and conflict
//! detection) lives in `thymeml-closure`.

mod annotation;
mod display;
mod errors;
mod store;
mod text;
pub mod xml;

pub use annotation::{
    AlinkType, Annotation, AnnotationId, AnnotationKind, CoreferenceChain, Entity, EntityKind,
    LinkType, OtherRelation, OtherRelationKind, Span, TemporalLink, TlinkType,
};
pub use display::SpanDisplay;
pub use errors::{FormatError, FormatResult, StoreError};
pub use store::{AnnotationStore, Endpoint};
pub use text::{flat_spans, DocumentText};
