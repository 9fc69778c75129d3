//! Error types for loading and storing annotations.

use thiserror::Error;

use crate::annotation::AnnotationId;

/// The annotation file could not be turned into typed records.
///
/// Any of these is fatal for the document being loaded, and only for it.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The file is not well-formed XML.
    #[error("xml error at line {line}: {message}")]
    Xml { line: usize, message: String },

    /// The document root is not `<data>` or holds an unexpected element.
    #[error("unexpected element <{tag}> in {context}")]
    UnexpectedElement { tag: String, context: &'static str },

    #[error("unknown entity kind {kind:?}")]
    UnknownEntityKind { kind: String },

    #[error("unknown relation kind {kind:?}")]
    UnknownRelationKind { kind: String },

    #[error("unknown {link} type {value:?}")]
    UnknownLinkType { link: &'static str, value: String },

    /// A mandatory child element or relation property is absent.
    #[error("annotation {id:?} is missing {property}")]
    MissingProperty { id: String, property: String },

    #[error("invalid span {value:?}")]
    InvalidSpan { value: String },
}

/// Result type for annotation-format operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Lookup and insertion failures of the [`AnnotationStore`](crate::AnnotationStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no annotation with id {0}")]
    NotFound(AnnotationId),

    #[error("duplicate annotation id {0}")]
    DuplicateId(AnnotationId),

    /// The id exists but names a different kind of record than requested.
    #[error("annotation {id} is not a {expected}")]
    WrongKind {
        id: AnnotationId,
        expected: &'static str,
    },
}
