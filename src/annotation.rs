//! Typed annotation records.
//!
//! Every annotation in a THYME-ML document is either an entity (a span of
//! text with a kind) or a relation between annotations. Relations refer to
//! other annotations by [`AnnotationId`] only; the [`AnnotationStore`] is the
//! single owner of all records and resolves those references.
//!
//! ```text
//! <entity>   EVENT    "surgery"          12@e@ID001_clinic_001@gold
//! <relation> Identical first=12, coreferring=[31, 44]
//! <relation> TLINK    Source=12 Type=BEFORE Target=7
//! ```
//!
//! [`AnnotationStore`]: crate::AnnotationStore

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::FormatError;

/// Identifier of an annotation, unique within one document.
///
/// THYME identifiers look like `12@e@ID001_clinic_001@gold` (entities) and
/// `3@r@ID001_clinic_001@gold` (relations). Equality and hashing are by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier with the duplicate-disambiguation suffix appended.
    pub(crate) fn disambiguated(&self) -> Self {
        Self(format!("{}(d)", self.0))
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AnnotationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A character-offset range `[start, end)` into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses the `start,end[;start,end...]` span notation.
    pub fn parse_list(text: &str) -> Result<Vec<Span>, FormatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        text.split(';')
            .map(|part| {
                let invalid = || FormatError::InvalidSpan {
                    value: text.to_string(),
                };
                let (start, end) = part.split_once(',').ok_or_else(invalid)?;
                let start: usize = start.trim().parse().map_err(|_| invalid())?;
                let end: usize = end.trim().parse().map_err(|_| invalid())?;
                if end < start {
                    return Err(invalid());
                }
                Ok(Span::new(start, end))
            })
            .collect()
    }

    /// Formats spans back into `start,end;start,end` notation.
    pub fn format_list(spans: &[Span]) -> String {
        spans
            .iter()
            .map(|span| format!("{},{}", span.start, span.end))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// The kind of an entity annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Document creation time, the temporal anchor of the document.
    Doctime,
    Event,
    Timex3,
    /// Non-temporal mention that can still take part in coreference.
    Markable,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Doctime,
        EntityKind::Event,
        EntityKind::Timex3,
        EntityKind::Markable,
    ];

    /// Label used in THYME-ML `<type>` elements.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Doctime => "DOCTIME",
            EntityKind::Event => "EVENT",
            EntityKind::Timex3 => "TIMEX3",
            EntityKind::Markable => "Markable",
        }
    }
}

impl FromStr for EntityKind {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| FormatError::UnknownEntityKind {
                kind: s.to_string(),
            })
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A text-anchored annotation. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: AnnotationId,
    pub kind: EntityKind,
    pub spans: Vec<Span>,
    /// `<parentsType>` as found in the source document, kept for round-tripping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents_type: Option<String>,
    /// Entity properties (DocTimeRel, Polarity, ...), uninterpreted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<(String, String)>,
}

impl Entity {
    pub fn new(id: impl Into<AnnotationId>, kind: EntityKind, spans: Vec<Span>) -> Self {
        Self {
            id: id.into(),
            kind,
            spans,
            parents_type: None,
            properties: Vec::new(),
        }
    }
}

/// An `Identical` relation: a set of entity mentions of the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreferenceChain {
    pub id: AnnotationId,
    pub first_instance: AnnotationId,
    pub coreferring: Vec<AnnotationId>,
}

impl CoreferenceChain {
    pub fn new(
        id: impl Into<AnnotationId>,
        first_instance: impl Into<AnnotationId>,
        coreferring: Vec<AnnotationId>,
    ) -> Self {
        Self {
            id: id.into(),
            first_instance: first_instance.into(),
            coreferring,
        }
    }

    /// The first instance followed by every coreferring mention.
    pub fn members(&self) -> impl Iterator<Item = &AnnotationId> {
        std::iter::once(&self.first_instance).chain(self.coreferring.iter())
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.members().any(|member| member == id)
    }
}

/// The five temporal relation types of the THYME guidelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TlinkType {
    Before,
    Contains,
    Overlap,
    BeginsOn,
    EndsOn,
}

impl TlinkType {
    pub const ALL: [TlinkType; 5] = [
        TlinkType::Before,
        TlinkType::Contains,
        TlinkType::Overlap,
        TlinkType::BeginsOn,
        TlinkType::EndsOn,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TlinkType::Before => "BEFORE",
            TlinkType::Contains => "CONTAINS",
            TlinkType::Overlap => "OVERLAP",
            TlinkType::BeginsOn => "BEGINS-ON",
            TlinkType::EndsOn => "ENDS-ON",
        }
    }
}

impl FromStr for TlinkType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TlinkType::ALL
            .iter()
            .copied()
            .find(|ty| ty.label() == s)
            .ok_or_else(|| FormatError::UnknownLinkType {
                link: "TLINK",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TlinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aspectual relation types. ALINKs are loaded and written back but take no
/// part in merging, closure or conflict detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlinkType {
    Continues,
    Initiates,
    Reinitiates,
    Terminates,
}

impl AlinkType {
    pub const ALL: [AlinkType; 4] = [
        AlinkType::Continues,
        AlinkType::Initiates,
        AlinkType::Reinitiates,
        AlinkType::Terminates,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AlinkType::Continues => "CONTINUES",
            AlinkType::Initiates => "INITIATES",
            AlinkType::Reinitiates => "REINITIATES",
            AlinkType::Terminates => "TERMINATES",
        }
    }
}

impl FromStr for AlinkType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlinkType::ALL
            .iter()
            .copied()
            .find(|ty| ty.label() == s)
            .ok_or_else(|| FormatError::UnknownLinkType {
                link: "ALINK",
                value: s.to_string(),
            })
    }
}

/// The type carried by a temporal link, tagged by link kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    Tlink(TlinkType),
    Alink(AlinkType),
}

impl LinkType {
    pub fn label(&self) -> &'static str {
        match self {
            LinkType::Tlink(ty) => ty.label(),
            LinkType::Alink(ty) => ty.label(),
        }
    }

    /// Relation kind label (`TLINK` or `ALINK`) for the `<type>` element.
    pub fn kind_label(&self) -> &'static str {
        match self {
            LinkType::Tlink(_) => "TLINK",
            LinkType::Alink(_) => "ALINK",
        }
    }
}

/// A TLINK or ALINK between two entities or coreference chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalLink {
    pub id: AnnotationId,
    pub source: AnnotationId,
    pub target: AnnotationId,
    pub link_type: LinkType,
    /// Source entity before it was replaced by its coreference chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_source: Option<AnnotationId>,
    /// Target entity before it was replaced by its coreference chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_target: Option<AnnotationId>,
    /// The two links this one was inferred from, if it was inferred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<(AnnotationId, AnnotationId)>,
}

impl TemporalLink {
    pub fn tlink(
        id: impl Into<AnnotationId>,
        source: impl Into<AnnotationId>,
        ty: TlinkType,
        target: impl Into<AnnotationId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            link_type: LinkType::Tlink(ty),
            original_source: None,
            original_target: None,
            derived_from: None,
        }
    }

    pub fn alink(
        id: impl Into<AnnotationId>,
        source: impl Into<AnnotationId>,
        ty: AlinkType,
        target: impl Into<AnnotationId>,
    ) -> Self {
        Self {
            link_type: LinkType::Alink(ty),
            ..Self::tlink(id, source, TlinkType::Overlap, target)
        }
    }

    /// The TLINK type, or `None` for ALINKs.
    pub fn tlink_type(&self) -> Option<TlinkType> {
        match self.link_type {
            LinkType::Tlink(ty) => Some(ty),
            LinkType::Alink(_) => None,
        }
    }

    pub fn is_tlink(&self) -> bool {
        self.tlink_type().is_some()
    }

    /// True when both endpoints denote the same entity or chain.
    pub fn is_self_referential(&self) -> bool {
        self.source == self.target
    }

    pub fn is_inferred(&self) -> bool {
        self.derived_from.is_some()
    }

    /// The source as annotated, before any chain substitution.
    pub fn annotated_source(&self) -> &AnnotationId {
        self.original_source.as_ref().unwrap_or(&self.source)
    }

    /// The target as annotated, before any chain substitution.
    pub fn annotated_target(&self) -> &AnnotationId {
        self.original_target.as_ref().unwrap_or(&self.target)
    }
}

/// Relation kinds the loader understands besides TLINK/ALINK/Identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OtherRelationKind {
    WholePart,
    SetSubset,
    Appositive,
}

impl OtherRelationKind {
    pub const ALL: [OtherRelationKind; 3] = [
        OtherRelationKind::WholePart,
        OtherRelationKind::SetSubset,
        OtherRelationKind::Appositive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OtherRelationKind::WholePart => "Whole/Part",
            OtherRelationKind::SetSubset => "Set/Subset",
            OtherRelationKind::Appositive => "Appositive",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.label() == label)
    }
}

/// A relation the consistency engine does not interpret. Properties are kept
/// in document order so the relation can be written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherRelation {
    pub id: AnnotationId,
    pub kind: OtherRelationKind,
    pub parents_type: Option<String>,
    pub properties: Vec<(String, String)>,
}

/// Kind selector for [`AnnotationStore::iter_kind`](crate::AnnotationStore::iter_kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnotationKind {
    Entity(EntityKind),
    Tlink,
    Alink,
    Identical,
    Other(OtherRelationKind),
}

impl AnnotationKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnnotationKind::Entity(kind) => kind.label(),
            AnnotationKind::Tlink => "TLINK",
            AnnotationKind::Alink => "ALINK",
            AnnotationKind::Identical => "Identical",
            AnnotationKind::Other(kind) => kind.label(),
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, AnnotationKind::Entity(_))
    }
}

impl From<EntityKind> for AnnotationKind {
    fn from(kind: EntityKind) -> Self {
        AnnotationKind::Entity(kind)
    }
}

/// Any record held by the annotation store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Annotation {
    Entity(Entity),
    CoreferenceChain(CoreferenceChain),
    TemporalLink(TemporalLink),
    OtherRelation(OtherRelation),
}

impl Annotation {
    pub fn id(&self) -> &AnnotationId {
        match self {
            Annotation::Entity(entity) => &entity.id,
            Annotation::CoreferenceChain(chain) => &chain.id,
            Annotation::TemporalLink(link) => &link.id,
            Annotation::OtherRelation(relation) => &relation.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: AnnotationId) {
        match self {
            Annotation::Entity(entity) => entity.id = id,
            Annotation::CoreferenceChain(chain) => chain.id = id,
            Annotation::TemporalLink(link) => link.id = id,
            Annotation::OtherRelation(relation) => relation.id = id,
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Entity(entity) => AnnotationKind::Entity(entity.kind),
            Annotation::CoreferenceChain(_) => AnnotationKind::Identical,
            Annotation::TemporalLink(link) => match link.link_type {
                LinkType::Tlink(_) => AnnotationKind::Tlink,
                LinkType::Alink(_) => AnnotationKind::Alink,
            },
            Annotation::OtherRelation(relation) => AnnotationKind::Other(relation.kind),
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Annotation::Entity(_))
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Annotation::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_chain(&self) -> Option<&CoreferenceChain> {
        match self {
            Annotation::CoreferenceChain(chain) => Some(chain),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&TemporalLink> {
        match self {
            Annotation::TemporalLink(link) => Some(link),
            _ => None,
        }
    }

    /// Identifiers this annotation refers to through its properties.
    pub fn references(&self) -> Vec<&AnnotationId> {
        match self {
            Annotation::Entity(_) => Vec::new(),
            Annotation::CoreferenceChain(chain) => chain.members().collect(),
            Annotation::TemporalLink(link) => {
                let mut refs = vec![&link.source, &link.target];
                refs.extend(link.original_source.iter());
                refs.extend(link.original_target.iter());
                refs
            }
            Annotation::OtherRelation(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_parse_list() {
        let spans = Span::parse_list("10,17;20,25").unwrap();
        assert_eq!(spans, vec![Span::new(10, 17), Span::new(20, 25)]);
        assert_eq!(Span::format_list(&spans), "10,17;20,25");
    }

    #[test]
    fn test_span_parse_list_empty() {
        assert!(Span::parse_list("  ").unwrap().is_empty());
    }

    #[test]
    fn test_span_parse_list_rejects_garbage() {
        assert!(Span::parse_list("10-17").is_err());
        assert!(Span::parse_list("10,x").is_err());
        assert!(Span::parse_list("17,10").is_err());
    }

    #[test]
    fn test_entity_kind_labels_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.label().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("SECTION".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_tlink_type_labels_round_trip() {
        for ty in TlinkType::ALL {
            assert_eq!(ty.label().parse::<TlinkType>().unwrap(), ty);
        }
        assert!("AFTER".parse::<TlinkType>().is_err());
    }

    #[test]
    fn test_chain_members_first_instance_first() {
        let chain = CoreferenceChain::new("c", "e1", vec!["e2".into(), "e3".into()]);
        let members: Vec<&str> = chain.members().map(|id| id.as_str()).collect();
        assert_eq!(members, vec!["e1", "e2", "e3"]);
        assert!(chain.contains(&"e3".into()));
        assert!(!chain.contains(&"e4".into()));
    }

    #[test]
    fn test_annotated_endpoints_fall_back_to_current() {
        let mut link = TemporalLink::tlink("r1", "c1", TlinkType::Before, "e2");
        link.original_source = Some("e1".into());
        assert_eq!(link.annotated_source().as_str(), "e1");
        assert_eq!(link.annotated_target().as_str(), "e2");
    }

    #[test]
    fn test_alink_is_not_tlink() {
        let link = TemporalLink::alink("r1", "e1", AlinkType::Initiates, "e2");
        assert!(!link.is_tlink());
        assert_eq!(link.link_type.kind_label(), "ALINK");
        assert_eq!(
            Annotation::TemporalLink(link).kind(),
            AnnotationKind::Alink
        );
    }
}
