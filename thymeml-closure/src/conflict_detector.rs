//! Conflict detection between TLINKs over the same pair of identities.
//!
//! Two links connecting the same two identities contradict each other when:
//!
//! - **Aligned** (same source): their types differ, e.g. `x BEFORE y` and
//!   `x CONTAINS y`.
//! - **Reversed** (source of one is the target of the other): one is
//!   BEGINS-ON and the other ENDS-ON.
//!
//! Reversed pairs of the same type (`x BEFORE y`, `y BEFORE x`) are not
//! flagged.
//!
//! Self-referential links are reported separately by
//! [`ConflictDetector::self_referential`] and never paired.

use serde::Serialize;
use thymeml::{AnnotationId, AnnotationStore, TemporalLink, TlinkType};

/// Where a contradiction comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ConflictOrigin {
    /// At least one endpoint is a coreference chain, so the pair only
    /// meets after merging coreferent mentions.
    IdentityCoreference,
    /// Both endpoints are plain entities.
    TemporalClosure,
}

impl ConflictOrigin {
    pub fn description(&self) -> &'static str {
        match self {
            ConflictOrigin::IdentityCoreference => "identity coreference",
            ConflictOrigin::TemporalClosure => "temporal closure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Orientation {
    Aligned,
    Reversed,
}

/// Two TLINKs judged contradictory. `first` precedes `second` in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictPair {
    pub first: AnnotationId,
    pub second: AnnotationId,
    pub origin: ConflictOrigin,
    pub orientation: Orientation,
    /// Either link was produced by temporal closure.
    pub involves_inferred: bool,
}

impl ConflictPair {
    /// True when this pair names the same two links, in either order.
    pub fn same_links(&self, a: &AnnotationId, b: &AnnotationId) -> bool {
        (&self.first == a && &self.second == b) || (&self.first == b && &self.second == a)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// TLINKs whose source and target are the same identity.
    pub fn self_referential(&self, store: &AnnotationStore) -> Vec<AnnotationId> {
        store
            .tlinks()
            .filter(|link| link.is_self_referential())
            .map(|link| link.id.clone())
            .collect()
    }

    /// Every contradictory pair among the store's TLINKs, each pair once.
    pub fn detect(&self, store: &AnnotationStore) -> Vec<ConflictPair> {
        let links: Vec<(&TemporalLink, TlinkType)> = store
            .tlinks()
            .filter(|link| !link.is_self_referential())
            .filter_map(|link| link.tlink_type().map(|ty| (link, ty)))
            .collect();

        let mut conflicts = Vec::new();
        for (i, &(first, first_ty)) in links.iter().enumerate() {
            for &(second, second_ty) in &links[i + 1..] {
                let orientation = match orientation(first, second) {
                    Some(orientation) => orientation,
                    None => continue,
                };
                if !contradicts(orientation, first_ty, second_ty) {
                    continue;
                }

                let origin = if store.is_chain(&first.source) || store.is_chain(&first.target) {
                    ConflictOrigin::IdentityCoreference
                } else {
                    ConflictOrigin::TemporalClosure
                };
                log::debug!(
                    "{}: {} {} conflict between {} and {}",
                    store.document_name(),
                    origin.description(),
                    first_ty,
                    first.id,
                    second.id
                );
                conflicts.push(ConflictPair {
                    first: first.id.clone(),
                    second: second.id.clone(),
                    origin,
                    orientation,
                    involves_inferred: first.is_inferred() || second.is_inferred(),
                });
            }
        }
        conflicts
    }
}

/// How two links over exactly two identities line up, if they do.
fn orientation(a: &TemporalLink, b: &TemporalLink) -> Option<Orientation> {
    if a.source == b.source && a.target == b.target {
        Some(Orientation::Aligned)
    } else if a.source == b.target && a.target == b.source {
        Some(Orientation::Reversed)
    } else {
        None
    }
}

fn contradicts(orientation: Orientation, a: TlinkType, b: TlinkType) -> bool {
    match orientation {
        Orientation::Aligned => a != b,
        Orientation::Reversed => matches!(
            (a, b),
            (TlinkType::BeginsOn, TlinkType::EndsOn) | (TlinkType::EndsOn, TlinkType::BeginsOn)
        ),
    }
}

/// Number of conflicts per origin, as `(temporal closure, identity coreference)`.
pub fn count_by_origin(conflicts: &[ConflictPair]) -> (usize, usize) {
    conflicts.iter().fold((0, 0), |(closure, identity), pair| match pair.origin {
        ConflictOrigin::TemporalClosure => (closure + 1, identity),
        ConflictOrigin::IdentityCoreference => (closure, identity + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use thymeml::{Annotation, CoreferenceChain, Entity, EntityKind, Span};

    fn store_with_links(links: &[(&str, &str, TlinkType, &str)]) -> AnnotationStore {
        let mut store = AnnotationStore::new("doc");
        for id in ["x", "y", "z"] {
            store
                .append(Annotation::Entity(Entity::new(
                    id,
                    EntityKind::Event,
                    vec![Span::new(0, 1)],
                )))
                .unwrap();
        }
        for &(id, source, ty, target) in links {
            store
                .append(Annotation::TemporalLink(TemporalLink::tlink(
                    id, source, ty, target,
                )))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_aligned_different_types_conflict() {
        let store = store_with_links(&[
            ("r1", "x", TlinkType::Before, "y"),
            ("r2", "x", TlinkType::Contains, "y"),
        ]);
        let conflicts = ConflictDetector::new().detect(&store);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].same_links(&"r2".into(), &"r1".into()));
        assert_eq!(conflicts[0].orientation, Orientation::Aligned);
        assert_eq!(conflicts[0].origin, ConflictOrigin::TemporalClosure);
        assert!(!conflicts[0].involves_inferred);
    }

    #[test]
    fn test_aligned_same_type_is_agreement() {
        let store = store_with_links(&[
            ("r1", "x", TlinkType::Overlap, "y"),
            ("r2", "x", TlinkType::Overlap, "y"),
        ]);
        assert!(ConflictDetector::new().detect(&store).is_empty());
    }

    #[test]
    fn test_reversed_begins_on_ends_on_conflict() {
        let store = store_with_links(&[
            ("r1", "x", TlinkType::BeginsOn, "y"),
            ("r2", "y", TlinkType::EndsOn, "x"),
        ]);
        let conflicts = ConflictDetector::new().detect(&store);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].orientation, Orientation::Reversed);
    }

    #[test]
    fn test_reversed_same_type_not_flagged() {
        let store = store_with_links(&[
            ("r1", "x", TlinkType::Overlap, "y"),
            ("r2", "y", TlinkType::Overlap, "x"),
            ("r3", "x", TlinkType::Before, "z"),
            ("r4", "z", TlinkType::Before, "x"),
        ]);
        assert!(ConflictDetector::new().detect(&store).is_empty());
    }

    #[test]
    fn test_self_referential_links_are_not_paired() {
        let store = store_with_links(&[
            ("r1", "x", TlinkType::Before, "x"),
            ("r2", "x", TlinkType::Contains, "x"),
        ]);
        let detector = ConflictDetector::new();
        assert!(detector.detect(&store).is_empty());
        assert_eq!(
            detector.self_referential(&store),
            vec![AnnotationId::from("r1"), AnnotationId::from("r2")]
        );
    }

    #[test]
    fn test_chain_endpoint_is_identity_coreference() {
        let mut store = store_with_links(&[]);
        store
            .append(Annotation::CoreferenceChain(CoreferenceChain::new(
                "c1",
                "x",
                vec!["z".into()],
            )))
            .unwrap();
        for (id, ty) in [("r1", TlinkType::Before), ("r2", TlinkType::Overlap)] {
            store
                .append(Annotation::TemporalLink(TemporalLink::tlink(id, "y", ty, "c1")))
                .unwrap();
        }

        let conflicts = ConflictDetector::new().detect(&store);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].origin, ConflictOrigin::IdentityCoreference);
        assert_eq!(count_by_origin(&conflicts), (0, 1));
    }
}
