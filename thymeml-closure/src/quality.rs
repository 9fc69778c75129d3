//! Corpus-quality checks run on a freshly loaded document.

use std::collections::{BTreeMap, BTreeSet};

use pathfinding::prelude::connected_components;
use serde::Serialize;
use thymeml::{Annotation, AnnotationId, AnnotationStore, EntityKind};

use crate::merger::ChainOverlap;

/// Record counts per kind label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub entities: BTreeMap<String, usize>,
    pub relations: BTreeMap<String, usize>,
}

impl Inventory {
    pub fn of(store: &AnnotationStore) -> Self {
        let mut inventory = Inventory::default();
        for (kind, count) in store.kind_counts() {
            let bucket = if kind.is_entity() {
                &mut inventory.entities
            } else {
                &mut inventory.relations
            };
            bucket.insert(kind.label().to_string(), count);
        }
        inventory
    }

    pub fn total_entities(&self) -> usize {
        self.entities.values().sum()
    }

    pub fn total_relations(&self) -> usize {
        self.relations.values().sum()
    }

    pub fn count(&self, label: &str) -> usize {
        self.entities
            .get(label)
            .or_else(|| self.relations.get(label))
            .copied()
            .unwrap_or(0)
    }
}

/// A non-fatal data-quality finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityWarning {
    MissingDoctime,
    MultipleDoctime {
        ids: Vec<AnnotationId>,
    },
    /// A chain mixes Markable, EVENT and TIMEX3 members.
    MixedKindChain {
        chain: AnnotationId,
        kinds: Vec<EntityKind>,
    },
    ChainOverlap(ChainOverlap),
    /// A relation names an identifier no record carries.
    DanglingReference {
        relation: AnnotationId,
        missing: AnnotationId,
    },
}

impl std::fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityWarning::MissingDoctime => write!(f, "no DOCTIME entity"),
            QualityWarning::MultipleDoctime { ids } => {
                write!(f, "{} DOCTIME entities:", ids.len())?;
                for id in ids {
                    write!(f, " {}", id)?;
                }
                Ok(())
            }
            QualityWarning::MixedKindChain { chain, kinds } => {
                write!(f, "coreference chain {} mixes", chain)?;
                for kind in kinds {
                    write!(f, " {}", kind)?;
                }
                Ok(())
            }
            QualityWarning::ChainOverlap(overlap) => {
                write!(f, "entity {} is in chains", overlap.entity)?;
                for chain in &overlap.chains {
                    write!(f, " {}", chain)?;
                }
                Ok(())
            }
            QualityWarning::DanglingReference { relation, missing } => {
                write!(f, "relation {} refers to unknown {}", relation, missing)
            }
        }
    }
}

/// Whether coreference chains are mutually disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainIndependence {
    /// Number of (member, other chain also holding it) occurrences.
    pub sharings: usize,
    /// Chains connected through shared members, two or more per group.
    pub groups: Vec<Vec<AnnotationId>>,
}

impl ChainIndependence {
    pub fn of(store: &AnnotationStore) -> Self {
        let chains: Vec<_> = store.chains().collect();

        let mut sharings = 0;
        for chain in &chains {
            for member in chain.members() {
                sharings += chains
                    .iter()
                    .filter(|other| other.id != chain.id && other.contains(member))
                    .count();
            }
        }

        let ids: Vec<AnnotationId> = chains.iter().map(|chain| chain.id.clone()).collect();
        let mut groups: Vec<Vec<AnnotationId>> = connected_components(&ids, |id| {
            let chain = chains.iter().find(|chain| &chain.id == id);
            chains
                .iter()
                .filter(|other| {
                    chain.map_or(false, |chain| {
                        other.id != chain.id && chain.members().any(|m| other.contains(m))
                    })
                })
                .map(|other| other.id.clone())
                .collect::<Vec<_>>()
        })
        .into_iter()
        .filter(|group| group.len() > 1)
        .map(|group| {
            let mut group: Vec<AnnotationId> = group.into_iter().collect();
            group.sort();
            group
        })
        .collect();
        groups.sort();

        Self { sharings, groups }
    }

    pub fn is_independent(&self) -> bool {
        self.sharings == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub inventory: Inventory,
    pub independence: ChainIndependence,
    pub warnings: Vec<QualityWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct QualityChecker;

impl QualityChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, store: &AnnotationStore) -> QualityReport {
        let mut warnings = Vec::new();
        warnings.extend(self.doctime(store));
        warnings.extend(self.mixed_kind_chains(store));
        warnings.extend(self.dangling_references(store));

        for warning in &warnings {
            log::warn!("{}: {}", store.document_name(), warning);
        }

        let independence = ChainIndependence::of(store);
        if !independence.is_independent() {
            log::warn!(
                "{}: {} shared coreference chain members",
                store.document_name(),
                independence.sharings
            );
        }

        QualityReport {
            inventory: Inventory::of(store),
            independence,
            warnings,
        }
    }

    fn doctime(&self, store: &AnnotationStore) -> Option<QualityWarning> {
        let ids: Vec<AnnotationId> = store
            .iter_kind(EntityKind::Doctime)
            .map(|a| a.id().clone())
            .collect();
        match ids.len() {
            0 => Some(QualityWarning::MissingDoctime),
            1 => None,
            _ => Some(QualityWarning::MultipleDoctime { ids }),
        }
    }

    fn mixed_kind_chains(&self, store: &AnnotationStore) -> Vec<QualityWarning> {
        store
            .chains()
            .filter_map(|chain| {
                let kinds: BTreeSet<EntityKind> = chain
                    .members()
                    .filter_map(|id| store.get(id).and_then(Annotation::as_entity))
                    .map(|entity| entity.kind)
                    .filter(|kind| *kind != EntityKind::Doctime)
                    .collect();
                (kinds.len() > 1).then(|| QualityWarning::MixedKindChain {
                    chain: chain.id.clone(),
                    kinds: kinds.into_iter().collect(),
                })
            })
            .collect()
    }

    fn dangling_references(&self, store: &AnnotationStore) -> Vec<QualityWarning> {
        let mut warnings = Vec::new();
        for annotation in store.iter() {
            for reference in annotation.references() {
                if !store.contains(reference) {
                    warnings.push(QualityWarning::DanglingReference {
                        relation: annotation.id().clone(),
                        missing: reference.clone(),
                    });
                }
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thymeml::{CoreferenceChain, Entity, Span, TemporalLink, TlinkType};

    fn entity(id: &str, kind: EntityKind) -> Annotation {
        Annotation::Entity(Entity::new(id, kind, vec![Span::new(0, 1)]))
    }

    fn chain(id: &str, first: &str, rest: &[&str]) -> Annotation {
        Annotation::CoreferenceChain(CoreferenceChain::new(
            id,
            first,
            rest.iter().map(|&id| id.into()).collect(),
        ))
    }

    fn store_with(annotations: Vec<Annotation>) -> AnnotationStore {
        let mut store = AnnotationStore::new("doc");
        for annotation in annotations {
            store.append(annotation).unwrap();
        }
        store
    }

    #[test]
    fn test_inventory_counts() {
        let store = store_with(vec![
            entity("d", EntityKind::Doctime),
            entity("e1", EntityKind::Event),
            entity("e2", EntityKind::Event),
            entity("t1", EntityKind::Timex3),
            Annotation::TemporalLink(TemporalLink::tlink("r1", "e1", TlinkType::Before, "e2")),
            chain("c1", "e1", &["e2"]),
        ]);
        let inventory = Inventory::of(&store);
        assert_eq!(inventory.count("EVENT"), 2);
        assert_eq!(inventory.count("TIMEX3"), 1);
        assert_eq!(inventory.count("TLINK"), 1);
        assert_eq!(inventory.count("ALINK"), 0);
        assert_eq!(inventory.total_entities(), 4);
        assert_eq!(inventory.total_relations(), 2);
    }

    #[test]
    fn test_doctime_warnings() {
        let checker = QualityChecker::new();
        let none = store_with(vec![entity("e1", EntityKind::Event)]);
        assert_eq!(checker.check(&none).warnings, vec![QualityWarning::MissingDoctime]);

        let two = store_with(vec![
            entity("d1", EntityKind::Doctime),
            entity("d2", EntityKind::Doctime),
        ]);
        assert_eq!(
            checker.check(&two).warnings,
            vec![QualityWarning::MultipleDoctime {
                ids: vec!["d1".into(), "d2".into()]
            }]
        );
    }

    #[test]
    fn test_mixed_kind_chain() {
        let store = store_with(vec![
            entity("d", EntityKind::Doctime),
            entity("e1", EntityKind::Event),
            entity("m1", EntityKind::Markable),
            chain("c1", "e1", &["m1"]),
        ]);
        assert_eq!(
            QualityChecker::new().check(&store).warnings,
            vec![QualityWarning::MixedKindChain {
                chain: "c1".into(),
                kinds: vec![EntityKind::Event, EntityKind::Markable],
            }]
        );
    }

    #[test]
    fn test_dangling_reference() {
        let store = store_with(vec![
            entity("d", EntityKind::Doctime),
            entity("e1", EntityKind::Event),
            Annotation::TemporalLink(TemporalLink::tlink("r1", "e1", TlinkType::Before, "e9")),
        ]);
        assert_eq!(
            QualityChecker::new().check(&store).warnings,
            vec![QualityWarning::DanglingReference {
                relation: "r1".into(),
                missing: "e9".into(),
            }]
        );
    }

    #[test]
    fn test_chain_independence() {
        let store = store_with(vec![
            entity("e1", EntityKind::Event),
            entity("e2", EntityKind::Event),
            entity("e3", EntityKind::Event),
            entity("e4", EntityKind::Event),
            chain("c1", "e1", &["e2"]),
            chain("c2", "e2", &["e3"]),
            chain("c3", "e4", &[]),
        ]);
        let independence = ChainIndependence::of(&store);
        // e2 is counted once from c1 and once from c2.
        assert_eq!(independence.sharings, 2);
        assert_eq!(
            independence.groups,
            vec![vec![AnnotationId::from("c1"), AnnotationId::from("c2")]]
        );
        assert!(!independence.is_independent());
    }

    #[test]
    fn test_warning_display() {
        let warning = QualityWarning::DanglingReference {
            relation: "r1".into(),
            missing: "e9".into(),
        };
        assert_eq!(warning.to_string(), "relation r1 refers to unknown e9");
    }
}
