//! Rewrites TLINK endpoints onto the coreference chains containing them.

use std::collections::HashMap;

use serde::Serialize;
use thymeml::{AnnotationId, AnnotationStore, Endpoint, StoreError};

/// An entity listed by more than one coreference chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainOverlap {
    pub entity: AnnotationId,
    /// Every chain containing the entity, in document order.
    pub chains: Vec<AnnotationId>,
}

impl ChainOverlap {
    /// The chain the merger substitutes: the last one in document order.
    pub fn chosen(&self) -> Option<&AnnotationId> {
        self.chains.last()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Endpoints replaced by a chain identifier.
    pub substituted: usize,
    /// Two endpoints per TLINK considered.
    pub possible: usize,
    pub overlapping: Vec<ChainOverlap>,
}

/// Replaces each TLINK endpoint that is a member of a coreference chain with
/// the chain itself.
///
/// The original endpoint is kept on the link (`original_source` /
/// `original_target`). ALINKs are left alone. Running the merger twice
/// changes nothing the second time: chain identifiers are not chain members.
#[derive(Debug, Default, Clone)]
pub struct CoreferenceMerger;

impl CoreferenceMerger {
    pub fn new() -> Self {
        Self
    }

    /// Entity → chain lookup. When chains share members the last one wins
    /// and each shared entity is reported.
    pub fn chain_membership(
        &self,
        store: &AnnotationStore,
    ) -> (HashMap<AnnotationId, AnnotationId>, Vec<ChainOverlap>) {
        let mut containing: HashMap<&AnnotationId, Vec<&AnnotationId>> = HashMap::new();
        let mut order: Vec<&AnnotationId> = Vec::new();
        for chain in store.chains() {
            for member in chain.members() {
                let chains = containing.entry(member).or_insert_with(|| {
                    order.push(member);
                    Vec::new()
                });
                if !chains.contains(&&chain.id) {
                    chains.push(&chain.id);
                }
            }
        }

        let mut membership = HashMap::new();
        let mut overlapping = Vec::new();
        for entity in order {
            let chains = &containing[entity];
            if let Some(last) = chains.last() {
                membership.insert(entity.clone(), (*last).clone());
            }
            if chains.len() > 1 {
                overlapping.push(ChainOverlap {
                    entity: entity.clone(),
                    chains: chains.iter().map(|&id| id.clone()).collect(),
                });
            }
        }
        (membership, overlapping)
    }

    pub fn merge(&self, store: &mut AnnotationStore) -> Result<MergeReport, StoreError> {
        let (membership, overlapping) = self.chain_membership(store);
        for overlap in &overlapping {
            log::warn!(
                "{}: entity {} belongs to {} coreference chains, using {}",
                store.document_name(),
                overlap.entity,
                overlap.chains.len(),
                overlap.chosen().map(AnnotationId::as_str).unwrap_or_default()
            );
        }

        let mut substitutions = Vec::new();
        let mut possible = 0;
        for link in store.tlinks() {
            possible += 2;
            for endpoint in Endpoint::BOTH {
                let current = match endpoint {
                    Endpoint::Source => &link.source,
                    Endpoint::Target => &link.target,
                };
                if let Some(chain) = membership.get(current) {
                    substitutions.push((link.id.clone(), endpoint, chain.clone()));
                }
            }
        }

        let substituted = substitutions.len();
        for (link_id, endpoint, chain) in substitutions {
            let replaced = store.substitute_endpoint(&link_id, endpoint, chain.clone())?;
            log::debug!(
                "{}: {} {} {} -> {}",
                store.document_name(),
                link_id,
                endpoint.label(),
                replaced,
                chain
            );
        }

        log::info!(
            "{}: merged {} of {} TLINK endpoints into coreference chains",
            store.document_name(),
            substituted,
            possible
        );

        Ok(MergeReport {
            substituted,
            possible,
            overlapping,
        })
    }
}
