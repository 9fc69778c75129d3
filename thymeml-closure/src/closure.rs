//! Transitive closure of TLINKs under the restricted interval algebra.
//!
//! ```text
//!   x ──R1──> y ──R2──> z        =>   x ──(R1 ∘ R2)──> z
//! ```
//!
//! Two links sharing exactly one endpoint identity are read so the shared
//! identity sits in the middle, reversing either link when needed. The
//! composed relation is mapped back to an annotated type (AFTER and DURING
//! become BEFORE and CONTAINS with the endpoints swapped) and appended to the
//! store unless the same (source, target, type) triple is already known.

use std::collections::HashSet;

use serde::Serialize;
use thymeml::{Annotation, AnnotationId, AnnotationStore, StoreError, TemporalLink, TlinkType};

use crate::allen::Resolved;

/// Bounds that stop closure on pathological input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClosureLimits {
    /// Passes allowed to add links. One further pass may run to confirm a
    /// fixpoint, but it never appends.
    pub max_passes: usize,
    /// Upper bound on inferred links per document.
    pub max_links: usize,
}

impl Default for ClosureLimits {
    fn default() -> Self {
        Self {
            max_passes: 64,
            max_links: 100_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClosureOutcome {
    /// Identifiers of the appended links, in inference order.
    pub inferred: Vec<AnnotationId>,
    pub passes: usize,
    /// A limit was reached before a fixpoint; `inferred` is partial.
    pub truncated: bool,
}

/// The (source, target, type) identity of a TLINK.
pub type LinkTriple = (AnnotationId, AnnotationId, TlinkType);

#[derive(Debug, Clone)]
struct WorkLink {
    id: AnnotationId,
    source: AnnotationId,
    target: AnnotationId,
    ty: TlinkType,
}

impl WorkLink {
    fn from_link(link: &TemporalLink) -> Option<Self> {
        Some(Self {
            id: link.id.clone(),
            source: link.source.clone(),
            target: link.target.clone(),
            ty: link.tlink_type()?,
        })
    }

    fn triple(&self) -> LinkTriple {
        (self.source.clone(), self.target.clone(), self.ty)
    }
}

/// Runs closure over a store's TLINKs until a pass adds nothing.
#[derive(Debug, Clone, Default)]
pub struct TemporalClosureEngine {
    limits: ClosureLimits,
}

impl TemporalClosureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ClosureLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ClosureLimits {
        self.limits
    }

    /// Appends every inferable TLINK to `store`.
    ///
    /// Self-referential links are neither read nor produced. Links appended
    /// during a pass take part in the rest of that same pass.
    pub fn close(&self, store: &mut AnnotationStore) -> Result<ClosureOutcome, StoreError> {
        let mut links: Vec<WorkLink> = store
            .tlinks()
            .filter(|link| !link.is_self_referential())
            .filter_map(WorkLink::from_link)
            .collect();
        let mut known: HashSet<LinkTriple> = links.iter().map(WorkLink::triple).collect();
        let mut outcome = ClosureOutcome::default();

        'passes: loop {
            let confirming = outcome.passes >= self.limits.max_passes;
            outcome.passes += 1;
            let mut added = false;

            let mut i = 0;
            while i < links.len() {
                let mut j = 0;
                while j < links.len() {
                    if i != j {
                        if let Some(inferred) = infer(&links[i], &links[j]) {
                            if known.insert(inferred.clone()) {
                                if confirming
                                    || outcome.inferred.len() >= self.limits.max_links
                                {
                                    outcome.truncated = true;
                                    break 'passes;
                                }
                                let link = self.append_inferred(
                                    store,
                                    inferred,
                                    &links[i],
                                    &links[j],
                                )?;
                                outcome.inferred.push(link.id.clone());
                                links.push(link);
                                added = true;
                            }
                        }
                    }
                    j += 1;
                }
                i += 1;
            }

            if !added {
                break;
            }
        }

        if outcome.truncated {
            log::warn!(
                "{}: temporal closure stopped early after {} passes and {} inferred links",
                store.document_name(),
                outcome.passes,
                outcome.inferred.len()
            );
        } else {
            log::info!(
                "{}: temporal closure inferred {} links in {} passes",
                store.document_name(),
                outcome.inferred.len(),
                outcome.passes
            );
        }

        Ok(outcome)
    }

    fn append_inferred(
        &self,
        store: &mut AnnotationStore,
        (source, target, ty): LinkTriple,
        first: &WorkLink,
        second: &WorkLink,
    ) -> Result<WorkLink, StoreError> {
        let id = store.mint_relation_id();
        log::debug!(
            "{}: {} {} {} (from {} and {})",
            store.document_name(),
            source,
            ty,
            target,
            first.id,
            second.id
        );

        let mut link = TemporalLink::tlink(id.clone(), source.clone(), ty, target.clone());
        link.derived_from = Some((first.id.clone(), second.id.clone()));
        store.append(Annotation::TemporalLink(link))?;

        Ok(WorkLink {
            id,
            source,
            target,
            ty,
        })
    }
}

/// The link implied by `first` followed by `second`, if any.
fn infer(first: &WorkLink, second: &WorkLink) -> Option<LinkTriple> {
    let (s1, t1, s2, t2) = (&first.source, &first.target, &second.source, &second.target);

    let mut identities = vec![s1, t1, s2, t2];
    identities.sort();
    identities.dedup();
    if identities.len() != 3 {
        return None;
    }

    let (reverse_first, reverse_second) = if s1 == s2 {
        (true, false)
    } else if t1 == t2 {
        (false, true)
    } else if s1 == t2 {
        (true, true)
    } else {
        (false, false)
    };

    let r1 = Resolved::of(first.ty, reverse_first)?;
    let r2 = Resolved::of(second.ty, reverse_second)?;
    let (ty, swap) = Resolved::compose(r1, r2)?.to_tlink();

    let source = if reverse_first { t1 } else { s1 };
    let target = if reverse_second { s2 } else { t2 };
    let (source, target) = if swap { (target, source) } else { (source, target) };

    Some((source.clone(), target.clone(), ty))
}
