//! The per-document annotation store.
//!
//! `AnnotationStore` owns every record of a single document in insertion
//! order and indexes them by identifier. Relations hold identifiers, never
//! references into the store, so records can be resolved, iterated and
//! extended without any shared mutable object graph.
//!
//! The store only grows: records are appended (loaded or inferred) and the
//! single in-place edit is the endpoint substitution performed when links are
//! merged into coreference chains.

use std::collections::{BTreeMap, HashMap};

use crate::annotation::{
    Annotation, AnnotationId, AnnotationKind, CoreferenceChain, Entity, TemporalLink,
};
use crate::errors::StoreError;

/// Which end of a temporal link an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Source,
    Target,
}

impl Endpoint {
    pub const BOTH: [Endpoint; 2] = [Endpoint::Source, Endpoint::Target];

    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::Source => "Source",
            Endpoint::Target => "Target",
        }
    }
}

/// All annotations of one document, addressable by identifier.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    document_name: String,
    annotations: Vec<Annotation>,
    index: HashMap<AnnotationId, usize>,
    /// Next candidate number for minted relation identifiers.
    next_sequence: Option<usize>,
}

impl AnnotationStore {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            annotations: Vec::new(),
            index: HashMap::new(),
            next_sequence: None,
        }
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// All annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Annotations of a single kind, in insertion order.
    pub fn iter_kind(&self, kind: impl Into<AnnotationKind>) -> impl Iterator<Item = &Annotation> {
        let kind = kind.into();
        self.annotations.iter().filter(move |a| a.kind() == kind)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.annotations.iter().filter_map(Annotation::as_entity)
    }

    pub fn chains(&self) -> impl Iterator<Item = &CoreferenceChain> {
        self.annotations.iter().filter_map(Annotation::as_chain)
    }

    /// TLINKs and ALINKs.
    pub fn temporal_links(&self) -> impl Iterator<Item = &TemporalLink> {
        self.annotations.iter().filter_map(Annotation::as_link)
    }

    pub fn tlinks(&self) -> impl Iterator<Item = &TemporalLink> {
        self.temporal_links().filter(|link| link.is_tlink())
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.index.get(id).map(|&idx| &self.annotations[idx])
    }

    /// Looks up an annotation by identifier.
    pub fn resolve(&self, id: &AnnotationId) -> Result<&Annotation, StoreError> {
        self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    pub fn link(&self, id: &AnnotationId) -> Result<&TemporalLink, StoreError> {
        self.resolve(id)?.as_link().ok_or_else(|| StoreError::WrongKind {
            id: id.clone(),
            expected: "temporal link",
        })
    }

    /// True when `id` names a coreference chain.
    pub fn is_chain(&self, id: &AnnotationId) -> bool {
        matches!(self.get(id), Some(Annotation::CoreferenceChain(_)))
    }

    /// Number of records that are not entities.
    pub fn relation_count(&self) -> usize {
        self.annotations.iter().filter(|a| !a.is_entity()).count()
    }

    /// Adds a record under its own identifier.
    pub fn append(&mut self, annotation: Annotation) -> Result<(), StoreError> {
        let id = annotation.id().clone();
        if self.index.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.index.insert(id, self.annotations.len());
        self.annotations.push(annotation);
        Ok(())
    }

    /// Adds a record, renaming it with a `(d)` suffix (repeatedly) while its
    /// identifier is taken. Returns the identifier it was stored under.
    pub fn insert_disambiguated(&mut self, mut annotation: Annotation) -> AnnotationId {
        let original = annotation.id().clone();
        let mut id = original.clone();
        while self.index.contains_key(&id) {
            id = id.disambiguated();
        }
        if id != original {
            log::warn!(
                "{}: duplicate annotation id {}, stored as {}",
                self.document_name,
                original,
                id
            );
            annotation.set_id(id.clone());
        }
        self.index.insert(id.clone(), self.annotations.len());
        self.annotations.push(annotation);
        id
    }

    /// Mints a fresh relation identifier `<n>@<document>@gold`.
    ///
    /// Numbering continues after the number of relation records (chains,
    /// links and other relations) present at the first call, and skips
    /// identifiers already in use.
    pub fn mint_relation_id(&mut self) -> AnnotationId {
        let mut n = match self.next_sequence {
            Some(n) => n,
            None => self.relation_count() + 1,
        };
        loop {
            let id = AnnotationId::new(format!("{}@{}@gold", n, self.document_name));
            n += 1;
            if !self.index.contains_key(&id) {
                self.next_sequence = Some(n);
                return id;
            }
        }
    }

    /// Replaces one endpoint of a temporal link, keeping the first annotated
    /// endpoint as provenance. Returns the endpoint that was replaced.
    pub fn substitute_endpoint(
        &mut self,
        link_id: &AnnotationId,
        endpoint: Endpoint,
        replacement: AnnotationId,
    ) -> Result<AnnotationId, StoreError> {
        let idx = *self
            .index
            .get(link_id)
            .ok_or_else(|| StoreError::NotFound(link_id.clone()))?;
        let link = match &mut self.annotations[idx] {
            Annotation::TemporalLink(link) => link,
            _ => {
                return Err(StoreError::WrongKind {
                    id: link_id.clone(),
                    expected: "temporal link",
                })
            }
        };

        let (current, original) = match endpoint {
            Endpoint::Source => (&mut link.source, &mut link.original_source),
            Endpoint::Target => (&mut link.target, &mut link.original_target),
        };
        let replaced = std::mem::replace(current, replacement);
        if original.is_none() {
            *original = Some(replaced.clone());
        }
        Ok(replaced)
    }

    /// Number of records per kind.
    pub fn kind_counts(&self) -> BTreeMap<AnnotationKind, usize> {
        let mut counts = BTreeMap::new();
        for annotation in &self.annotations {
            *counts.entry(annotation.kind()).or_insert(0) += 1;
        }
        counts
    }
}
