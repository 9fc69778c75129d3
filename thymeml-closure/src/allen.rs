//! The restricted interval algebra used for temporal closure.
//!
//! THYME annotates five relation types. Inference needs a link read in either
//! direction, so BEFORE and CONTAINS gain their converses AFTER and DURING.
//! BEGINS-ON and ENDS-ON keep their label whichever way they are read. OVERLAP
//! merges two of Allen's relations into one label and never takes part.

use serde::Serialize;
use thymeml::TlinkType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Resolved {
    Before,
    After,
    Contains,
    During,
    BeginsOn,
    EndsOn,
}

impl Resolved {
    /// Reads a TLINK type in annotated order, or reversed (target to source).
    pub fn of(ty: TlinkType, reversed: bool) -> Option<Resolved> {
        match (ty, reversed) {
            (TlinkType::Before, false) => Some(Resolved::Before),
            (TlinkType::Before, true) => Some(Resolved::After),
            (TlinkType::Contains, false) => Some(Resolved::Contains),
            (TlinkType::Contains, true) => Some(Resolved::During),
            (TlinkType::BeginsOn, _) => Some(Resolved::BeginsOn),
            (TlinkType::EndsOn, _) => Some(Resolved::EndsOn),
            (TlinkType::Overlap, _) => None,
        }
    }

    /// `x R1 y` and `y R2 z` give `x (R1 ∘ R2) z`, where the table has an entry.
    pub fn compose(r1: Resolved, r2: Resolved) -> Option<Resolved> {
        use Resolved::*;

        match (r1, r2) {
            (Before, Before) | (Before, Contains) | (Before, EndsOn) => Some(Before),
            (After, After) | (After, Contains) | (After, BeginsOn) => Some(After),
            (During, Before) | (During, EndsOn) => Some(Before),
            (During, After) | (During, BeginsOn) => Some(After),
            (During, During) => Some(During),
            (Contains, Contains) => Some(Contains),
            (BeginsOn, After) | (BeginsOn, Contains) => Some(After),
            (EndsOn, Before) | (EndsOn, Contains) => Some(Before),
            _ => None,
        }
    }

    /// The annotated type expressing this relation, and whether source and
    /// target must be swapped to express it.
    pub fn to_tlink(self) -> (TlinkType, bool) {
        match self {
            Resolved::Before => (TlinkType::Before, false),
            Resolved::After => (TlinkType::Before, true),
            Resolved::Contains => (TlinkType::Contains, false),
            Resolved::During => (TlinkType::Contains, true),
            Resolved::BeginsOn => (TlinkType::BeginsOn, false),
            Resolved::EndsOn => (TlinkType::EndsOn, false),
        }
    }
}
