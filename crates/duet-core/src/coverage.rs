//! The coverage check shared by the proposer and the validator.
//!
//! Coverage holds when every entity of the graph appears in exactly one
//! block of a hypothesis. Both negotiation roles call [`validate_coverage`];
//! nothing else decides coverage.

use std::collections::{BTreeMap, BTreeSet};

use crate::entities::Hypothesis;
use crate::ids::EntityId;

/// Everything that keeps a hypothesis from being an exact partition of `E`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageGap {
    /// Ids of `E` that no block holds.
    pub missing: Vec<EntityId>,
    /// Ids held more than once, across blocks or within one block.
    pub duplicates: Vec<EntityId>,
    /// Ids held by a block but absent from `E`.
    pub unknown: Vec<EntityId>,
}

impl CoverageGap {
    /// The union of block ids equals `E` and the blocks are pairwise disjoint.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.duplicates.is_empty() && self.unknown.is_empty()
    }
}

/// Compare the multiset union of all block `entity_ids` against `entity_ids`.
///
/// All three result lists are sorted by id.
#[must_use]
pub fn validate_coverage(hypothesis: &Hypothesis, entity_ids: &BTreeSet<EntityId>) -> CoverageGap {
    let mut counts: BTreeMap<EntityId, usize> = BTreeMap::new();
    for block in &hypothesis.blocks {
        for id in &block.entity_ids {
            *counts.entry(*id).or_insert(0) += 1;
        }
    }

    let missing = entity_ids
        .iter()
        .filter(|id| !counts.contains_key(id))
        .copied()
        .collect();
    let duplicates = counts
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(id, _)| *id)
        .collect();
    let unknown = counts
        .keys()
        .filter(|id| !entity_ids.contains(id))
        .copied()
        .collect();

    CoverageGap {
        missing,
        duplicates,
        unknown,
    }
}
