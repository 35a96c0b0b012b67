use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::entity::LineRange;
use super::graph::EntityGraph;
use crate::ids::EntityId;

/// One responsibility cell of a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Block {
    pub id: String,
    pub label: String,
    pub description: String,
    pub entity_ids: Vec<EntityId>,
    /// Line ranges of the block's entities, merged.
    pub ranges: Vec<LineRange>,
}

impl Block {
    /// Build a block whose `ranges` are derived from its entities.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        entity_ids: Vec<EntityId>,
        graph: &EntityGraph,
    ) -> Self {
        let ranges = derive_ranges(&entity_ids, graph);
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            entity_ids,
            ranges,
        }
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entity_ids.contains(&id)
    }

    /// Recompute `ranges` after `entity_ids` changed.
    pub fn refresh_ranges(&mut self, graph: &EntityGraph) {
        self.ranges = derive_ranges(&self.entity_ids, graph);
    }
}

/// Sorted line ranges of `entity_ids`, with overlapping or adjacent spans merged.
///
/// Ids unknown to `graph` are skipped.
#[must_use]
pub fn derive_ranges(entity_ids: &[EntityId], graph: &EntityGraph) -> Vec<LineRange> {
    merge_ranges(
        entity_ids
            .iter()
            .filter_map(|id| graph.get(*id).map(|e| e.line_range))
            .collect(),
    )
}

/// Sort `spans` and merge the ones that overlap or touch.
#[must_use]
pub fn merge_ranges(mut spans: Vec<LineRange>) -> Vec<LineRange> {
    spans.sort_unstable();

    let mut merged: Vec<LineRange> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start() <= last.end().saturating_add(1) => {
                last.1 = last.end().max(span.end());
            }
            _ => merged.push(span),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entities::{Comments, Entity};
    use crate::enums::{EntityKind, Scope};

    fn graph(ranges: &[(u32, u32)]) -> EntityGraph {
        let entities = ranges
            .iter()
            .enumerate()
            .map(|(i, (start, end))| Entity {
                id: EntityId::new(u32::try_from(i).unwrap() + 1),
                name: format!("f{i}"),
                kind: EntityKind::Function,
                signature_text: String::new(),
                line_range: LineRange(*start, *end),
                depth: 0,
                scope: Scope::Module,
                parent_id: None,
                children_ids: Vec::new(),
                calls: Vec::new(),
                comments: Comments::default(),
                docstring: None,
            })
            .collect();
        EntityGraph::new("python", entities).unwrap()
    }

    #[test]
    fn merges_overlapping_and_adjacent_spans() {
        let g = graph(&[(10, 20), (1, 3), (4, 6), (15, 25), (30, 31)]);
        let ids: Vec<EntityId> = (1..=5).map(EntityId::new).collect();
        assert_eq!(
            derive_ranges(&ids, &g),
            vec![LineRange(1, 6), LineRange(10, 25), LineRange(30, 31)]
        );
    }

    #[test]
    fn skips_unknown_ids() {
        let g = graph(&[(1, 2)]);
        let ranges = derive_ranges(&[EntityId::new(1), EntityId::new(9)], &g);
        assert_eq!(ranges, vec![LineRange(1, 2)]);
    }

    #[test]
    fn new_block_derives_ranges() {
        let g = graph(&[(5, 8), (1, 2)]);
        let block = Block::new("b1", "Parsing", "", vec![EntityId::new(1), EntityId::new(2)], &g);
        assert_eq!(block.ranges, vec![LineRange(1, 2), LineRange(5, 8)]);
        assert!(block.contains(EntityId::new(2)));
    }
}
