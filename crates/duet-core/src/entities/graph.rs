use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::entity::{CallRef, Entity, LineRange};
use super::report::EntityRef;
use crate::enums::EntityKind;
use crate::errors::CoreError;
use crate::ids::EntityId;

/// Longest comment excerpt sent to the oracle per entity.
const SUMMARY_COMMENT_CHARS: usize = 240;

/// All entities extracted from one source file, in pre-order.
///
/// Immutable once built. Construction verifies the structural invariants:
/// ids are `e1..eN` in order, every parent exists and precedes its children,
/// depths follow the parent chain, and `children_ids` lists exactly the
/// entities that name the entity as their parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphParts")]
pub struct EntityGraph {
    language: String,
    entities: Vec<Entity>,
}

#[derive(Deserialize)]
struct GraphParts {
    language: String,
    entities: Vec<Entity>,
}

impl TryFrom<GraphParts> for EntityGraph {
    type Error = CoreError;

    fn try_from(parts: GraphParts) -> Result<Self, Self::Error> {
        Self::new(parts.language, parts.entities)
    }
}

impl EntityGraph {
    /// Build a graph, verifying every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] describing the first broken invariant.
    pub fn new(language: impl Into<String>, entities: Vec<Entity>) -> Result<Self, CoreError> {
        verify(&entities)?;
        Ok(Self {
            language: language.into(),
            entities,
        })
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.entities.get(index)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// The full entity-id set `E`.
    #[must_use]
    pub fn id_set(&self) -> BTreeSet<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }

    /// File-level entities.
    pub fn roots(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.parent_id.is_none())
    }

    /// Ancestor chain of `id`, nearest first. Empty for roots and unknown ids.
    #[must_use]
    pub fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|e| e.parent_id);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get(parent).and_then(|e| e.parent_id);
        }
        chain
    }

    /// The depth-0 ancestor of `id` (or `id` itself when it is a root).
    #[must_use]
    pub fn root_of(&self, id: EntityId) -> EntityId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// All descendants of `id`, in pre-order.
    #[must_use]
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self
            .get(id)
            .map(|e| e.children_ids.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(entity) = self.get(next) {
                stack.extend(entity.children_ids.iter().rev().copied());
            }
        }
        out
    }

    /// Dotted name through the ancestor chain, e.g. `Config.load.parse_line`.
    #[must_use]
    pub fn qualified_name(&self, id: EntityId) -> String {
        let Some(entity) = self.get(id) else {
            return id.to_string();
        };
        let mut parts: Vec<&str> = self
            .ancestors(id)
            .iter()
            .rev()
            .filter_map(|a| self.get(*a).map(|e| e.name.as_str()))
            .collect();
        parts.push(entity.name.as_str());
        parts.join(".")
    }

    /// `{id, name}` pair used in reports.
    #[must_use]
    pub fn entity_ref(&self, id: EntityId) -> EntityRef {
        EntityRef {
            id,
            name: self.qualified_name(id),
        }
    }

    /// Entities that call `id`.
    pub fn callers_of(&self, id: EntityId) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |e| e.internal_calls().any(|c| c == id))
    }

    /// Compact view of the graph handed to the oracle.
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        let entities = self
            .entities
            .iter()
            .map(|e| EntitySummary {
                id: e.id,
                name: e.name.clone(),
                qualified_name: self.qualified_name(e.id),
                kind: e.kind,
                depth: e.depth,
                parent_id: e.parent_id,
                line_range: e.line_range,
                signature: e.signature_text.clone(),
                calls: e
                    .calls
                    .iter()
                    .map(|c| match c {
                        CallRef::Internal(id) => id.to_string(),
                        CallRef::External(symbol) => symbol.clone(),
                    })
                    .collect(),
                comment: e
                    .docstring
                    .as_deref()
                    .or(e.comments.leading.as_deref())
                    .map(|c| excerpt(c, SUMMARY_COMMENT_CHARS)),
            })
            .collect();

        GraphSummary {
            language: self.language.clone(),
            entity_count: self.entities.len(),
            entities,
        }
    }

    /// Count of entities per kind, for logging.
    #[must_use]
    pub fn kind_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entity in &self.entities {
            *counts.entry(entity.kind.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Oracle-facing view of an entity graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphSummary {
    pub language: String,
    pub entity_count: usize,
    pub entities: Vec<EntitySummary>,
}

/// Oracle-facing view of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntitySummary {
    pub id: EntityId,
    pub name: String,
    pub qualified_name: String,
    pub kind: EntityKind,
    pub depth: u32,
    pub parent_id: Option<EntityId>,
    pub line_range: LineRange,
    pub signature: String,
    /// Internal ids (`e<N>`) or external symbols.
    pub calls: Vec<String>,
    pub comment: Option<String>,
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn verify(entities: &[Entity]) -> Result<(), CoreError> {
    let mut expected_children: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();

    for (index, entity) in entities.iter().enumerate() {
        let expected = EntityId::new(u32::try_from(index + 1).map_err(|_| {
            CoreError::Validation("entity count exceeds the id space".to_string())
        })?);
        if entity.id != expected {
            return Err(CoreError::Validation(format!(
                "entity at position {} has id {}, expected {expected}",
                index + 1,
                entity.id
            )));
        }
        if !entity.line_range.is_well_formed() {
            return Err(CoreError::Validation(format!(
                "entity {} has malformed line range [{}, {}]",
                entity.id,
                entity.line_range.start(),
                entity.line_range.end()
            )));
        }

        match entity.parent_id {
            None => {
                if entity.depth != 0 {
                    return Err(CoreError::Validation(format!(
                        "root entity {} has depth {}",
                        entity.id, entity.depth
                    )));
                }
            }
            Some(parent_id) => {
                if parent_id >= entity.id {
                    return Err(CoreError::Validation(format!(
                        "entity {} names parent {parent_id} that does not precede it",
                        entity.id
                    )));
                }
                let parent_depth = usize::try_from(parent_id.get())
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| entities.get(i))
                    .map(|p| p.depth)
                    .ok_or_else(|| {
                        CoreError::Validation(format!(
                            "entity {} names missing parent {parent_id}",
                            entity.id
                        ))
                    })?;
                if entity.depth != parent_depth + 1 {
                    return Err(CoreError::Validation(format!(
                        "entity {} has depth {} under parent of depth {parent_depth}",
                        entity.id, entity.depth
                    )));
                }
                expected_children.entry(parent_id).or_default().push(entity.id);
            }
        }
    }

    for entity in entities {
        let expected = expected_children.remove(&entity.id).unwrap_or_default();
        if entity.children_ids != expected {
            return Err(CoreError::Validation(format!(
                "entity {} lists children {:?} but its children are {:?}",
                entity.id,
                entity
                    .children_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
                expected.iter().map(ToString::to_string).collect::<Vec<_>>()
            )));
        }
    }

    Ok(())
}
