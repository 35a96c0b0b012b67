use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::block::Block;
use crate::ids::EntityId;

/// One candidate decomposition of a file into responsibility blocks.
///
/// Never mutated in place: a revision is a new `Hypothesis` with
/// `iteration + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Hypothesis {
    pub file_intent: String,
    pub blocks: Vec<Block>,
    /// 0-based.
    pub iteration: u32,
    /// Empty at iteration 0.
    pub response_to_feedback: Vec<FeedbackClaim>,
}

impl Hypothesis {
    #[must_use]
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// First block that holds `entity`.
    #[must_use]
    pub fn block_of(&self, entity: EntityId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.contains(entity))
    }

    #[must_use]
    pub fn block_ids(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.id.as_str()).collect()
    }
}

/// A proposer's claim about how a prior required change was addressed.
///
/// Claims are checked against the structural diff between the prior and
/// current hypotheses by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum FeedbackClaim {
    /// The entities now live in `target_block`.
    Move {
        entity_ids: Vec<EntityId>,
        target_block: String,
    },
    /// `source_block` was replaced by `into_blocks`, which together hold
    /// exactly its prior entities.
    Split {
        source_block: String,
        into_blocks: Vec<String>,
    },
    /// `source_blocks` were replaced by `into_block`, which holds exactly
    /// the union of their prior entities.
    Merge {
        source_blocks: Vec<String>,
        into_block: String,
    },
    /// A required change was deliberately not applied.
    Declined { target_block: String, reason: String },
}

impl FeedbackClaim {
    /// Short human-readable description, used in verification failures.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Move {
                entity_ids,
                target_block,
            } => format!(
                "move [{}] into '{target_block}'",
                entity_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Split {
                source_block,
                into_blocks,
            } => format!("split '{source_block}' into {into_blocks:?}"),
            Self::Merge {
                source_blocks,
                into_block,
            } => format!("merge {source_blocks:?} into '{into_block}'"),
            Self::Declined { target_block, .. } => format!("decline change to '{target_block}'"),
        }
    }
}
