//! Loop results and the request-level output schema.
//!
//! [`AnalysisOutcome`] is what the loop controller packages; it always
//! carries the full history. [`ResponsibilityMap`] is the compact shape
//! returned at the service boundary (CLI, HTTP, editor).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{EntityGraph, Hypothesis, IterationRecord, LineRange, OracleExchange};
use crate::enums::{ElementBucket, FatalCause, TerminationReason};

/// Packaged result of one negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisOutcome {
    /// Terminal hypothesis. `None` only if the loop ended before the
    /// proposer produced anything.
    pub hypothesis: Option<Hypothesis>,
    pub history: Vec<IterationRecord>,
    pub confidence_history: Vec<f64>,
    pub termination_reason: TerminationReason,
    pub fatal_cause: Option<FatalCause>,
    pub fatal_detail: Option<String>,
    /// Exchanges of an iteration that did not complete.
    pub pending_exchanges: Vec<OracleExchange>,
}

impl AnalysisOutcome {
    /// Confidence of the last completed iteration, `0.0` when none completed.
    #[must_use]
    pub fn final_confidence(&self) -> f64 {
        self.confidence_history.last().copied().unwrap_or(0.0)
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.termination_reason == TerminationReason::Approved
    }

    /// Project the outcome onto the request-level output schema.
    #[must_use]
    pub fn to_responsibility_map(&self, graph: &EntityGraph) -> ResponsibilityMap {
        let (file_intent, responsibility_blocks) = self.hypothesis.as_ref().map_or_else(
            || (String::new(), Vec::new()),
            |h| {
                let blocks = h
                    .blocks
                    .iter()
                    .map(|block| ResponsibilityBlock {
                        id: block.id.clone(),
                        label: block.label.clone(),
                        description: block.description.clone(),
                        elements: BlockElements::collect(&block.entity_ids, graph),
                        ranges: block.ranges.clone(),
                    })
                    .collect();
                (h.file_intent.clone(), blocks)
            },
        );

        ResponsibilityMap {
            file_intent,
            responsibility_blocks,
            metadata: MapMetadata {
                final_confidence: self.final_confidence(),
                iterations: u32::try_from(self.iterations()).unwrap_or(u32::MAX),
                termination_reason: self.termination_reason,
            },
        }
    }
}

/// Request-level output returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponsibilityMap {
    pub file_intent: String,
    pub responsibility_blocks: Vec<ResponsibilityBlock>,
    pub metadata: MapMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponsibilityBlock {
    pub id: String,
    pub label: String,
    pub description: String,
    pub elements: BlockElements,
    pub ranges: Vec<LineRange>,
}

/// Qualified entity names of a block, bucketed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BlockElements {
    pub functions: Vec<String>,
    pub state: Vec<String>,
    pub imports: Vec<String>,
    pub types: Vec<String>,
    pub constants: Vec<String>,
}

impl BlockElements {
    fn collect(ids: &[crate::EntityId], graph: &EntityGraph) -> Self {
        let mut elements = Self::default();
        for id in ids {
            let Some(entity) = graph.get(*id) else {
                continue;
            };
            let name = graph.qualified_name(*id);
            match entity.kind.bucket() {
                ElementBucket::Functions => elements.functions.push(name),
                ElementBucket::State => elements.state.push(name),
                ElementBucket::Imports => elements.imports.push(name),
                ElementBucket::Types => elements.types.push(name),
                ElementBucket::Constants => elements.constants.push(name),
            }
        }
        elements
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MapMetadata {
    pub final_confidence: f64,
    pub iterations: u32,
    pub termination_reason: TerminationReason,
}
