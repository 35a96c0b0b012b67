//! The proposing role.
//!
//! Asks the oracle for a partition, turns the payload into a [`Hypothesis`]
//! with ranges derived from the entity graph, then repairs coverage before
//! the validator sees it:
//! - a duplicated entity is kept only in the block holding its nearest
//!   ancestor, else in the first block holding it;
//! - a missing entity joins the block holding its nearest ancestor, else a
//!   fallback `unassigned` block.
//!
//! Split and merge claims that break their structural rule are logged and
//! recorded as corrections; the validator re-checks every claim regardless.

use duet_config::ProposerConfig;
use duet_core::entities::{Block, EntityGraph, FeedbackClaim, Hypothesis, ValidationReport};
use duet_core::{EntityId, validate_coverage};

use crate::claims::verify_claim;
use crate::error::OracleError;
use crate::oracle::contract::{ProposalPayload, decode_proposal};
use crate::oracle::{OracleLink, OracleRequest};

/// Id of the block that collects entities with no placed ancestor.
pub const UNASSIGNED_BLOCK: &str = "unassigned";

/// A hypothesis plus the self-corrections applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub hypothesis: Hypothesis,
    pub corrections: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Proposer {
    config: ProposerConfig,
}

impl Proposer {
    #[must_use]
    pub const fn new(config: ProposerConfig) -> Self {
        Self { config }
    }

    /// First hypothesis for `graph` (iteration 0).
    ///
    /// # Errors
    ///
    /// Returns the [`OracleError`] that exhausted the link's retry budget.
    pub async fn propose(
        &self,
        link: &mut OracleLink<'_>,
        graph: &EntityGraph,
    ) -> Result<Proposal, OracleError> {
        let request = OracleRequest::proposer(graph.summary(), 0, None);
        let payload = ask(link, &request, graph).await?;
        Ok(self.finish(graph, payload, 0, None))
    }

    /// Revised hypothesis answering `prior_report`.
    ///
    /// # Errors
    ///
    /// Returns the [`OracleError`] that exhausted the link's retry budget.
    pub async fn revise(
        &self,
        link: &mut OracleLink<'_>,
        graph: &EntityGraph,
        prior_hypothesis: &Hypothesis,
        prior_report: &ValidationReport,
    ) -> Result<Proposal, OracleError> {
        let iteration = prior_hypothesis.iteration + 1;
        let request = OracleRequest::proposer(
            graph.summary(),
            iteration,
            Some((prior_hypothesis, prior_report)),
        );
        let payload = ask(link, &request, graph).await?;
        Ok(self.finish(graph, payload, iteration, Some(prior_hypothesis)))
    }

    /// Build the hypothesis from a decoded payload and self-correct it.
    #[must_use]
    pub fn finish(
        &self,
        graph: &EntityGraph,
        payload: ProposalPayload,
        iteration: u32,
        prior: Option<&Hypothesis>,
    ) -> Proposal {
        let mut corrections = Vec::new();

        let mut response_to_feedback = payload.response_to_feedback;
        if iteration == 0 && !response_to_feedback.is_empty() {
            corrections.push(format!(
                "dropped {} feedback claim(s) made at iteration 0",
                response_to_feedback.len()
            ));
            response_to_feedback.clear();
        }

        let mut hypothesis = Hypothesis {
            file_intent: payload.file_intent,
            blocks: payload
                .blocks
                .into_iter()
                .map(|b| Block::new(b.id, b.label, b.description, b.entity_ids, graph))
                .collect(),
            iteration,
            response_to_feedback,
        };

        check_structural_claims(&hypothesis, prior, &mut corrections);
        if self.config.self_correct {
            correct_coverage(&mut hypothesis, graph, &mut corrections);
        }

        for correction in &corrections {
            tracing::info!(iteration, correction = %correction, "proposer self-correction");
        }
        Proposal {
            hypothesis,
            corrections,
        }
    }
}

async fn ask(
    link: &mut OracleLink<'_>,
    request: &OracleRequest,
    graph: &EntityGraph,
) -> Result<ProposalPayload, OracleError> {
    let known = graph.id_set();
    link.call(request, |raw| decode_proposal(raw, &known)).await
}

fn check_structural_claims(
    hypothesis: &Hypothesis,
    prior: Option<&Hypothesis>,
    corrections: &mut Vec<String>,
) {
    for claim in &hypothesis.response_to_feedback {
        if !matches!(claim, FeedbackClaim::Split { .. } | FeedbackClaim::Merge { .. }) {
            continue;
        }
        if let Err(reason) = verify_claim(claim, prior, hypothesis) {
            tracing::warn!(
                iteration = hypothesis.iteration,
                claim = %claim.describe(),
                %reason,
                "claim breaks its structural rule"
            );
            corrections.push(format!("unsound claim '{}': {reason}", claim.describe()));
        }
    }
}

fn correct_coverage(hypothesis: &mut Hypothesis, graph: &EntityGraph, corrections: &mut Vec<String>) {
    let gap = validate_coverage(hypothesis, &graph.id_set());
    if gap.is_complete() {
        return;
    }

    for id in &gap.duplicates {
        let holders: Vec<usize> = (0..hypothesis.blocks.len())
            .filter(|i| hypothesis.blocks[*i].contains(*id))
            .collect();
        let keep = nearest_ancestor_block(hypothesis, graph, *id, &holders)
            .or_else(|| holders.first().copied());
        let Some(keep) = keep else { continue };

        for (index, block) in hypothesis.blocks.iter_mut().enumerate() {
            if index == keep {
                let mut seen = false;
                block.entity_ids.retain(|e| {
                    let first = *e == *id && !seen;
                    if *e == *id {
                        seen = true;
                    }
                    *e != *id || first
                });
            } else {
                block.entity_ids.retain(|e| e != id);
            }
        }
        let how = if nearest_ancestor_block(hypothesis, graph, *id, &[keep]).is_some() {
            "nearest ancestor"
        } else {
            "first holder"
        };
        corrections.push(format!(
            "kept duplicate {id} ({}) only in '{}' ({how})",
            graph.qualified_name(*id),
            hypothesis.blocks[keep].id
        ));
    }

    // Pre-order: a missing parent is placed before its missing children.
    for id in &gap.missing {
        let all: Vec<usize> = (0..hypothesis.blocks.len()).collect();
        let (target, how) = match nearest_ancestor_block(hypothesis, graph, *id, &all) {
            Some(index) => (index, "nearest ancestor"),
            None => (unassigned_block(hypothesis), "no placed ancestor"),
        };
        hypothesis.blocks[target].entity_ids.push(*id);
        corrections.push(format!(
            "moved missing {id} ({}) into '{}' ({how})",
            graph.qualified_name(*id),
            hypothesis.blocks[target].id
        ));
    }

    for id in &gap.unknown {
        for block in &mut hypothesis.blocks {
            block.entity_ids.retain(|e| e != id);
        }
        corrections.push(format!("dropped unknown {id}"));
    }

    for block in &mut hypothesis.blocks {
        block.refresh_ranges(graph);
    }
}

/// Index among `candidates` of the block holding `id`'s nearest ancestor.
fn nearest_ancestor_block(
    hypothesis: &Hypothesis,
    graph: &EntityGraph,
    id: EntityId,
    candidates: &[usize],
) -> Option<usize> {
    graph.ancestors(id).into_iter().find_map(|ancestor| {
        candidates
            .iter()
            .copied()
            .find(|i| hypothesis.blocks[*i].contains(ancestor))
    })
}

fn unassigned_block(hypothesis: &mut Hypothesis) -> usize {
    if let Some(index) = hypothesis
        .blocks
        .iter()
        .position(|b| b.id == UNASSIGNED_BLOCK)
    {
        return index;
    }
    hypothesis.blocks.push(Block {
        id: UNASSIGNED_BLOCK.to_string(),
        label: "Unassigned".to_string(),
        description: "Declarations no proposed block accounted for".to_string(),
        entity_ids: Vec::new(),
        ranges: Vec::new(),
    });
    hypothesis.blocks.len() - 1
}
