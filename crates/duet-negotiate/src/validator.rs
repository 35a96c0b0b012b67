//! The validating role.
//!
//! Checks run in a fixed order:
//! 1. coverage, through the shared partition check; one major issue per
//!    missing, duplicated, or unknown entity;
//! 2. structural quality: over-collapse (major), under-grouping and empty
//!    blocks (minor), plus the oracle's review when enabled;
//! 3. response verification of every feedback claim (iteration > 0);
//! 4. regression: the major issue count must strictly decrease.
//!
//! Every issue becomes a [`RequiredChange`] naming a target block and the
//! entities to add to it or take out of it.

use duet_config::{ScoringConfig, ValidatorConfig};
use duet_core::entities::{
    Block, EntityGraph, Hypothesis, IterationRecord, RequiredChange, ValidationReport,
};
use duet_core::enums::{IssueCategory, Severity};
use duet_core::{CoverageGap, EntityId, validate_coverage};

use crate::affinity::Affinity;
use crate::claims::verify_claim;
use crate::error::OracleError;
use crate::oracle::contract::decode_review;
use crate::oracle::{OracleLink, OracleRequest};
use crate::proposer::UNASSIGNED_BLOCK;

/// Confidence is reported to four decimals so thresholds compare exactly.
const CONFIDENCE_SCALE: f64 = 10_000.0;

#[derive(Debug, Clone, Default)]
pub struct Validator {
    scoring: ScoringConfig,
    config: ValidatorConfig,
}

impl Validator {
    #[must_use]
    pub const fn new(scoring: ScoringConfig, config: ValidatorConfig) -> Self {
        Self { scoring, config }
    }

    /// Review `hypothesis` against `graph` and the negotiation so far.
    ///
    /// # Errors
    ///
    /// Returns the [`OracleError`] that exhausted the link's retry budget
    /// while fetching the oracle's review.
    pub async fn validate(
        &self,
        link: &mut OracleLink<'_>,
        graph: &EntityGraph,
        hypothesis: &Hypothesis,
        history: &[IterationRecord],
    ) -> Result<ValidationReport, OracleError> {
        let prior = history.last();
        let review = if self.config.oracle_review {
            let request = OracleRequest::validator(
                graph.summary(),
                hypothesis,
                prior.map(|record| &record.report),
            );
            let known = graph.id_set();
            link.call(&request, |raw| decode_review(raw, &known))
                .await?
                .issues
                .into_iter()
                .map(RequiredChange::from)
                .collect()
        } else {
            Vec::new()
        };

        Ok(self.assess(graph, hypothesis, prior, review))
    }

    /// The deterministic part of validation.
    #[must_use]
    pub fn assess(
        &self,
        graph: &EntityGraph,
        hypothesis: &Hypothesis,
        prior: Option<&IterationRecord>,
        oracle_issues: Vec<RequiredChange>,
    ) -> ValidationReport {
        let affinity = Affinity::new(graph);
        let gap = validate_coverage(hypothesis, &graph.id_set());

        let mut changes = coverage_changes(graph, hypothesis, &affinity, &gap);
        changes.extend(self.structural_changes(graph, hypothesis, &affinity));
        changes.extend(oracle_issues);

        let verification_failures: Vec<String> = if hypothesis.iteration == 0 {
            Vec::new()
        } else {
            let prior_hypothesis = prior.map(|record| &record.hypothesis);
            hypothesis
                .response_to_feedback
                .iter()
                .filter_map(|claim| {
                    verify_claim(claim, prior_hypothesis, hypothesis)
                        .err()
                        .map(|reason| format!("{}: {reason}", claim.describe()))
                })
                .collect()
        };
        let response_verification_passed =
            (hypothesis.iteration > 0).then_some(verification_failures.is_empty());

        let major_issue_count = count(&changes, Severity::Major);
        let minor_issue_count = count(&changes, Severity::Minor);
        let regression_penalized =
            prior.is_some_and(|record| major_issue_count >= record.report.major_issue_count);

        let coverage_complete = gap.is_complete();
        let confidence = self.confidence(
            major_issue_count,
            minor_issue_count,
            response_verification_passed == Some(false),
            regression_penalized,
            coverage_complete,
        );
        let approved = confidence >= self.scoring.approval_threshold
            && coverage_complete
            && major_issue_count == 0;

        tracing::debug!(
            iteration = hypothesis.iteration,
            confidence,
            major_issue_count,
            minor_issue_count,
            coverage_complete,
            approved,
            "hypothesis assessed"
        );

        ValidationReport {
            iteration: hypothesis.iteration,
            coverage_complete,
            missing_entities: gap.missing.iter().map(|id| graph.entity_ref(*id)).collect(),
            duplicate_entities: gap
                .duplicates
                .iter()
                .filter(|id| graph.contains(**id))
                .map(|id| graph.entity_ref(*id))
                .collect(),
            major_issue_count,
            minor_issue_count,
            confidence,
            response_verification_passed,
            verification_failures,
            regression_penalized,
            required_changes: changes,
            approved,
        }
    }

    fn confidence(
        &self,
        majors: u32,
        minors: u32,
        verification_failed: bool,
        regression: bool,
        coverage_complete: bool,
    ) -> f64 {
        let s = &self.scoring;
        let mut score = 1.0
            - f64::from(majors) * s.major_penalty
            - f64::from(minors) * s.minor_penalty;
        if verification_failed {
            score -= s.verification_penalty;
        }
        if regression {
            score -= s.regression_penalty;
        }
        score = score.clamp(0.0, 1.0);
        if !coverage_complete {
            score = score.min(s.coverage_ceiling);
        }
        (score * CONFIDENCE_SCALE).round() / CONFIDENCE_SCALE
    }

    fn structural_changes(
        &self,
        graph: &EntityGraph,
        hypothesis: &Hypothesis,
        affinity: &Affinity<'_>,
    ) -> Vec<RequiredChange> {
        let mut changes = Vec::new();

        for block in &hypothesis.blocks {
            if block.entity_ids.is_empty() {
                changes.push(RequiredChange {
                    target_block: block.id.clone(),
                    add_entities: Vec::new(),
                    remove_entities: Vec::new(),
                    rationale: format!("'{}' holds no entities; drop it", block.id),
                    severity: Severity::Minor,
                    category: IssueCategory::EmptyBlock,
                });
                continue;
            }

            // Over-collapse: two or more substantial clusters in one block.
            let clusters: Vec<Vec<EntityId>> = affinity
                .clusters(&block.entity_ids)
                .into_iter()
                .filter(|c| c.len() >= self.config.min_cluster_size)
                .collect();
            if clusters.len() >= 2 {
                let largest = clusters
                    .iter()
                    .enumerate()
                    .max_by_key(|(i, c)| (c.len(), std::cmp::Reverse(*i)))
                    .map_or(0, |(i, _)| i);
                for (i, cluster) in clusters.iter().enumerate() {
                    if i == largest {
                        continue;
                    }
                    changes.push(RequiredChange {
                        target_block: block.id.clone(),
                        add_entities: Vec::new(),
                        remove_entities: cluster.clone(),
                        rationale: format!(
                            "'{}' mixes {} unrelated groups; move [{}] into a block of their own",
                            block.id,
                            clusters.len(),
                            names(graph, cluster)
                        ),
                        severity: Severity::Major,
                        category: IssueCategory::OverCollapse,
                    });
                }
            }

            // Under-grouping: no affinity at home, affinity elsewhere.
            if block.entity_ids.len() < 2 {
                continue;
            }
            for id in &block.entity_ids {
                let others: Vec<EntityId> = block
                    .entity_ids
                    .iter()
                    .copied()
                    .filter(|o| o != id)
                    .collect();
                if affinity.related_to_any(*id, &others) {
                    continue;
                }
                let others = hypothesis.blocks.iter().filter(|b| b.id != block.id);
                if let Some(target) = most_related(affinity, *id, others) {
                    changes.push(RequiredChange {
                        target_block: target.id.clone(),
                        add_entities: vec![*id],
                        remove_entities: Vec::new(),
                        rationale: format!(
                            "{} has nothing in common with the rest of '{}' but belongs with '{}'",
                            graph.qualified_name(*id),
                            block.id,
                            target.id
                        ),
                        severity: Severity::Minor,
                        category: IssueCategory::UnderGrouping,
                    });
                }
            }
        }

        changes
    }
}

fn coverage_changes(
    graph: &EntityGraph,
    hypothesis: &Hypothesis,
    affinity: &Affinity<'_>,
    gap: &CoverageGap,
) -> Vec<RequiredChange> {
    let mut changes = Vec::new();

    for id in &gap.missing {
        let target = ancestor_block(graph, hypothesis, *id)
            .or_else(|| most_related(affinity, *id, hypothesis.blocks.iter()).map(|b| b.id.clone()))
            .unwrap_or_else(|| UNASSIGNED_BLOCK.to_string());
        changes.push(RequiredChange {
            target_block: target.clone(),
            add_entities: vec![*id],
            remove_entities: Vec::new(),
            rationale: format!(
                "{} ({id}) is in no block; add it to '{target}'",
                graph.qualified_name(*id)
            ),
            severity: Severity::Major,
            category: IssueCategory::Coverage,
        });
    }

    for id in &gap.duplicates {
        let holders: Vec<&str> = hypothesis
            .blocks
            .iter()
            .filter(|b| b.contains(*id))
            .map(|b| b.id.as_str())
            .collect();
        let keeper = ancestor_block(graph, hypothesis, *id)
            .filter(|b| holders.contains(&b.as_str()))
            .or_else(|| holders.first().map(|h| (*h).to_string()))
            .unwrap_or_default();
        changes.push(RequiredChange {
            target_block: keeper.clone(),
            add_entities: vec![*id],
            remove_entities: Vec::new(),
            rationale: format!(
                "{} ({id}) appears in [{}]; keep it only in '{keeper}'",
                graph.qualified_name(*id),
                holders.join(", ")
            ),
            severity: Severity::Major,
            category: IssueCategory::Coverage,
        });
    }

    for id in &gap.unknown {
        for block in hypothesis.blocks.iter().filter(|b| b.contains(*id)) {
            changes.push(RequiredChange {
                target_block: block.id.clone(),
                add_entities: Vec::new(),
                remove_entities: vec![*id],
                rationale: format!("{id} is not an entity of this file"),
                severity: Severity::Major,
                category: IssueCategory::Coverage,
            });
        }
    }

    changes
}

/// Id of the block holding `id`'s nearest ancestor.
fn ancestor_block(graph: &EntityGraph, hypothesis: &Hypothesis, id: EntityId) -> Option<String> {
    graph
        .ancestors(id)
        .into_iter()
        .find_map(|ancestor| hypothesis.block_of(ancestor).map(|b| b.id.clone()))
}

/// First block with the most members related to `id`, if any is related.
fn most_related<'h>(
    affinity: &Affinity<'_>,
    id: EntityId,
    blocks: impl Iterator<Item = &'h Block>,
) -> Option<&'h Block> {
    let mut best: Option<(usize, &Block)> = None;
    for block in blocks {
        let n = affinity.related_count(id, &block.entity_ids);
        if n > best.map_or(0, |(m, _)| m) {
            best = Some((n, block));
        }
    }
    best.map(|(_, block)| block)
}

fn count(changes: &[RequiredChange], severity: Severity) -> u32 {
    u32::try_from(changes.iter().filter(|c| c.severity == severity).count()).unwrap_or(u32::MAX)
}

fn names(graph: &EntityGraph, ids: &[EntityId]) -> String {
    ids.iter()
        .map(|id| graph.qualified_name(*id))
        .collect::<Vec<_>>()
        .join(", ")
}
