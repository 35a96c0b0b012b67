//! Proposal and review payloads, and their enforcement.
//!
//! Oracle output is checked in two passes before anything downstream sees
//! it: the raw JSON is validated against the `schemars`-generated schema
//! (unknown fields, missing fields, wrong types), then the decoded payload
//! is checked against the entity graph (1-based well-formed ranges, entity
//! ids that exist). A violation is an [`OracleError::Contract`]; nothing is
//! coerced.

use std::collections::BTreeSet;

use duet_core::EntityId;
use duet_core::entities::{FeedbackClaim, RequiredChange};
use duet_core::enums::{IssueCategory, Severity};
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// Schema-validation errors quoted in a contract violation.
const MAX_REPORTED_ERRORS: usize = 3;

/// What the proposer role answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProposalPayload {
    pub file_intent: String,
    pub blocks: Vec<ProposedBlock>,
    pub response_to_feedback: Vec<FeedbackClaim>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProposedBlock {
    pub id: String,
    pub label: String,
    pub description: String,
    pub entity_ids: Vec<EntityId>,
    /// `[start, end]`, 1-based inclusive.
    pub ranges: Vec<[u32; 2]>,
}

/// What the validator role answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReviewPayload {
    pub issues: Vec<ReviewIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReviewIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    pub target_block: String,
    pub add_entities: Vec<EntityId>,
    pub remove_entities: Vec<EntityId>,
    pub rationale: String,
}

impl From<ReviewIssue> for RequiredChange {
    fn from(issue: ReviewIssue) -> Self {
        Self {
            target_block: issue.target_block,
            add_entities: issue.add_entities,
            remove_entities: issue.remove_entities,
            rationale: issue.rationale,
            severity: issue.severity,
            category: issue.category,
        }
    }
}

#[must_use]
pub fn proposal_schema() -> serde_json::Value {
    serde_json::to_value(schema_for!(ProposalPayload)).unwrap_or_default()
}

#[must_use]
pub fn review_schema() -> serde_json::Value {
    serde_json::to_value(schema_for!(ReviewPayload)).unwrap_or_default()
}

/// Decode a proposer answer.
///
/// # Errors
///
/// Returns [`OracleError::Contract`] when the payload does not match the
/// proposal schema, a range is malformed, or an entity id is not in `known`.
pub fn decode_proposal(
    raw: &serde_json::Value,
    known: &BTreeSet<EntityId>,
) -> Result<ProposalPayload, OracleError> {
    let payload: ProposalPayload = decode("proposal", &proposal_schema(), raw)?;

    for block in &payload.blocks {
        let context = format!("block '{}'", block.id);
        check_ranges(&context, &block.ranges)?;
        check_known(&context, &block.entity_ids, known)?;
    }
    for claim in &payload.response_to_feedback {
        if let FeedbackClaim::Move { entity_ids, .. } = claim {
            check_known("move claim", entity_ids, known)?;
        }
    }

    Ok(payload)
}

/// Decode a validator answer.
///
/// # Errors
///
/// Returns [`OracleError::Contract`] when the payload does not match the
/// review schema or an issue names an entity id not in `known`.
pub fn decode_review(
    raw: &serde_json::Value,
    known: &BTreeSet<EntityId>,
) -> Result<ReviewPayload, OracleError> {
    let payload: ReviewPayload = decode("review", &review_schema(), raw)?;

    for issue in &payload.issues {
        let context = format!("issue on '{}'", issue.target_block);
        check_known(&context, &issue.add_entities, known)?;
        check_known(&context, &issue.remove_entities, known)?;
    }

    Ok(payload)
}

fn decode<T: DeserializeOwned>(
    what: &str,
    schema: &serde_json::Value,
    raw: &serde_json::Value,
) -> Result<T, OracleError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| OracleError::contract(format!("{what} schema failed to compile: {e}")))?;

    let errors: Vec<String> = validator
        .iter_errors(raw)
        .take(MAX_REPORTED_ERRORS)
        .map(|e| format!("{e}"))
        .collect();
    if !errors.is_empty() {
        return Err(OracleError::contract(format!(
            "{what} does not match its schema: {}",
            errors.join("; ")
        )));
    }

    serde_json::from_value(raw.clone())
        .map_err(|e| OracleError::contract(format!("{what} failed to decode: {e}")))
}

fn check_ranges(context: &str, ranges: &[[u32; 2]]) -> Result<(), OracleError> {
    for [start, end] in ranges {
        if *start == 0 || start > end {
            return Err(OracleError::contract(format!(
                "{context}: range [{start}, {end}] is not a 1-based [start, end] pair"
            )));
        }
    }
    Ok(())
}

fn check_known(
    context: &str,
    ids: &[EntityId],
    known: &BTreeSet<EntityId>,
) -> Result<(), OracleError> {
    match ids.iter().find(|id| !known.contains(id)) {
        Some(id) => Err(OracleError::contract(format!(
            "{context} references {id}, which is not in the entity graph"
        ))),
        None => Ok(()),
    }
}
