//! The oracle seam.
//!
//! Grouping decisions and qualitative review are delegated to an external
//! reasoning procedure behind the [`Oracle`] trait. An oracle answers with
//! raw JSON; [`contract`] decodes and enforces the proposal and review
//! shapes, and [`link::OracleLink`] adds the per-call timeout, the retry
//! budget, and the exchange log.

pub mod contract;
pub mod http;
pub mod link;
pub mod local;
pub mod scripted;

use async_trait::async_trait;
use duet_core::entities::{GraphSummary, Hypothesis, ValidationReport};
use duet_core::enums::OracleRole;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

pub use http::HttpOracle;
pub use link::OracleLink;
pub use local::LocalOracle;
pub use scripted::{ScriptedOracle, Step};

/// Everything an oracle sees for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OracleRequest {
    pub role: OracleRole,
    pub iteration: u32,
    pub graph: GraphSummary,
    /// The last validation report, `None` at iteration 0.
    pub prior_report: Option<ValidationReport>,
    /// Proposer only: the hypothesis being revised.
    pub prior_hypothesis: Option<Hypothesis>,
    /// Validator only: the hypothesis under review.
    pub hypothesis: Option<Hypothesis>,
}

impl OracleRequest {
    #[must_use]
    pub fn proposer(
        graph: GraphSummary,
        iteration: u32,
        prior: Option<(&Hypothesis, &ValidationReport)>,
    ) -> Self {
        Self {
            role: OracleRole::Proposer,
            iteration,
            graph,
            prior_report: prior.map(|(_, report)| report.clone()),
            prior_hypothesis: prior.map(|(hypothesis, _)| hypothesis.clone()),
            hypothesis: None,
        }
    }

    #[must_use]
    pub fn validator(
        graph: GraphSummary,
        hypothesis: &Hypothesis,
        prior_report: Option<&ValidationReport>,
    ) -> Self {
        Self {
            role: OracleRole::Validator,
            iteration: hypothesis.iteration,
            graph,
            prior_report: prior_report.cloned(),
            prior_hypothesis: None,
            hypothesis: Some(hypothesis.clone()),
        }
    }
}

/// External reasoning procedure serving the proposer and validator roles.
///
/// Implementations must be stateless with respect to a request: every call
/// carries the full context it needs.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Short adapter name for logs (e.g., `local`, `http`).
    fn name(&self) -> &str;

    /// Answer one request with the raw JSON payload for `request.role`.
    async fn call(&self, request: &OracleRequest) -> Result<serde_json::Value, OracleError>;
}
