use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::hypothesis::Hypothesis;
use super::report::ValidationReport;
use crate::enums::OracleRole;

/// One oracle call, kept verbatim for post-hoc audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OracleExchange {
    pub role: OracleRole,
    pub iteration: u32,
    /// 1 for the first call, 2 for a retry.
    pub attempt: u32,
    pub request: serde_json::Value,
    /// Raw oracle output, present whenever the oracle answered.
    pub response: Option<serde_json::Value>,
    /// Why the call failed, when it did (timeout, transport, contract).
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl OracleExchange {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// One completed negotiation round, appended immutably to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IterationRecord {
    pub iteration: u32,
    pub hypothesis: Hypothesis,
    pub report: ValidationReport,
    pub exchanges: Vec<OracleExchange>,
    /// Self-corrections the proposer applied before returning.
    pub corrections: Vec<String>,
}
