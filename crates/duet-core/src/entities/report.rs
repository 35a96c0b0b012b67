use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{IssueCategory, Severity};
use crate::ids::EntityId;

/// An entity reference that stays readable in reports: id plus qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
}

/// A concrete, machine-checkable remediation for one validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct RequiredChange {
    /// Existing block id, or the id of a block to create.
    pub target_block: String,
    /// Entities to place in `target_block` (moving them out of other blocks).
    pub add_entities: Vec<EntityId>,
    /// Entities to take out of `target_block`.
    pub remove_entities: Vec<EntityId>,
    pub rationale: String,
    pub severity: Severity,
    pub category: IssueCategory,
}

/// Outcome of validating one hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub iteration: u32,
    pub coverage_complete: bool,
    pub missing_entities: Vec<EntityRef>,
    pub duplicate_entities: Vec<EntityRef>,
    pub major_issue_count: u32,
    pub minor_issue_count: u32,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    /// `None` at iteration 0.
    pub response_verification_passed: Option<bool>,
    /// One line per claim that did not match the structural diff.
    pub verification_failures: Vec<String>,
    pub regression_penalized: bool,
    pub required_changes: Vec<RequiredChange>,
    pub approved: bool,
}

impl ValidationReport {
    /// Required changes of the given severity.
    pub fn changes_of(&self, severity: Severity) -> impl Iterator<Item = &RequiredChange> {
        self.required_changes
            .iter()
            .filter(move |c| c.severity == severity)
    }
}
