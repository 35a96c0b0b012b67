//! Registry of every public JSON schema, for `duet schema`.

use std::collections::BTreeMap;

use anyhow::{Context, bail};
use schemars::schema_for;

/// JSON schemas of the model and wire types, keyed by snake_case name.
pub struct SchemaRegistry {
    schemas: BTreeMap<&'static str, serde_json::Value>,
}

/// Insert the schema of `$ty` under `$name`.
macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        if let Ok(schema) = serde_json::to_value(schema_for!($ty)) {
            $map.insert($name, schema);
        }
    };
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = BTreeMap::new();

        // --- Entity graph ---
        register!(schemas, "entity", duet_core::entities::Entity);
        register!(schemas, "graph_summary", duet_core::entities::GraphSummary);

        // --- Partition model ---
        register!(schemas, "block", duet_core::entities::Block);
        register!(schemas, "hypothesis", duet_core::entities::Hypothesis);
        register!(schemas, "feedback_claim", duet_core::entities::FeedbackClaim);
        register!(schemas, "validation_report", duet_core::entities::ValidationReport);
        register!(schemas, "iteration_record", duet_core::entities::IterationRecord);
        register!(schemas, "oracle_exchange", duet_core::entities::OracleExchange);

        // --- Results ---
        register!(schemas, "analysis_outcome", duet_core::responses::AnalysisOutcome);
        register!(schemas, "responsibility_map", duet_core::responses::ResponsibilityMap);

        // --- Oracle wire ---
        register!(schemas, "oracle_request", duet_negotiate::OracleRequest);
        register!(
            schemas,
            "proposal_payload",
            duet_negotiate::oracle::contract::ProposalPayload
        );
        register!(
            schemas,
            "review_payload",
            duet_negotiate::oracle::contract::ReviewPayload
        );

        Self { schemas }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        self.schemas.keys().copied().collect()
    }

    /// Validate `instance` against the schema registered as `name`.
    ///
    /// # Errors
    ///
    /// Fails when `name` is unknown or the instance does not validate; the
    /// message lists every validation error.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> anyhow::Result<()> {
        let schema = self
            .get(name)
            .with_context(|| format!("unknown schema '{name}'"))?;
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| anyhow::anyhow!("schema '{name}' does not compile: {e}"))?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{e}"))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            bail!("{} does not match '{name}':\n  {}", errors.len(), errors.join("\n  "))
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
