//! Serde roundtrip and JsonSchema validation tests for the partition model.

use chrono::Utc;
use duet_core::EntityId;
use duet_core::entities::*;
use duet_core::enums::*;
use duet_core::responses::*;
use pretty_assertions::assert_eq;
use schemars::schema_for;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            // Serde roundtrip
            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            // Schema validation
            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn e(n: u32) -> EntityId {
    EntityId::new(n)
}

fn sample_entity() -> Entity {
    Entity {
        id: e(2),
        name: "load".into(),
        kind: EntityKind::Method,
        signature_text: "def load(self, path)".into(),
        line_range: LineRange(4, 12),
        depth: 1,
        scope: Scope::Class,
        parent_id: Some(e(1)),
        children_ids: vec![e(3)],
        calls: vec![
            CallRef::Internal(e(3)),
            CallRef::External("json.loads".into()),
        ],
        comments: Comments {
            leading: Some("# reads the file".into()),
            inline: None,
            trailing: None,
        },
        docstring: Some("Load settings from disk.".into()),
    }
}

fn sample_hypothesis(iteration: u32) -> Hypothesis {
    Hypothesis {
        file_intent: "Settings loader".into(),
        blocks: vec![
            Block {
                id: "io".into(),
                label: "File IO".into(),
                description: "Reads and parses settings files".into(),
                entity_ids: vec![e(1), e(2), e(3)],
                ranges: vec![LineRange(1, 20)],
            },
            Block {
                id: "imports".into(),
                label: "Imports".into(),
                description: String::new(),
                entity_ids: vec![e(4)],
                ranges: vec![LineRange(22, 22)],
            },
        ],
        iteration,
        response_to_feedback: if iteration == 0 {
            Vec::new()
        } else {
            vec![
                FeedbackClaim::Move {
                    entity_ids: vec![e(4)],
                    target_block: "imports".into(),
                },
                FeedbackClaim::Declined {
                    target_block: "io".into(),
                    reason: "parsing and reading share state".into(),
                },
            ]
        },
    }
}

fn sample_report() -> ValidationReport {
    ValidationReport {
        iteration: 1,
        coverage_complete: false,
        missing_entities: vec![EntityRef {
            id: e(5),
            name: "Settings.path".into(),
        }],
        duplicate_entities: Vec::new(),
        major_issue_count: 1,
        minor_issue_count: 0,
        confidence: 0.25,
        response_verification_passed: Some(true),
        verification_failures: Vec::new(),
        regression_penalized: false,
        required_changes: vec![RequiredChange {
            target_block: "io".into(),
            add_entities: vec![e(5)],
            remove_entities: Vec::new(),
            rationale: "Settings.path is in no block".into(),
            severity: Severity::Major,
            category: IssueCategory::Coverage,
        }],
        approved: false,
    }
}

roundtrip_and_validate!(entity_roundtrip, Entity, sample_entity());

roundtrip_and_validate!(
    block_roundtrip,
    Block,
    sample_hypothesis(0).blocks[0].clone()
);

roundtrip_and_validate!(hypothesis_roundtrip, Hypothesis, sample_hypothesis(1));

roundtrip_and_validate!(report_roundtrip, ValidationReport, sample_report());

roundtrip_and_validate!(
    iteration_record_roundtrip,
    IterationRecord,
    IterationRecord {
        iteration: 1,
        hypothesis: sample_hypothesis(1),
        report: sample_report(),
        exchanges: vec![OracleExchange {
            role: OracleRole::Proposer,
            iteration: 1,
            attempt: 2,
            request: serde_json::json!({"iteration": 1}),
            response: None,
            error: Some("oracle call timed out after 120s".into()),
            recorded_at: Utc::now(),
        }],
        corrections: vec!["moved e5 into 'io' (nearest ancestor)".into()],
    }
);

roundtrip_and_validate!(
    outcome_roundtrip,
    AnalysisOutcome,
    AnalysisOutcome {
        hypothesis: Some(sample_hypothesis(1)),
        history: Vec::new(),
        confidence_history: vec![0.25, 0.5],
        termination_reason: TerminationReason::FatalError,
        fatal_cause: Some(FatalCause::Timeout),
        fatal_detail: Some("validator timed out".into()),
        pending_exchanges: Vec::new(),
    }
);

roundtrip_and_validate!(
    responsibility_map_roundtrip,
    ResponsibilityMap,
    ResponsibilityMap {
        file_intent: "Settings loader".into(),
        responsibility_blocks: vec![ResponsibilityBlock {
            id: "io".into(),
            label: "File IO".into(),
            description: "Reads settings".into(),
            elements: BlockElements {
                functions: vec!["Settings.load".into()],
                state: vec!["Settings.path".into()],
                imports: Vec::new(),
                types: vec!["Settings".into()],
                constants: Vec::new(),
            },
            ranges: vec![LineRange(1, 20)],
        }],
        metadata: MapMetadata {
            final_confidence: 0.875,
            iterations: 2,
            termination_reason: TerminationReason::Approved,
        },
    }
);

#[test]
fn entity_id_schema_rejects_bare_numbers() {
    let schema = serde_json::to_value(schema_for!(Entity)).unwrap();
    let mut instance = serde_json::to_value(sample_entity()).unwrap();
    instance["id"] = serde_json::json!("7");
    assert!(!validate_against_schema(&schema, &instance).is_empty());
}

#[test]
fn fatal_cause_is_upper_case_on_the_wire() {
    let cause = serde_json::to_string(&FatalCause::Timeout).unwrap();
    assert_eq!(cause, "\"TIMEOUT\"");
}

#[test]
fn graph_roundtrip_keeps_invariants() {
    let mut class = sample_entity();
    class.id = e(1);
    class.name = "Settings".into();
    class.kind = EntityKind::Class;
    class.depth = 0;
    class.scope = Scope::Module;
    class.parent_id = None;
    class.children_ids = vec![e(2)];
    class.calls = Vec::new();
    class.line_range = LineRange(1, 20);

    let mut method = sample_entity();
    method.children_ids = Vec::new();
    method.calls = vec![CallRef::External("json.loads".into())];

    let graph = EntityGraph::new("python", vec![class, method]).unwrap();
    let json = serde_json::to_string(&graph).unwrap();
    let back: EntityGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(back, graph);
    assert_eq!(back.qualified_name(e(2)), "Settings.load");
}
