//! Deterministic offline oracle.
//!
//! Proposes one block per group of call-connected top-level declarations
//! (each with all of its descendants), plus one block for imports and one
//! for module-level state. Revises by applying every required change of the
//! prior report and claiming the resulting moves. Reviews never raise
//! issues, so the validator's own checks decide.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use duet_core::EntityId;
use duet_core::entities::{
    EntitySummary, FeedbackClaim, GraphSummary, Hypothesis, LineRange, ValidationReport,
    merge_ranges,
};
use duet_core::enums::{EntityKind, OracleRole};

use super::contract::{ProposalPayload, ProposedBlock, ReviewPayload};
use super::{Oracle, OracleRequest};
use crate::error::OracleError;

const IMPORTS_BLOCK: &str = "imports";
const STATE_BLOCK: &str = "module-state";

/// How many root names a block label lists before summarizing.
const LABEL_NAMES: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOracle;

impl LocalOracle {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Oracle for LocalOracle {
    fn name(&self) -> &str {
        "local"
    }

    async fn call(&self, request: &OracleRequest) -> Result<serde_json::Value, OracleError> {
        let payload = match request.role {
            OracleRole::Proposer => {
                let proposal = match (&request.prior_hypothesis, &request.prior_report) {
                    (Some(prior), Some(report)) => revise(&request.graph, prior, report),
                    _ => propose(&request.graph),
                };
                serde_json::to_value(proposal)
            }
            OracleRole::Validator => serde_json::to_value(ReviewPayload { issues: Vec::new() }),
        };
        payload.map_err(|e| OracleError::Unavailable(format!("local oracle: {e}")))
    }
}

/// Which top-level group a root declaration seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seed {
    Imports,
    State,
    Unit,
}

impl Seed {
    const fn of(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Import | EntityKind::Export => Self::Imports,
            EntityKind::Variable | EntityKind::Constant => Self::State,
            _ => Self::Unit,
        }
    }
}

struct SummaryIndex<'g> {
    by_id: HashMap<EntityId, &'g EntitySummary>,
}

impl<'g> SummaryIndex<'g> {
    fn new(graph: &'g GraphSummary) -> Self {
        Self {
            by_id: graph.entities.iter().map(|e| (e.id, e)).collect(),
        }
    }

    fn root_of(&self, id: EntityId) -> EntityId {
        let mut current = id;
        while let Some(parent) = self.by_id.get(&current).and_then(|e| e.parent_id) {
            current = parent;
        }
        current
    }

    fn ranges(&self, ids: &[EntityId]) -> Vec<[u32; 2]> {
        let spans: Vec<LineRange> = ids
            .iter()
            .filter_map(|id| self.by_id.get(id).map(|e| e.line_range))
            .collect();
        merge_ranges(spans)
            .into_iter()
            .map(|r| [r.start(), r.end()])
            .collect()
    }
}

fn propose(graph: &GraphSummary) -> ProposalPayload {
    let index = SummaryIndex::new(graph);
    let roots: Vec<&EntitySummary> = graph
        .entities
        .iter()
        .filter(|e| e.parent_id.is_none())
        .collect();
    let units: Vec<EntityId> = roots
        .iter()
        .filter(|r| Seed::of(r.kind) == Seed::Unit)
        .map(|r| r.id)
        .collect();

    // Union call-connected units.
    let mut groups = UnionFind::new(&units);
    for entity in &graph.entities {
        let from = index.root_of(entity.id);
        for callee in entity.calls.iter().filter_map(|c| c.parse::<EntityId>().ok()) {
            let to = index.root_of(callee);
            if from != to {
                groups.union(from, to);
            }
        }
    }

    let mut members: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();
    let mut imports = Vec::new();
    let mut state = Vec::new();
    for entity in &graph.entities {
        let root = index.root_of(entity.id);
        match index.by_id.get(&root).map(|r| Seed::of(r.kind)) {
            Some(Seed::Imports) => imports.push(entity.id),
            Some(Seed::State) => state.push(entity.id),
            _ => members
                .entry(groups.find(root).unwrap_or(root))
                .or_default()
                .push(entity.id),
        }
    }

    let mut taken = BTreeSet::new();
    let mut blocks = Vec::new();
    if !imports.is_empty() {
        taken.insert(IMPORTS_BLOCK.to_string());
        blocks.push(ProposedBlock {
            id: IMPORTS_BLOCK.to_string(),
            label: "Imports".to_string(),
            description: "Module imports and re-exports".to_string(),
            ranges: index.ranges(&imports),
            entity_ids: imports,
        });
    }
    if !state.is_empty() {
        taken.insert(STATE_BLOCK.to_string());
        blocks.push(ProposedBlock {
            id: STATE_BLOCK.to_string(),
            label: "Module state".to_string(),
            description: "Module-level constants and variables".to_string(),
            ranges: index.ranges(&state),
            entity_ids: state,
        });
    }

    // Order unit blocks by their first declaration.
    let mut unit_blocks: Vec<Vec<EntityId>> = members.into_values().collect();
    unit_blocks.sort_by_key(|ids| ids.first().copied());
    for ids in unit_blocks {
        let group_roots: Vec<&EntitySummary> = roots
            .iter()
            .copied()
            .filter(|r| ids.contains(&r.id))
            .collect();
        let lead = group_roots.first().map_or("unit", |r| r.name.as_str());
        let id = unique_id(&slug(lead), &mut taken);
        blocks.push(ProposedBlock {
            id,
            label: label_for(&group_roots),
            description: description_for(&group_roots, ids.len()),
            ranges: index.ranges(&ids),
            entity_ids: ids,
        });
    }

    ProposalPayload {
        file_intent: format!(
            "{} source with {} top-level declaration(s) across {} concern(s)",
            graph.language,
            roots.len(),
            blocks.len()
        ),
        blocks,
        response_to_feedback: Vec::new(),
    }
}

fn revise(graph: &GraphSummary, prior: &Hypothesis, report: &ValidationReport) -> ProposalPayload {
    let index = SummaryIndex::new(graph);
    let mut blocks: Vec<ProposedBlock> = prior
        .blocks
        .iter()
        .map(|b| ProposedBlock {
            id: b.id.clone(),
            label: b.label.clone(),
            description: b.description.clone(),
            entity_ids: b.entity_ids.clone(),
            ranges: Vec::new(),
        })
        .collect();
    let mut taken: BTreeSet<String> = blocks.iter().map(|b| b.id.clone()).collect();
    let mut claims = Vec::new();

    for change in &report.required_changes {
        if !change.add_entities.is_empty() {
            move_into(&mut blocks, &change.target_block, &change.add_entities);
            taken.insert(change.target_block.clone());
            claims.push((change.target_block.clone(), change.add_entities.clone()));
        }
        if !change.remove_entities.is_empty() {
            let split = unique_id(&format!("{}-split", change.target_block), &mut taken);
            move_into(&mut blocks, &split, &change.remove_entities);
            claims.push((split, change.remove_entities.clone()));
        }
    }

    blocks.retain(|b| !b.entity_ids.is_empty());
    for block in &mut blocks {
        block.entity_ids.sort_unstable();
        block.ranges = index.ranges(&block.entity_ids);
    }

    // Only claim moves that still hold after every change was applied.
    let response_to_feedback = claims
        .into_iter()
        .filter(|(target, ids)| {
            blocks
                .iter()
                .find(|b| &b.id == target)
                .is_some_and(|b| ids.iter().all(|id| b.entity_ids.contains(id)))
        })
        .map(|(target_block, entity_ids)| FeedbackClaim::Move {
            entity_ids,
            target_block,
        })
        .collect();

    ProposalPayload {
        file_intent: prior.file_intent.clone(),
        blocks,
        response_to_feedback,
    }
}

/// Move `ids` out of every block and into `target`, creating it if needed.
fn move_into(blocks: &mut Vec<ProposedBlock>, target: &str, ids: &[EntityId]) {
    for block in blocks.iter_mut() {
        block.entity_ids.retain(|id| !ids.contains(id));
    }
    if let Some(block) = blocks.iter_mut().find(|b| b.id == target) {
        block.entity_ids.extend_from_slice(ids);
    } else {
        blocks.push(ProposedBlock {
            id: target.to_string(),
            label: target.replace('-', " "),
            description: String::new(),
            entity_ids: ids.to_vec(),
            ranges: Vec::new(),
        });
    }
}

fn label_for(roots: &[&EntitySummary]) -> String {
    let names: Vec<&str> = roots
        .iter()
        .take(LABEL_NAMES)
        .map(|r| r.name.as_str())
        .collect();
    match roots.len().saturating_sub(LABEL_NAMES) {
        0 => names.join(", "),
        more => format!("{} and {more} more", names.join(", ")),
    }
}

fn description_for(roots: &[&EntitySummary], members: usize) -> String {
    match roots {
        [single] => format!(
            "{} {} with {} nested declaration(s)",
            single.kind,
            single.name,
            members.saturating_sub(1)
        ),
        _ => format!("{} call-connected declarations", roots.len()),
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "block".to_string()
    } else {
        trimmed.to_string()
    }
}

fn unique_id(base: &str, taken: &mut BTreeSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Disjoint sets over a fixed universe of ids; the smallest id represents
/// each set.
struct UnionFind {
    parent: BTreeMap<EntityId, EntityId>,
}

impl UnionFind {
    fn new(ids: &[EntityId]) -> Self {
        Self {
            parent: ids.iter().map(|id| (*id, *id)).collect(),
        }
    }

    fn find(&self, id: EntityId) -> Option<EntityId> {
        let mut current = *self.parent.get(&id)?;
        while let Some(next) = self.parent.get(&current).copied().filter(|p| *p != current) {
            current = next;
        }
        Some(current)
    }

    fn union(&mut self, a: EntityId, b: EntityId) {
        let (Some(ra), Some(rb)) = (self.find(a), self.find(b)) else {
            return;
        };
        let (keep, fold) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent.insert(fold, keep);
    }
}
