//! Structural affinity between entities.
//!
//! Two entities have affinity when any of these hold:
//! - one is the parent of the other,
//! - one calls the other,
//! - their names share a significant token (`load_config` / `ConfigError`),
//! - both are module plumbing (imports and exports), or both are
//!   module-level state (depth-0 variables and constants).
//!
//! Affinity drives the validator's over-collapse and under-grouping checks.

use std::collections::{BTreeSet, HashMap};

use duet_core::EntityId;
use duet_core::entities::{Entity, EntityGraph};
use duet_core::enums::EntityKind;
use rustworkx_core::connectivity::connected_components;
use rustworkx_core::petgraph::graph::{NodeIndex, UnGraph};

/// Name tokens too generic to signal a shared concern.
const STOP_TOKENS: &[&str] = &[
    "and", "call", "data", "for", "from", "get", "handle", "impl", "init", "into", "main", "new",
    "run", "self", "set", "the", "value", "with",
];

const MIN_TOKEN_LEN: usize = 3;

pub struct Affinity<'g> {
    graph: &'g EntityGraph,
    tokens: HashMap<EntityId, BTreeSet<String>>,
}

impl<'g> Affinity<'g> {
    #[must_use]
    pub fn new(graph: &'g EntityGraph) -> Self {
        let tokens = graph
            .entities()
            .iter()
            .map(|e| (e.id, name_tokens(&e.name)))
            .collect();
        Self { graph, tokens }
    }

    /// Whether `a` and `b` have affinity. Never true for `a == b`.
    #[must_use]
    pub fn related(&self, a: EntityId, b: EntityId) -> bool {
        if a == b {
            return false;
        }
        let (Some(ea), Some(eb)) = (self.graph.get(a), self.graph.get(b)) else {
            return false;
        };

        ea.parent_id == Some(b)
            || eb.parent_id == Some(a)
            || ea.internal_calls().any(|c| c == b)
            || eb.internal_calls().any(|c| c == a)
            || self.share_tokens(a, b)
            || ambient_group(ea).is_some_and(|g| ambient_group(eb) == Some(g))
    }

    /// Whether `id` has affinity with any of `others`.
    #[must_use]
    pub fn related_to_any(&self, id: EntityId, others: &[EntityId]) -> bool {
        others.iter().any(|other| self.related(id, *other))
    }

    /// How many of `others` `id` has affinity with.
    #[must_use]
    pub fn related_count(&self, id: EntityId, others: &[EntityId]) -> usize {
        others.iter().filter(|other| self.related(id, **other)).count()
    }

    /// Connected components of the affinity relation restricted to `ids`.
    ///
    /// Each cluster is sorted by id; clusters are ordered by their first id.
    #[must_use]
    pub fn clusters(&self, ids: &[EntityId]) -> Vec<Vec<EntityId>> {
        let graph = self.relation_graph(ids);
        let mut clusters: Vec<Vec<EntityId>> = connected_components(&graph)
            .into_iter()
            .map(|component| {
                let mut cluster: Vec<EntityId> =
                    component.into_iter().map(|index| graph[index]).collect();
                cluster.sort_unstable();
                cluster
            })
            .collect();
        clusters.sort_unstable_by_key(|cluster| cluster.first().copied());
        clusters
    }

    /// Undirected graph over the distinct `ids`, one edge per related pair.
    fn relation_graph(&self, ids: &[EntityId]) -> UnGraph<EntityId, ()> {
        let unique: BTreeSet<EntityId> = ids.iter().copied().collect();
        let mut graph = UnGraph::with_capacity(unique.len(), 0);
        let nodes: Vec<(EntityId, NodeIndex)> =
            unique.into_iter().map(|id| (id, graph.add_node(id))).collect();

        for (i, (a, ia)) in nodes.iter().enumerate() {
            for (b, ib) in &nodes[i + 1..] {
                if self.related(*a, *b) {
                    graph.add_edge(*ia, *ib, ());
                }
            }
        }
        graph
    }

    fn share_tokens(&self, a: EntityId, b: EntityId) -> bool {
        match (self.tokens.get(&a), self.tokens.get(&b)) {
            (Some(ta), Some(tb)) => !ta.is_disjoint(tb),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmbientGroup {
    Plumbing,
    ModuleState,
}

fn ambient_group(entity: &Entity) -> Option<AmbientGroup> {
    if entity.kind.is_ambient() {
        Some(AmbientGroup::Plumbing)
    } else if entity.depth == 0 && matches!(entity.kind, EntityKind::Variable | EntityKind::Constant)
    {
        Some(AmbientGroup::ModuleState)
    } else {
        None
    }
}

/// Lower-cased significant words of an identifier.
///
/// Splits on non-alphanumerics and on camel-case boundaries, so
/// `parseHTTPHeader`, `parse_http_header` and `ParseHttpHeader` all yield
/// `{header, http, parse}`.
#[must_use]
pub fn name_tokens(name: &str) -> BTreeSet<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let boundary = c.is_uppercase()
            && prev.is_some_and(|p| {
                p.is_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_uppercase() && next.is_some_and(char::is_lowercase))
            });
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_TOKEN_LEN && !STOP_TOKENS.contains(&w.as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

#[cfg(test)]
mod tests {
    use duet_core::entities::{CallRef, Comments, LineRange};
    use duet_core::enums::Scope;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("parse_http_header", &["header", "http", "parse"])]
    #[case("parseHTTPHeader", &["header", "http", "parse"])]
    #[case("ParseHttpHeader", &["header", "http", "parse"])]
    #[case("__init__", &[])]
    #[case("get_value", &[])]
    #[case("MAX_RETRY_COUNT", &["count", "max", "retry"])]
    #[case("v2Api", &["api"])]
    fn tokenizes_identifiers(#[case] name: &str, #[case] expected: &[&str]) {
        let tokens: Vec<String> = name_tokens(name).into_iter().collect();
        assert_eq!(tokens, expected);
    }

    fn entity(id: u32, name: &str, kind: EntityKind, parent: Option<u32>, calls: &[u32]) -> Entity {
        Entity {
            id: EntityId::new(id),
            name: name.to_string(),
            kind,
            signature_text: String::new(),
            line_range: LineRange(id, id),
            depth: u32::from(parent.is_some()),
            scope: if parent.is_some() {
                Scope::Function
            } else {
                Scope::Module
            },
            parent_id: parent.map(EntityId::new),
            children_ids: Vec::new(),
            calls: calls
                .iter()
                .map(|c| CallRef::Internal(EntityId::new(*c)))
                .collect(),
            comments: Comments::default(),
            docstring: None,
        }
    }

    fn graph() -> EntityGraph {
        let mut outer = entity(3, "process", EntityKind::Function, None, &[]);
        outer.children_ids = vec![EntityId::new(4)];
        EntityGraph::new(
            "python",
            vec![
                entity(1, "os", EntityKind::Import, None, &[]),
                entity(2, "sys", EntityKind::Import, None, &[]),
                outer,
                entity(4, "step", EntityKind::Function, Some(3), &[]),
                entity(5, "load_config", EntityKind::Function, None, &[6]),
                entity(6, "read", EntityKind::Function, None, &[]),
                entity(7, "ConfigError", EntityKind::Class, None, &[]),
                entity(8, "render", EntityKind::Function, None, &[]),
                entity(9, "LIMIT", EntityKind::Constant, None, &[]),
                entity(10, "PATH", EntityKind::Variable, None, &[]),
            ],
        )
        .unwrap()
    }

    fn id(n: u32) -> EntityId {
        EntityId::new(n)
    }

    #[rstest]
    #[case::parent_child(3, 4, true)]
    #[case::call(5, 6, true)]
    #[case::shared_token(5, 7, true)]
    #[case::both_imports(1, 2, true)]
    #[case::both_module_state(9, 10, true)]
    #[case::import_and_state(1, 9, false)]
    #[case::unrelated(6, 8, false)]
    #[case::self_is_not_related(5, 5, false)]
    fn relation(#[case] a: u32, #[case] b: u32, #[case] expected: bool) {
        let g = graph();
        let affinity = Affinity::new(&g);
        assert_eq!(affinity.related(id(a), id(b)), expected);
        assert_eq!(affinity.related(id(b), id(a)), expected);
    }

    #[test]
    fn clusters_are_connected_components() {
        let g = graph();
        let affinity = Affinity::new(&g);
        let ids: Vec<EntityId> = [8, 7, 6, 5, 4, 3, 2, 1].into_iter().map(id).collect();
        assert_eq!(
            affinity.clusters(&ids),
            vec![
                vec![id(1), id(2)],
                vec![id(3), id(4)],
                vec![id(5), id(6), id(7)],
                vec![id(8)],
            ]
        );
    }

    #[test]
    fn clusters_ignore_repeated_ids() {
        let g = graph();
        let affinity = Affinity::new(&g);
        let ids = [id(6), id(5), id(6), id(9), id(10), id(9)];
        assert_eq!(
            affinity.clusters(&ids),
            vec![vec![id(5), id(6)], vec![id(9), id(10)]]
        );
        assert!(affinity.clusters(&[]).is_empty());
    }
}
