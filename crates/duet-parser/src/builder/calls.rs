//! Resolves raw callee text against the flat name table.
//!
//! Runs after the walk so that calls to functions declared further down
//! the file resolve too.

use std::collections::{HashMap, HashSet};

use duet_core::entities::CallRef;
use duet_core::enums::EntityKind;
use duet_core::EntityId;

use crate::adapters::helpers::normalize_whitespace;

/// The part of the graph call resolution needs, indexed by position.
pub(crate) struct NameTable<'a> {
    parents: &'a [Option<usize>],
    by_name: HashMap<&'a str, Vec<usize>>,
}

impl<'a> NameTable<'a> {
    pub(crate) fn new(names: &'a [String], kinds: &[EntityKind], parents: &'a [Option<usize>]) -> Self {
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, (name, kind)) in names.iter().zip(kinds).enumerate() {
            if !kind.is_ambient() {
                by_name.entry(name.as_str()).or_default().push(index);
            }
        }
        Self { parents, by_name }
    }

    /// Resolve the raw callees of entity `caller`, de-duplicated in first
    /// occurrence order.
    pub(crate) fn resolve_all(&self, caller: usize, callees: &[String]) -> Vec<CallRef> {
        let mut seen = HashSet::new();
        callees
            .iter()
            .map(|callee| self.resolve(caller, callee))
            .filter(|call| seen.insert(call.clone()))
            .collect()
    }

    fn resolve(&self, caller: usize, callee: &str) -> CallRef {
        let target = callee_name(callee)
            .and_then(|name| self.by_name.get(name))
            .map(|candidates| self.nearest(caller, candidates));
        match target {
            Some(index) => CallRef::Internal(entity_id(index)),
            None => CallRef::External(normalize_whitespace(callee)),
        }
    }

    /// The candidate declared in the nearest scope enclosing `caller`
    /// (the caller's own body first, then each ancestor, then file level);
    /// otherwise the lowest id.
    fn nearest(&self, caller: usize, candidates: &[usize]) -> usize {
        let mut scope = Some(caller);
        loop {
            if let Some(found) = candidates.iter().find(|c| self.parents[**c] == scope) {
                return *found;
            }
            match scope {
                Some(current) => scope = self.parents[current],
                None => break,
            }
        }
        candidates[0]
    }
}

/// Position `index` in pre-order is entity `e{index + 1}`.
pub(crate) fn entity_id(index: usize) -> EntityId {
    EntityId::new(u32::try_from(index + 1).unwrap_or(u32::MAX))
}

/// Last identifier of a callee expression: `self.store.save` -> `save`,
/// `Vec::<u8>::new` -> `new`, `println!` -> `println`.
///
/// Computed callees (`handlers[0]`, `make()()`) have no name.
pub(crate) fn callee_name(callee: &str) -> Option<&str> {
    let base = callee
        .find("::<")
        .map_or(callee, |cut| &callee[..cut]);
    let base = base.trim_end().trim_end_matches(['!', '?']);
    let start = base
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map(|(i, _)| i)?;
    Some(&base[start..])
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("helper", Some("helper"))]
    #[case("self.store.save", Some("save"))]
    #[case("Self::parse_line", Some("parse_line"))]
    #[case("iter.collect::<Vec<_>>", Some("collect"))]
    #[case("println!", Some("println"))]
    #[case("client?.send", Some("send"))]
    #[case("self.items.entry(key).or_insert", Some("or_insert"))]
    #[case("handlers[0]", None)]
    #[case("(getHandler())", None)]
    fn extracts_callee_name(#[case] callee: &str, #[case] expected: Option<&str>) {
        assert_eq!(callee_name(callee), expected);
    }

    fn table_fixture() -> (Vec<String>, Vec<EntityKind>, Vec<Option<usize>>) {
        // 0 outer { 1 helper, 2 run }   3 helper   4 Other { 5 run }   6 os (import)
        let names = ["outer", "helper", "run", "helper", "Other", "run", "os"]
            .map(String::from)
            .to_vec();
        let kinds = vec![
            EntityKind::Function,
            EntityKind::Function,
            EntityKind::Function,
            EntityKind::Function,
            EntityKind::Class,
            EntityKind::Method,
            EntityKind::Import,
        ];
        let parents = vec![None, Some(0), Some(0), None, None, Some(4), None];
        (names, kinds, parents)
    }

    #[test]
    fn nearest_scope_wins() {
        let (names, kinds, parents) = table_fixture();
        let table = NameTable::new(&names, &kinds, &parents);
        // `run` (inside outer) calls helper: its sibling, not the file-level one.
        assert_eq!(
            table.resolve_all(2, &["helper".into()]),
            vec![CallRef::Internal(EntityId::new(2))]
        );
        // A file-level caller sees the file-level helper.
        assert_eq!(
            table.resolve_all(4, &["helper".into()]),
            vec![CallRef::Internal(EntityId::new(4))]
        );
    }

    #[test]
    fn falls_back_to_lowest_id() {
        let (names, kinds, parents) = table_fixture();
        let table = NameTable::new(&names, &kinds, &parents);
        // `Other.run` calling `self.run` from the file-level helper: no `run`
        // in its chain, so the lowest id wins.
        assert_eq!(
            table.resolve_all(3, &["self.run".into()]),
            vec![CallRef::Internal(EntityId::new(3))]
        );
    }

    #[test]
    fn unresolved_keep_text_and_dedupe() {
        let (names, kinds, parents) = table_fixture();
        let table = NameTable::new(&names, &kinds, &parents);
        let calls = table.resolve_all(
            0,
            &[
                "os.path.join".into(),
                "helper".into(),
                "os.path.join".into(),
                "self.helper".into(),
            ],
        );
        assert_eq!(
            calls,
            vec![
                CallRef::External("os.path.join".into()),
                CallRef::Internal(EntityId::new(2)),
            ]
        );
    }

    #[test]
    fn imports_are_not_call_targets() {
        let (names, kinds, parents) = table_fixture();
        let table = NameTable::new(&names, &kinds, &parents);
        assert_eq!(
            table.resolve_all(0, &["os".into()]),
            vec![CallRef::External("os".into())]
        );
    }
}
