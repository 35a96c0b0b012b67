use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityKind, Scope};
use crate::ids::EntityId;

/// A 1-based inclusive `[start, end]` line span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct LineRange(pub u32, pub u32);

impl LineRange {
    #[must_use]
    pub const fn start(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn end(self) -> u32 {
        self.1
    }

    /// 1-based and not inverted.
    #[must_use]
    pub const fn is_well_formed(self) -> bool {
        self.0 >= 1 && self.0 <= self.1
    }

    #[must_use]
    pub const fn contains_line(self, line: u32) -> bool {
        self.0 <= line && line <= self.1
    }
}

/// A call made from inside an entity's body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallRef {
    /// Resolved to another entity of the same graph.
    Internal(EntityId),
    /// Unresolved callee text (library function, method on a foreign type, ...).
    External(String),
}

impl CallRef {
    #[must_use]
    pub const fn internal_id(&self) -> Option<EntityId> {
        match self {
            Self::Internal(id) => Some(*id),
            Self::External(_) => None,
        }
    }
}

/// The three comment slots attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Comments {
    /// Contiguous comment block directly above the declaration.
    pub leading: Option<String>,
    /// Comment on the declaration's first line, after code.
    pub inline: Option<String>,
    /// Contiguous comment block directly below the declaration.
    pub trailing: Option<String>,
}

impl Comments {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.leading.is_none() && self.inline.is_none() && self.trailing.is_none()
    }
}

/// One named declaration extracted from source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub signature_text: String,
    pub line_range: LineRange,
    /// 0 at file level; unbounded.
    pub depth: u32,
    pub scope: Scope,
    pub parent_id: Option<EntityId>,
    pub children_ids: Vec<EntityId>,
    pub calls: Vec<CallRef>,
    pub comments: Comments,
    pub docstring: Option<String>,
}

impl Entity {
    /// Internal call targets, in first-call order.
    pub fn internal_calls(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.calls.iter().filter_map(CallRef::internal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_range_serializes_as_pair() {
        let json = serde_json::to_string(&LineRange(3, 9)).unwrap();
        assert_eq!(json, "[3,9]");
    }

    #[test]
    fn line_range_well_formedness() {
        assert!(LineRange(1, 1).is_well_formed());
        assert!(!LineRange(0, 4).is_well_formed());
        assert!(!LineRange(5, 4).is_well_formed());
    }

    #[test]
    fn call_ref_serializes_tagged() {
        let calls = vec![
            CallRef::Internal(EntityId::new(3)),
            CallRef::External("println".to_string()),
        ];
        let json = serde_json::to_string(&calls).unwrap();
        assert_eq!(json, r#"[{"internal":"e3"},{"external":"println"}]"#);
    }
}
