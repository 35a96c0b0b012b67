//! Entity identifiers.
//!
//! Entities are numbered sequentially in pre-order, starting at 1. On the
//! wire an id is always the string `e<N>` so that oracle payloads carry
//! `entity_ids` as string arrays.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CoreError;

/// Prefix of every rendered entity id.
pub const ENTITY_ID_PREFIX: char = 'e';

/// Sequential identifier of one entity within a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Wrap a raw sequence number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The raw sequence number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ENTITY_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(ENTITY_ID_PREFIX)
            .ok_or_else(|| CoreError::InvalidId(s.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidId(s.to_string()));
        }
        digits
            .parse::<u32>()
            .map(Self)
            .map_err(|_| CoreError::InvalidId(s.to_string()))
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for EntityId {
    fn schema_name() -> Cow<'static, str> {
        "EntityId".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": "^e[0-9]+$"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_prefix() {
        assert_eq!(EntityId::new(7).to_string(), "e7");
    }

    #[test]
    fn parses_rendered_form() {
        let id: EntityId = "e42".parse().expect("valid id");
        assert_eq!(id.get(), 42);
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["", "e", "42", "E4", "e-1", "e4x", "block-1"] {
            assert!(bad.parse::<EntityId>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&vec![EntityId::new(1), EntityId::new(12)]).unwrap();
        assert_eq!(json, r#"["e1","e12"]"#);
        let back: Vec<EntityId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![EntityId::new(1), EntityId::new(12)]);
    }

    #[test]
    fn orders_numerically() {
        assert!(EntityId::new(9) < EntityId::new(10));
    }
}
