//! Entity kinds, scopes, issue classifications, and loop outcomes.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`,
//! except the termination vocabulary which is rendered in upper case at the
//! service boundary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// What kind of declaration an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Interface,
    Trait,
    Impl,
    TypeAlias,
    Module,
    Variable,
    Constant,
    Field,
    Import,
    Export,
    Macro,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Impl => "impl",
            Self::TypeAlias => "type_alias",
            Self::Module => "module",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Field => "field",
            Self::Import => "import",
            Self::Export => "export",
            Self::Macro => "macro",
        }
    }

    /// Which bucket of the request-level `elements` map this kind lands in.
    #[must_use]
    pub const fn bucket(self) -> ElementBucket {
        match self {
            Self::Function | Self::Method | Self::Macro => ElementBucket::Functions,
            Self::Variable | Self::Field => ElementBucket::State,
            Self::Import | Self::Export => ElementBucket::Imports,
            Self::Constant => ElementBucket::Constants,
            Self::Class
            | Self::Struct
            | Self::Enum
            | Self::Interface
            | Self::Trait
            | Self::Impl
            | Self::TypeAlias
            | Self::Module => ElementBucket::Types,
        }
    }

    /// The scope a declaration of this kind opens for its children.
    #[must_use]
    pub const fn opens_scope(self) -> Scope {
        match self {
            Self::Function | Self::Method => Scope::Function,
            Self::Class
            | Self::Struct
            | Self::Enum
            | Self::Interface
            | Self::Trait
            | Self::Impl => Scope::Class,
            Self::Module => Scope::Module,
            Self::TypeAlias
            | Self::Variable
            | Self::Constant
            | Self::Field
            | Self::Import
            | Self::Export
            | Self::Macro => Scope::Block,
        }
    }

    /// Module plumbing that is coherent as a group even without call links.
    #[must_use]
    pub const fn is_ambient(self) -> bool {
        matches!(self, Self::Import | Self::Export)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// The kind of container an entity is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Module,
    Class,
    Function,
    Block,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ElementBucket
// ---------------------------------------------------------------------------

/// Output grouping of entity kinds in a responsibility block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementBucket {
    Functions,
    State,
    Imports,
    Types,
    Constants,
}

// ---------------------------------------------------------------------------
// Severity / IssueCategory
// ---------------------------------------------------------------------------

/// Weight class of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Major,
    Minor,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which check raised a required change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// An entity is missing from every block or sits in more than one.
    Coverage,
    /// A block mixes unrelated concerns.
    OverCollapse,
    /// An entity is separated from the block it has affinity with.
    UnderGrouping,
    /// A block holds no entities.
    EmptyBlock,
    /// Raised by the validator oracle's review.
    Oracle,
}

impl IssueCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coverage => "coverage",
            Self::OverCollapse => "over_collapse",
            Self::UnderGrouping => "under_grouping",
            Self::EmptyBlock => "empty_block",
            Self::Oracle => "oracle",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OracleRole
// ---------------------------------------------------------------------------

/// Which side of the negotiation an oracle call serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OracleRole {
    Proposer,
    Validator,
}

impl OracleRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proposer => "proposer",
            Self::Validator => "validator",
        }
    }
}

impl fmt::Display for OracleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TerminationReason
// ---------------------------------------------------------------------------

/// Terminal state of the negotiation loop.
///
/// ```text
/// init → iterating → approved
///                  → max_iterations
///                  → insufficient_progress
///                  → fatal_error
///                  → cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationReason {
    Approved,
    MaxIterations,
    InsufficientProgress,
    FatalError,
    Cancelled,
}

impl TerminationReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::MaxIterations => "MAX_ITERATIONS",
            Self::InsufficientProgress => "INSUFFICIENT_PROGRESS",
            Self::FatalError => "FATAL_ERROR",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a loop ended in `FATAL_ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FatalCause {
    /// The final failed oracle call exceeded its timeout.
    Timeout,
    /// The final failed oracle call returned a transport, API, or contract error.
    Oracle,
}

impl FatalCause {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::Oracle => "ORACLE",
        }
    }
}

impl fmt::Display for FatalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
