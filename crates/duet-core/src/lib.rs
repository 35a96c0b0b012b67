//! # duet-core
//!
//! Core types and the partition model for duet.
//!
//! This crate provides the foundational types shared across all duet crates:
//! - The entity graph: named declarations with hierarchy, calls, and comments
//! - Partition types: blocks, hypotheses, validation reports, iteration records
//! - The coverage check shared by the proposer and the validator
//! - Status enums and termination reasons
//! - The request-level output schema returned at the service boundary
//! - Cross-cutting error types

pub mod coverage;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod responses;

pub use coverage::{CoverageGap, validate_coverage};
pub use errors::CoreError;
pub use ids::EntityId;
