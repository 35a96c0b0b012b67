//! Entity graph and partition types.
//!
//! All structs derive `Serialize` and `Deserialize` for JSON round-trips;
//! everything that crosses the oracle boundary also derives `JsonSchema`.

mod block;
mod entity;
mod graph;
mod hypothesis;
mod record;
mod report;

pub use block::{Block, derive_ranges, merge_ranges};
pub use entity::{CallRef, Comments, Entity, LineRange};
pub use graph::{EntityGraph, EntitySummary, GraphSummary};
pub use hypothesis::{FeedbackClaim, Hypothesis};
pub use record::{IterationRecord, OracleExchange};
pub use report::{EntityRef, RequiredChange, ValidationReport};
