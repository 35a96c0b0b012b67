//! # duet-negotiate
//!
//! The proposer/validator negotiation that partitions an entity graph into
//! responsibility blocks.
//!
//! - **Oracle**: the async seam to the external reasoning procedure, with
//!   HTTP, local, and scripted adapters plus the payload contract
//! - **Proposer**: asks for a partition and repairs its coverage
//! - **Validator**: coverage, structural quality, claim verification, and
//!   regression checks folded into one confidence score
//! - **Controller**: the bounded loop with stall detection, per-call
//!   timeouts, per-iteration retries, and cooperative cancellation
//! - **Pipeline**: [`Analyzer`], source text in, responsibility map out

pub mod affinity;
pub mod claims;
pub mod controller;
pub mod error;
pub mod oracle;
pub mod pipeline;
pub mod proposer;
pub mod validator;

pub use controller::{LoopController, stalled};
pub use error::{AnalysisError, OracleError};
pub use oracle::{HttpOracle, LocalOracle, Oracle, OracleRequest, ScriptedOracle, Step};
pub use pipeline::{Analysis, Analyzer};
pub use proposer::Proposer;
pub use validator::Validator;
