//! # duet-parser
//!
//! Entity graph extraction for duet, built on ast-grep.
//!
//! Turns one source file into a flat, pre-ordered list of named
//! declarations with their hierarchy, calls, and comments:
//! - **Adapters** (Rust, Python, TypeScript/TSX/JavaScript, Go) classify
//!   syntax nodes as declarations and calls
//! - **Builder** walks the tree iteratively, so nesting depth is bounded
//!   only by configuration, never by the call stack
//!
//! Unparsable source is an error; a partial graph is never returned.

pub mod adapters;
pub mod builder;
pub mod error;
mod lines;
pub mod parser;

pub use builder::{DEFAULT_MAX_DEPTH, GraphBuilder};
pub use error::ParserError;
pub use parser::{Language, detect_language};

/// Build the entity graph of `source` with default settings.
///
/// # Errors
///
/// See [`GraphBuilder::build`].
pub fn build_entity_graph(
    source: &str,
    language: Language,
) -> Result<duet_core::entities::EntityGraph, ParserError> {
    GraphBuilder::new().build(source, language)
}
