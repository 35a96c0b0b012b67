//! The entity graph builder.
//!
//! One iterative pre-order walk over the syntax tree. Each work item
//! carries the entity that encloses it, so the work stack doubles as the
//! parent stack and nesting depth never touches the call stack. Comments
//! are collected during the walk and attached afterwards; calls are
//! collected as raw callee text and resolved once every name is known.

mod calls;
mod comments;

use std::path::Path;

use duet_core::entities::{Entity, EntityGraph, LineRange};
use duet_core::enums::{EntityKind, Scope};
use tracing::debug;

use self::calls::{NameTable, entity_id};
use self::comments::{CommentNode, EntityLines};
use crate::adapters::{DeclContext, adapter_for};
use crate::error::ParserError;
use crate::lines::LineIndex;
use crate::parser::{Language, SyntaxNode, detect_language, ensure_parsed, parse_source};

/// Default bound on declaration nesting.
pub const DEFAULT_MAX_DEPTH: u32 = 4096;

/// Builds an [`EntityGraph`] from source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphBuilder {
    max_depth: u32,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk state shared by all nodes below one entity.
#[derive(Debug, Clone, Copy)]
struct Frame {
    parent: Option<usize>,
    enclosing: Option<EntityKind>,
    /// Depth of entities declared directly in this frame.
    depth: u32,
}

impl Frame {
    const FILE: Self = Self {
        parent: None,
        enclosing: None,
        depth: 0,
    };
}

struct Pending {
    name: String,
    kind: EntityKind,
    signature: String,
    docstring: Option<String>,
    depth: u32,
    scope: Scope,
    parent: Option<usize>,
    children: Vec<usize>,
    raw_calls: Vec<String>,
    lines: EntityLines,
}

impl GraphBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Deepest entity depth accepted before failing with
    /// [`ParserError::NestingTooDeep`].
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Read `path` and build its graph, detecting the language from the
    /// extension unless one is given.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::Io`] when the file cannot be read, plus every
    /// error of [`GraphBuilder::build`].
    pub fn build_file(
        &self,
        path: impl AsRef<Path>,
        language: Option<Language>,
    ) -> Result<EntityGraph, ParserError> {
        let path = path.as_ref();
        let language = match language {
            Some(language) => language,
            None => detect_language(path)?,
        };
        let source = std::fs::read_to_string(path)?;
        self.build(&source, language)
    }

    /// Extract every named declaration of `source`, at every depth.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::ParseFailed`] when the source does not parse
    /// cleanly and [`ParserError::NestingTooDeep`] when declarations nest
    /// beyond the configured bound. No partial graph is ever returned.
    pub fn build(&self, source: &str, language: Language) -> Result<EntityGraph, ParserError> {
        let tree = parse_source(source, language);
        ensure_parsed(&tree, language)?;

        let adapter = adapter_for(language);
        let index = LineIndex::new(source);
        let mut pending: Vec<Pending> = Vec::new();
        let mut comments: Vec<CommentNode> = Vec::new();

        let mut stack: Vec<(SyntaxNode<'_>, Frame)> = vec![(tree.root(), Frame::FILE)];
        while let Some((node, frame)) = stack.pop() {
            if adapter.is_comment(node.kind().as_ref()) {
                comments.push(comment_node(&node, source, &index));
                continue;
            }

            if let (Some(parent), Some(callee)) = (frame.parent, adapter.callee(&node)) {
                pending[parent].raw_calls.push(callee);
            }

            let mut inner = frame;
            let ctx = DeclContext {
                enclosing: frame.enclosing,
            };
            if let Some(decl) = adapter.declaration(&node, ctx) {
                if frame.depth > self.max_depth {
                    return Err(ParserError::NestingTooDeep {
                        limit: self.max_depth,
                        line: node.start_pos().line() + 1,
                    });
                }
                let range = node.range();
                let id = pending.len();
                if let Some(parent) = frame.parent {
                    pending[parent].children.push(id);
                }
                pending.push(Pending {
                    name: decl.name,
                    kind: decl.kind,
                    signature: decl.signature,
                    docstring: decl.docstring,
                    depth: frame.depth,
                    scope: frame.enclosing.map_or(Scope::Module, EntityKind::opens_scope),
                    parent: frame.parent,
                    children: Vec::new(),
                    raw_calls: Vec::new(),
                    lines: EntityLines {
                        first: index.line_of(decl.range_start),
                        declared: index.line_of(range.start),
                        last: index.last_line(source, range.start, range.end),
                    },
                });
                inner = Frame {
                    parent: Some(id),
                    enclosing: Some(decl.kind),
                    depth: frame.depth + 1,
                };
            }

            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, inner)));
        }

        let comment_count = comments.len();
        let graph = assemble(pending, &comments, language)?;
        debug!(
            language = %language,
            entities = graph.len(),
            comments = comment_count,
            "built entity graph"
        );
        Ok(graph)
    }
}

fn comment_node(node: &SyntaxNode<'_>, source: &str, index: &LineIndex) -> CommentNode {
    let range = node.range();
    CommentNode {
        start_line: index.line_of(range.start),
        end_line: index.last_line(source, range.start, range.end),
        own_line: index.starts_line(source, range.start),
        text: node.text().trim_end().to_string(),
    }
}

fn assemble(
    pending: Vec<Pending>,
    comments: &[CommentNode],
    language: Language,
) -> Result<EntityGraph, ParserError> {
    let adapter = adapter_for(language);
    let spans: Vec<EntityLines> = pending.iter().map(|p| p.lines).collect();
    let slots = comments::attach(comments, &spans);

    let names: Vec<String> = pending.iter().map(|p| p.name.clone()).collect();
    let kinds: Vec<EntityKind> = pending.iter().map(|p| p.kind).collect();
    let parents: Vec<Option<usize>> = pending.iter().map(|p| p.parent).collect();
    let table = NameTable::new(&names, &kinds, &parents);

    let entities = pending
        .into_iter()
        .zip(slots)
        .enumerate()
        .map(|(index, (p, comments))| {
            let calls = table.resolve_all(index, &p.raw_calls);
            let docstring = p.docstring.or_else(|| {
                comments
                    .leading
                    .as_deref()
                    .and_then(|leading| adapter.doc_from_comments(&p.name, leading))
            });
            Entity {
                id: entity_id(index),
                name: p.name,
                kind: p.kind,
                signature_text: p.signature,
                line_range: LineRange(line_number(p.lines.first), line_number(p.lines.last)),
                depth: p.depth,
                scope: p.scope,
                parent_id: p.parent.map(entity_id),
                children_ids: p.children.into_iter().map(entity_id).collect(),
                calls,
                comments,
                docstring,
            }
        })
        .collect();

    Ok(EntityGraph::new(language.as_str(), entities)?)
}

/// 0-based line index to 1-based line number.
fn line_number(line: usize) -> u32 {
    u32::try_from(line + 1).unwrap_or(u32::MAX)
}
