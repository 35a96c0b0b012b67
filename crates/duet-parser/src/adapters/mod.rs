//! Per-language knowledge of which syntax nodes are declarations and calls.
//!
//! The builder owns the walk, comment attachment, and call resolution;
//! an adapter only classifies single nodes. Nothing downstream of the
//! builder ever branches on language.

mod go;
pub(crate) mod helpers;
mod python;
mod rust;
mod typescript;

use duet_core::enums::EntityKind;

use crate::parser::{Language, SyntaxNode};

/// What the walker knows about the position of a node.
#[derive(Debug, Clone, Copy)]
pub struct DeclContext {
    /// Kind of the nearest enclosing entity, `None` at file level.
    pub enclosing: Option<EntityKind>,
}

impl DeclContext {
    /// Inside a function or method body.
    #[must_use]
    pub const fn in_function(&self) -> bool {
        matches!(
            self.enclosing,
            Some(EntityKind::Function | EntityKind::Method)
        )
    }
}

/// A node recognised as a named declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: EntityKind,
    pub signature: String,
    /// Byte offset where the entity's line range starts; earlier than the
    /// node itself when decorators, attributes, or an export wrapper belong
    /// to it.
    pub range_start: usize,
    /// Docstring found in the declaration's own body.
    pub docstring: Option<String>,
}

/// Entity-walk capability of one language.
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> Language;

    /// Classify `node` as a declaration, or `None` to walk through it.
    fn declaration(&self, node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration>;

    /// Callee text when `node` is a call.
    fn callee(&self, node: &SyntaxNode<'_>) -> Option<String>;

    fn is_comment(&self, kind: &str) -> bool {
        matches!(kind, "comment" | "line_comment" | "block_comment")
    }

    /// Docstring carried by the leading comment block, for languages that
    /// document declarations with comments.
    fn doc_from_comments(&self, _name: &str, _leading: &str) -> Option<String> {
        None
    }
}

/// The adapter for `language`.
#[must_use]
pub fn adapter_for(language: Language) -> &'static dyn LanguageAdapter {
    match language {
        Language::Rust => &rust::RustAdapter,
        Language::Python => &python::PythonAdapter,
        Language::TypeScript => &typescript::TypeScriptAdapter::TYPESCRIPT,
        Language::Tsx => &typescript::TypeScriptAdapter::TSX,
        Language::JavaScript => &typescript::TypeScriptAdapter::JAVASCRIPT,
        Language::Go => &go::GoAdapter,
    }
}
