//! Rust adapter.
//!
//! Items at every depth, struct fields, `use` declarations, and `let`
//! bindings of closures. Outer attributes belong to the item they precede;
//! `///` blocks become docstrings.

use duet_core::enums::EntityKind;

use super::helpers::{field_text, range_start, signature_until, tidy_lines};
use super::{DeclContext, Declaration, LanguageAdapter};
use crate::parser::{Language, SyntaxNode};

const PREFIXES: &[&str] = &["attribute_item"];

pub struct RustAdapter;

impl LanguageAdapter for RustAdapter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn declaration(&self, node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
        let kind = match node.kind().as_ref() {
            "function_item" | "function_signature_item" => {
                if matches!(ctx.enclosing, Some(EntityKind::Impl | EntityKind::Trait)) {
                    EntityKind::Method
                } else {
                    EntityKind::Function
                }
            }
            "struct_item" | "union_item" => EntityKind::Struct,
            "enum_item" => EntityKind::Enum,
            "trait_item" => EntityKind::Trait,
            "impl_item" => return impl_block(node),
            "type_item" => EntityKind::TypeAlias,
            "mod_item" => EntityKind::Module,
            "const_item" => EntityKind::Constant,
            "static_item" => EntityKind::Variable,
            "macro_definition" => EntityKind::Macro,
            "field_declaration" => EntityKind::Field,
            "use_declaration" => return use_declaration(node),
            "let_declaration" => return closure_binding(node),
            _ => return None,
        };

        let body = node.field("body");
        Some(Declaration {
            name: field_text(node, "name")?,
            kind,
            signature: signature_until(node, body.as_ref()),
            range_start: range_start(node, &[], PREFIXES),
            docstring: None,
        })
    }

    fn callee(&self, node: &SyntaxNode<'_>) -> Option<String> {
        match node.kind().as_ref() {
            "call_expression" => field_text(node, "function"),
            "macro_invocation" => field_text(node, "macro").map(|m| format!("{m}!")),
            _ => None,
        }
    }

    fn doc_from_comments(&self, _name: &str, leading: &str) -> Option<String> {
        tidy_lines(
            leading
                .lines()
                .filter_map(|line| line.trim_start().strip_prefix("///")),
        )
    }
}

/// `impl Trait for Type` is named after `Type`.
fn impl_block(node: &SyntaxNode<'_>) -> Option<Declaration> {
    let body = node.field("body");
    Some(Declaration {
        name: field_text(node, "type")?,
        kind: EntityKind::Impl,
        signature: signature_until(node, body.as_ref()),
        range_start: range_start(node, &[], PREFIXES),
        docstring: None,
    })
}

fn use_declaration(node: &SyntaxNode<'_>) -> Option<Declaration> {
    Some(Declaration {
        name: field_text(node, "argument")?,
        kind: EntityKind::Import,
        signature: signature_until(node, None),
        range_start: range_start(node, &[], PREFIXES),
        docstring: None,
    })
}

/// `let name = |..| ...;` anywhere.
fn closure_binding(node: &SyntaxNode<'_>) -> Option<Declaration> {
    let value = node.field("value")?;
    if value.kind().as_ref() != "closure_expression" {
        return None;
    }
    let body = value.field("body");
    Some(Declaration {
        name: field_text(node, "pattern")?,
        kind: EntityKind::Function,
        signature: signature_until(node, body.as_ref()),
        range_start: node.range().start,
        docstring: None,
    })
}
