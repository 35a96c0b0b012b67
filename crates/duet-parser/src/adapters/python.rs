//! Python adapter.
//!
//! Functions, classes, module and class level assignments, imports, and
//! function-local lambdas. Decorators belong to the definition they wrap.

use duet_core::enums::EntityKind;

use super::helpers::{field_text, is_upper_snake, range_start, signature_until, tidy_lines, unquote};
use super::{DeclContext, Declaration, LanguageAdapter};
use crate::parser::{Language, SyntaxNode};

const WRAPPERS: &[&str] = &["decorated_definition"];

pub struct PythonAdapter;

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn declaration(&self, node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
        match node.kind().as_ref() {
            "function_definition" => {
                let kind = if ctx.enclosing == Some(EntityKind::Class) {
                    EntityKind::Method
                } else {
                    EntityKind::Function
                };
                definition(node, kind)
            }
            "class_definition" => definition(node, EntityKind::Class),
            "assignment" => assignment(node, ctx),
            "import_statement" => {
                let names: Vec<String> = node
                    .children()
                    .filter(|c| matches!(c.kind().as_ref(), "dotted_name" | "aliased_import"))
                    .map(|c| c.text().to_string())
                    .collect();
                import(node, names.join(", "))
            }
            "import_from_statement" => import(node, field_text(node, "module_name")?),
            _ => None,
        }
    }

    fn callee(&self, node: &SyntaxNode<'_>) -> Option<String> {
        (node.kind().as_ref() == "call")
            .then(|| field_text(node, "function"))
            .flatten()
    }
}

fn definition(node: &SyntaxNode<'_>, kind: EntityKind) -> Option<Declaration> {
    let body = node.field("body");
    Some(Declaration {
        name: field_text(node, "name")?,
        kind,
        signature: signature_until(node, body.as_ref()),
        range_start: range_start(node, WRAPPERS, &[]),
        docstring: body.as_ref().and_then(docstring),
    })
}

/// `x = ...` or `x: T = ...` with a plain identifier target.
fn assignment(node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
    if node.parent()?.kind().as_ref() != "expression_statement" {
        return None;
    }
    let left = node.field("left")?;
    if left.kind().as_ref() != "identifier" {
        return None;
    }
    let name = left.text().to_string();
    let binds_lambda = node
        .field("right")
        .is_some_and(|r| r.kind().as_ref() == "lambda");

    let kind = match ctx.enclosing {
        _ if binds_lambda => EntityKind::Function,
        None if is_upper_snake(&name) => EntityKind::Constant,
        None => EntityKind::Variable,
        Some(EntityKind::Class) => EntityKind::Field,
        _ => return None,
    };

    Some(Declaration {
        name,
        kind,
        signature: signature_until(node, None),
        range_start: node.range().start,
        docstring: None,
    })
}

fn import(node: &SyntaxNode<'_>, name: String) -> Option<Declaration> {
    (!name.is_empty()).then(|| Declaration {
        name,
        kind: EntityKind::Import,
        signature: signature_until(node, None),
        range_start: node.range().start,
        docstring: None,
    })
}

/// A string literal as the first statement of a body.
fn docstring(body: &SyntaxNode<'_>) -> Option<String> {
    let first = body.children().find(|c| c.kind().as_ref() != "comment")?;
    if first.kind().as_ref() != "expression_statement" {
        return None;
    }
    let literal = first.children().next()?;
    if literal.kind().as_ref() != "string" {
        return None;
    }
    tidy_lines(unquote(&literal.text()).lines())
}
