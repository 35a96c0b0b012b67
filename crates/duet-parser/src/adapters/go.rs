//! Go adapter.
//!
//! Functions, methods, type specs with their struct fields and interface
//! methods, constants, package variables, imports, and function literals
//! bound to local names. A leading comment block that starts with the
//! declared name is its doc comment.

use duet_core::enums::EntityKind;

use super::helpers::{field_text, range_start, signature_until, tidy_lines, unquote};
use super::{DeclContext, Declaration, LanguageAdapter};
use crate::parser::{Language, SyntaxNode};

pub struct GoAdapter;

impl LanguageAdapter for GoAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn declaration(&self, node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
        let kind = match node.kind().as_ref() {
            "function_declaration" => EntityKind::Function,
            "method_declaration" | "method_elem" | "method_spec" => EntityKind::Method,
            "type_spec" => return type_spec(node),
            "type_alias" => EntityKind::TypeAlias,
            "field_declaration" => return field(node),
            "const_spec" => return spec(node, EntityKind::Constant),
            "var_spec" => return var_spec(node, ctx),
            "short_var_declaration" => return short_var(node),
            "import_spec" => return import(node),
            _ => return None,
        };

        let body = node.field("body");
        let signature = signature_until(node, body.as_ref());
        Some(Declaration {
            name: field_text(node, "name")?,
            kind,
            signature: if kind == EntityKind::TypeAlias {
                format!("type {signature}")
            } else {
                signature
            },
            range_start: node.range().start,
            docstring: None,
        })
    }

    fn callee(&self, node: &SyntaxNode<'_>) -> Option<String> {
        (node.kind().as_ref() == "call_expression")
            .then(|| field_text(node, "function"))
            .flatten()
    }

    fn doc_from_comments(&self, name: &str, leading: &str) -> Option<String> {
        let doc = tidy_lines(leading.lines().map(|line| {
            let line = line.trim_start();
            line.strip_prefix("//").unwrap_or(line)
        }))?;
        doc.starts_with(name).then_some(doc)
    }
}

/// `type Name struct {...}`, `type Name interface {...}`, or a named type.
fn type_spec(node: &SyntaxNode<'_>) -> Option<Declaration> {
    let ty = node.field("type");
    let kind = match ty.as_ref().map(|t| t.kind().to_string()).as_deref() {
        Some("struct_type") => EntityKind::Struct,
        Some("interface_type") => EntityKind::Interface,
        _ => EntityKind::TypeAlias,
    };
    let body = ty
        .as_ref()
        .and_then(|t| t.children().find(|c| c.kind().as_ref().ends_with("_list")));
    let signature = match kind {
        EntityKind::TypeAlias => signature_until(node, None),
        _ => signature_until(node, body.as_ref().or(ty.as_ref())),
    };
    Some(Declaration {
        name: field_text(node, "name")?,
        kind,
        signature: format!("type {signature}"),
        range_start: range_start(node, &["type_declaration"], &[]),
        docstring: None,
    })
}

/// Struct field; embedded fields are named after their type.
fn field(node: &SyntaxNode<'_>) -> Option<Declaration> {
    let names = identifiers(node, "field_identifier");
    let name = if names.is_empty() {
        field_text(node, "type")?.trim_start_matches('*').to_string()
    } else {
        names
    };
    Some(Declaration {
        name,
        kind: EntityKind::Field,
        signature: signature_until(node, None),
        range_start: node.range().start,
        docstring: None,
    })
}

fn spec(node: &SyntaxNode<'_>, kind: EntityKind) -> Option<Declaration> {
    let name = identifiers(node, "identifier");
    (!name.is_empty()).then(|| Declaration {
        name,
        kind,
        signature: signature_until(node, None),
        range_start: range_start(node, &["const_declaration", "var_declaration"], &[]),
        docstring: None,
    })
}

/// Package variables, and `var f = func(...) {...}` anywhere.
fn var_spec(node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
    if binds_func_literal(node.field("value").as_ref()) {
        return spec(node, EntityKind::Function);
    }
    if ctx.enclosing.is_some() {
        return None;
    }
    spec(node, EntityKind::Variable)
}

/// `name := func(...) {...}`.
fn short_var(node: &SyntaxNode<'_>) -> Option<Declaration> {
    if !binds_func_literal(node.field("right").as_ref()) {
        return None;
    }
    let literal = node
        .field("right")
        .and_then(|r| r.children().find(|c| c.kind().as_ref() == "func_literal"));
    let body = literal.as_ref().and_then(|l| l.field("body"));
    Some(Declaration {
        name: field_text(node, "left")?,
        kind: EntityKind::Function,
        signature: signature_until(node, body.as_ref()),
        range_start: node.range().start,
        docstring: None,
    })
}

fn import(node: &SyntaxNode<'_>) -> Option<Declaration> {
    Some(Declaration {
        name: unquote(&field_text(node, "path")?),
        kind: EntityKind::Import,
        signature: signature_until(node, None),
        range_start: range_start(node, &["import_declaration"], &[]),
        docstring: None,
    })
}

fn binds_func_literal(value: Option<&SyntaxNode<'_>>) -> bool {
    value.is_some_and(|v| {
        v.kind().as_ref() == "func_literal"
            || v.children().any(|c| c.kind().as_ref() == "func_literal")
    })
}

/// Direct children of the given kind, joined with `, `.
fn identifiers(node: &SyntaxNode<'_>, kind: &str) -> String {
    node.children()
        .filter(|c| c.kind().as_ref() == kind)
        .map(|c| c.text().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse_source;

    fn declarations(source: &str) -> Vec<(String, EntityKind)> {
        let tree = parse_source(source, Language::Go);
        let mut found = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            if let Some(decl) = GoAdapter.declaration(&node, DeclContext { enclosing: None }) {
                found.push((decl.name, decl.kind));
            }
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        found
    }

    #[test]
    fn package_level_declarations() {
        let found = declarations(
            "package main\n\nimport \"fmt\"\n\nconst Limit = 3\n\nvar count int\n\ntype Server struct {\n\tName string\n}\n\nfunc (s *Server) Start() error { return nil }\n\nfunc main() { fmt.Println(Limit) }\n",
        );
        assert_eq!(
            found,
            vec![
                ("fmt".to_string(), EntityKind::Import),
                ("Limit".to_string(), EntityKind::Constant),
                ("count".to_string(), EntityKind::Variable),
                ("Server".to_string(), EntityKind::Struct),
                ("Name".to_string(), EntityKind::Field),
                ("Start".to_string(), EntityKind::Method),
                ("main".to_string(), EntityKind::Function),
            ]
        );
    }

    #[test]
    fn doc_comment_must_start_with_name() {
        assert_eq!(
            GoAdapter.doc_from_comments("Start", "// Start boots the server.\n// It blocks."),
            Some("Start boots the server.\nIt blocks.".to_string())
        );
        assert_eq!(GoAdapter.doc_from_comments("Start", "// TODO: tidy"), None);
    }
}
