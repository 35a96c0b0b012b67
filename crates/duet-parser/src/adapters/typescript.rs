//! TypeScript, TSX, and JavaScript adapter.
//!
//! The three grammars share node kinds for everything extracted here, so one
//! adapter serves all of them. `export` wrappers and member decorators
//! belong to the declaration they wrap; `/** ... */` blocks become
//! docstrings.

use duet_core::enums::EntityKind;

use super::helpers::{
    field_text, is_upper_snake, normalize_whitespace, range_start, signature_until, tidy_lines,
    unquote,
};
use super::{DeclContext, Declaration, LanguageAdapter};
use crate::parser::{Language, SyntaxNode};

const WRAPPERS: &[&str] = &["export_statement"];
const VARIABLE_WRAPPERS: &[&str] = &["lexical_declaration", "variable_declaration", "export_statement"];
const PREFIXES: &[&str] = &["decorator"];

const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function",
    "function_expression",
    "generator_function",
];

pub struct TypeScriptAdapter {
    language: Language,
}

impl TypeScriptAdapter {
    pub const TYPESCRIPT: Self = Self {
        language: Language::TypeScript,
    };
    pub const TSX: Self = Self {
        language: Language::Tsx,
    };
    pub const JAVASCRIPT: Self = Self {
        language: Language::JavaScript,
    };
}

impl LanguageAdapter for TypeScriptAdapter {
    fn language(&self) -> Language {
        self.language
    }

    fn declaration(&self, node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
        let kind = match node.kind().as_ref() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                EntityKind::Function
            }
            "class_declaration" | "abstract_class_declaration" => EntityKind::Class,
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                EntityKind::Method
            }
            "interface_declaration" => EntityKind::Interface,
            "type_alias_declaration" => EntityKind::TypeAlias,
            "enum_declaration" => EntityKind::Enum,
            "internal_module" | "module" => EntityKind::Module,
            "property_signature" => EntityKind::Field,
            "public_field_definition" | "field_definition" => return class_field(node),
            "variable_declarator" => return variable(node, ctx),
            "pair" => return object_member(node, ctx),
            "shorthand_property_identifier" => return shorthand_member(node, ctx),
            "import_statement" => return import(node),
            "export_statement" => return export(node),
            _ => return None,
        };

        let body = node.field("body");
        Some(Declaration {
            name: field_text(node, "name")?,
            kind,
            signature: signature_until(node, body.as_ref()),
            range_start: range_start(node, WRAPPERS, PREFIXES),
            docstring: None,
        })
    }

    fn callee(&self, node: &SyntaxNode<'_>) -> Option<String> {
        match node.kind().as_ref() {
            "call_expression" => field_text(node, "function"),
            "new_expression" => field_text(node, "constructor"),
            _ => None,
        }
    }

    fn doc_from_comments(&self, _name: &str, leading: &str) -> Option<String> {
        let start = leading.rfind("/**")?;
        let block = leading[start + 3..].trim_end();
        let block = block.strip_suffix("*/").unwrap_or(block);
        tidy_lines(block.lines().map(|line| {
            let line = line.trim_start();
            line.strip_prefix('*').unwrap_or(line)
        }))
    }
}

fn binds_function(value: Option<&SyntaxNode<'_>>) -> bool {
    value.is_some_and(|v| FUNCTION_VALUES.contains(&v.kind().as_ref()))
}

/// Members of an object literal bound to a recorded variable or field.
fn in_recorded_object(node: &SyntaxNode<'_>, ctx: DeclContext) -> bool {
    matches!(
        ctx.enclosing,
        Some(EntityKind::Variable | EntityKind::Constant | EntityKind::Field)
    ) && node
        .parent()
        .is_some_and(|p| p.kind().as_ref() == "object")
}

fn class_field(node: &SyntaxNode<'_>) -> Option<Declaration> {
    let name = field_text(node, "name").or_else(|| field_text(node, "property"))?;
    let value = node.field("value");
    let kind = if binds_function(value.as_ref()) {
        EntityKind::Method
    } else {
        EntityKind::Field
    };
    let body = value.as_ref().and_then(|v| v.field("body"));
    Some(Declaration {
        name,
        kind,
        signature: signature_until(node, body.as_ref()),
        range_start: range_start(node, &[], PREFIXES),
        docstring: None,
    })
}

/// `const x = ...`: every binding at module level, function values anywhere.
fn variable(node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
    let name = field_text(node, "name")?;
    let value = node.field("value");
    let is_function = binds_function(value.as_ref());
    if ctx.enclosing.is_some() && !is_function {
        return None;
    }

    let is_const = node
        .parent()
        .is_some_and(|p| p.text().trim_start().starts_with("const"));
    let kind = if is_function {
        EntityKind::Function
    } else if is_const && is_upper_snake(&name) {
        EntityKind::Constant
    } else {
        EntityKind::Variable
    };

    let body = value.as_ref().and_then(|v| v.field("body"));
    Some(Declaration {
        name,
        kind,
        signature: signature_until(node, body.as_ref()),
        range_start: range_start(node, VARIABLE_WRAPPERS, &[]),
        docstring: None,
    })
}

fn object_member(node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
    if !in_recorded_object(node, ctx) {
        return None;
    }
    let key = node.field("key")?;
    let name = if key.kind().as_ref() == "string" {
        unquote(&key.text())
    } else {
        key.text().to_string()
    };
    let value = node.field("value");
    let kind = if binds_function(value.as_ref()) {
        EntityKind::Method
    } else {
        EntityKind::Field
    };
    let body = value.as_ref().and_then(|v| v.field("body"));
    Some(Declaration {
        name,
        kind,
        signature: signature_until(node, body.as_ref()),
        range_start: node.range().start,
        docstring: None,
    })
}

fn shorthand_member(node: &SyntaxNode<'_>, ctx: DeclContext) -> Option<Declaration> {
    if !in_recorded_object(node, ctx) {
        return None;
    }
    let name = node.text().to_string();
    Some(Declaration {
        signature: name.clone(),
        name,
        kind: EntityKind::Field,
        range_start: node.range().start,
        docstring: None,
    })
}

fn import(node: &SyntaxNode<'_>) -> Option<Declaration> {
    Some(Declaration {
        name: unquote(&field_text(node, "source")?),
        kind: EntityKind::Import,
        signature: signature_until(node, None),
        range_start: node.range().start,
        docstring: None,
    })
}

/// Re-exports and `export default <expr>`; exported declarations are
/// recorded as themselves.
fn export(node: &SyntaxNode<'_>) -> Option<Declaration> {
    if node.field("declaration").is_some() {
        return None;
    }
    let text = node.text();
    let rest = text
        .trim_start()
        .strip_prefix("export")
        .unwrap_or(text.as_ref());
    let name = normalize_whitespace(rest.trim().trim_end_matches(';'));
    (!name.is_empty()).then(|| Declaration {
        name,
        kind: EntityKind::Export,
        signature: signature_until(node, None),
        range_start: node.range().start,
        docstring: None,
    })
}
