//! Shared node helpers used by all adapters.

use crate::parser::SyntaxNode;

/// Longest signature kept per entity.
const MAX_SIGNATURE_CHARS: usize = 200;

/// Text of the child in field `name`.
pub fn field_text(node: &SyntaxNode<'_>, name: &str) -> Option<String> {
    node.field(name)
        .map(|n| n.text().to_string())
        .filter(|t| !t.is_empty())
}

/// Declaration header: source text up to the start of `body`, or the first
/// line when there is no body. Whitespace-normalized.
pub fn signature_until(node: &SyntaxNode<'_>, body: Option<&SyntaxNode<'_>>) -> String {
    let text = node.text();
    let node_start = node.range().start;
    let head = body
        .map(|b| b.range().start.saturating_sub(node_start))
        .and_then(|cut| text.get(..cut))
        .unwrap_or_else(|| text.lines().next().unwrap_or_default());

    let normalized = normalize_whitespace(head);
    let trimmed = normalized.trim_end_matches([':', '{']).trim_end();
    match trimmed.char_indices().nth(MAX_SIGNATURE_CHARS) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    }
}

/// Collapse newlines and runs of whitespace to single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset where a declaration's line range begins.
///
/// Climbs through `wrappers` parents (export statements, decorated
/// definitions), then extends over directly preceding `prefixes` siblings
/// (attributes, decorators).
pub fn range_start(node: &SyntaxNode<'_>, wrappers: &[&str], prefixes: &[&str]) -> usize {
    let mut outer = node.clone();
    while let Some(parent) = outer.parent() {
        if !wrappers.contains(&parent.kind().as_ref()) {
            break;
        }
        outer = parent;
    }

    let mut start = outer.range().start;
    let mut current = outer.prev();
    while let Some(sibling) = current {
        if !prefixes.contains(&sibling.kind().as_ref()) {
            break;
        }
        start = sibling.range().start;
        current = sibling.prev();
    }
    start
}

/// `MAX_RETRIES`-style names denote constants.
pub fn is_upper_snake(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Strip a string prefix (`r`, `b`, `f`, ...) and matching quotes from a
/// literal. Text that is not a quoted literal comes back unchanged.
pub fn unquote(text: &str) -> String {
    let unprefixed = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let body = if unprefixed.starts_with(['"', '\'', '`']) {
        unprefixed
    } else {
        text
    };
    for quote in ["\"\"\"", "'''", "\"", "'", "`"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    body.to_string()
}

/// Trim every line and drop blank lines at both ends.
pub fn tidy_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Option<String> {
    let text = lines.map(str::trim).collect::<Vec<_>>().join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Language, parse_source};

    #[test]
    fn signature_stops_at_body() {
        let tree = parse_source("pub fn add(\n    a: u32,\n    b: u32,\n) -> u32 {\n    a + b\n}", Language::Rust);
        let func = tree.root().children().next().unwrap();
        let body = func.field("body");
        assert_eq!(
            signature_until(&func, body.as_ref()),
            "pub fn add( a: u32, b: u32, ) -> u32"
        );
    }

    #[test]
    fn signature_without_body_uses_first_line() {
        let tree = parse_source("const LIMIT: usize = 10;", Language::Rust);
        let item = tree.root().children().next().unwrap();
        assert_eq!(signature_until(&item, None), "const LIMIT: usize = 10;");
    }

    #[test]
    fn upper_snake_detection() {
        assert!(is_upper_snake("MAX_RETRIES"));
        assert!(is_upper_snake("V2"));
        assert!(!is_upper_snake("maxRetries"));
        assert!(!is_upper_snake("_"));
    }

    #[test]
    fn unquote_handles_prefixes_and_triples() {
        assert_eq!(unquote(r#""""Doc.""""#), "Doc.");
        assert_eq!(unquote("r'raw'"), "raw");
        assert_eq!(unquote("\"./util\""), "./util");
        assert_eq!(unquote("`tpl`"), "tpl");
    }

    #[test]
    fn unquote_leaves_bare_identifiers_alone() {
        assert_eq!(unquote("timeout"), "timeout");
        assert_eq!(unquote("retry"), "retry");
        assert_eq!(unquote("fmt"), "fmt");
    }

    #[test]
    fn tidy_lines_trims() {
        assert_eq!(
            tidy_lines("\n  first\n   second  \n\n".lines()),
            Some("first\nsecond".to_string())
        );
        assert_eq!(tidy_lines("   \n".lines()), None);
    }
}
