//! ast-grep wrapper, supported languages, and language detection from file
//! extensions.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_language::{LanguageExt, SupportLang};
use serde::{Deserialize, Serialize};

use crate::error::ParserError;

/// The concrete AST tree type returned by [`parse_source`].
pub type AstTree = ast_grep_core::AstGrep<StrDoc<SupportLang>>;

/// A node of an [`AstTree`].
pub type SyntaxNode<'r> = ast_grep_core::Node<'r, StrDoc<SupportLang>>;

/// Languages the entity graph builder has an adapter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    Tsx,
    JavaScript,
    Go,
}

impl Language {
    pub const ALL: [Self; 6] = [
        Self::Rust,
        Self::Python,
        Self::TypeScript,
        Self::Tsx,
        Self::JavaScript,
        Self::Go,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Go => "go",
        }
    }

    #[must_use]
    pub const fn support_lang(self) -> SupportLang {
        match self {
            Self::Rust => SupportLang::Rust,
            Self::Python => SupportLang::Python,
            Self::TypeScript => SupportLang::TypeScript,
            Self::Tsx => SupportLang::Tsx,
            Self::JavaScript => SupportLang::JavaScript,
            Self::Go => SupportLang::Go,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rust" | "rs" => Ok(Self::Rust),
            "python" | "py" => Ok(Self::Python),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            "javascript" | "js" | "jsx" => Ok(Self::JavaScript),
            "go" | "golang" => Ok(Self::Go),
            _ => Err(ParserError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Detect the language from a file path extension.
///
/// # Errors
///
/// Returns [`ParserError::UnsupportedLanguage`] for unknown or missing extensions.
pub fn detect_language(path: impl AsRef<Path>) -> Result<Language, ParserError> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        "rs" => Ok(Language::Rust),
        "py" => Ok(Language::Python),
        "ts" => Ok(Language::TypeScript),
        "tsx" => Ok(Language::Tsx),
        "js" | "mjs" | "cjs" | "jsx" => Ok(Language::JavaScript),
        "go" => Ok(Language::Go),
        _ => Err(ParserError::UnsupportedLanguage(path.display().to_string())),
    }
}

/// Parse source code into an ast-grep tree for the given language.
#[must_use]
pub fn parse_source(source: &str, language: Language) -> AstTree {
    language.support_lang().ast_grep(source)
}

/// Fail when the tree contains an `ERROR` node or a node tree-sitter
/// inserted as `MISSING` during recovery.
///
/// # Errors
///
/// Returns [`ParserError::ParseFailed`] naming the first such node in
/// document order.
pub fn ensure_parsed(tree: &AstTree, language: Language) -> Result<(), ParserError> {
    let root = tree.root();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let message = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                let snippet: String = node.text().chars().take(40).collect();
                format!("unexpected syntax near `{}`", snippet.trim())
            };
            return Err(ParserError::ParseFailed {
                language: language.to_string(),
                line: node.start_pos().line() + 1,
                message,
            });
        }
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
    }
    if root.get_inner_node().has_error() {
        return Err(ParserError::ParseFailed {
            language: language.to_string(),
            line: 1,
            message: "source does not parse".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("src/main.rs", Language::Rust)]
    #[case("app.py", Language::Python)]
    #[case("index.ts", Language::TypeScript)]
    #[case("app.tsx", Language::Tsx)]
    #[case("util.js", Language::JavaScript)]
    #[case("util.mjs", Language::JavaScript)]
    #[case("util.cjs", Language::JavaScript)]
    #[case("view.jsx", Language::JavaScript)]
    #[case("main.go", Language::Go)]
    fn detects_supported_extensions(#[case] path: &str, #[case] expected: Language) {
        assert_eq!(detect_language(path).unwrap(), expected);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            detect_language("data.csv"),
            Err(ParserError::UnsupportedLanguage(_))
        ));
        assert!(detect_language("Makefile").is_err());
    }

    #[test]
    fn language_names_roundtrip() {
        for language in Language::ALL {
            assert_eq!(language.as_str().parse::<Language>().unwrap(), language);
        }
        assert_eq!("PY".parse::<Language>().unwrap(), Language::Python);
    }

    #[test]
    fn parse_source_produces_valid_tree() {
        let tree = parse_source("fn hello() {}", Language::Rust);
        assert_eq!(tree.root().kind().as_ref(), "source_file");
        assert!(ensure_parsed(&tree, Language::Rust).is_ok());
    }

    #[test]
    fn broken_source_reports_line() {
        let tree = parse_source("def ok():\n    pass\n\ndef broken(:\n", Language::Python);
        let err = ensure_parsed(&tree, Language::Python).unwrap_err();
        match err {
            ParserError::ParseFailed { language, line, .. } => {
                assert_eq!(language, "python");
                assert!((1..=4).contains(&line), "line {line}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case::unclosed_parameters("def ok():\n    pass\n\ndef broken(:\n", Language::Python)]
    #[case::unclosed_call("def f():\n    return g(1\n", Language::Python)]
    #[case::missing_brace("fn main() {\n    let x = 1;\n", Language::Rust)]
    #[case::missing_paren("function f( {\n}\n", Language::JavaScript)]
    fn recovered_trees_are_rejected(#[case] source: &str, #[case] language: Language) {
        let tree = parse_source(source, language);
        assert!(
            matches!(
                ensure_parsed(&tree, language),
                Err(ParserError::ParseFailed { .. })
            ),
            "{source:?} should not parse"
        );
    }
}
