//! Parser error types for duet-parser.

/// Errors that can occur while turning source text into an entity graph.
///
/// None of these ever come with a partial graph.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("Parse failed for {language} at line {line}: {message}")]
    ParseFailed {
        language: String,
        line: usize,
        message: String,
    },

    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Declarations nested deeper than {limit} levels (line {line})")]
    NestingTooDeep { limit: u32, line: usize },

    #[error("Extracted graph is inconsistent: {0}")]
    InvalidGraph(#[from] duet_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
