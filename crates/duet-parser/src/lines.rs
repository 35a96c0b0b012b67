//! Byte offset to line number mapping.

/// Start offsets of every line in a source text.
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    /// 0-based line containing `offset`.
    pub(crate) fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }

    /// 0-based line of the last non-whitespace byte in `start..end`.
    ///
    /// Several grammars let a node swallow its trailing newline; this keeps
    /// such nodes on the line where their text actually ends.
    pub(crate) fn last_line(&self, source: &str, start: usize, end: usize) -> usize {
        let bytes = source.as_bytes();
        let mut end = end.min(bytes.len());
        while end > start && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        self.line_of(end.saturating_sub(1).max(start))
    }

    /// Only whitespace precedes `offset` on its line.
    pub(crate) fn starts_line(&self, source: &str, offset: usize) -> bool {
        let line_start = self.starts[self.line_of(offset)];
        source
            .get(line_start..offset)
            .is_some_and(|prefix| prefix.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_lines() {
        let source = "ab\ncd\n\nef";
        let index = LineIndex::new(source);
        assert_eq!(index.line_of(0), 0);
        assert_eq!(index.line_of(2), 0);
        assert_eq!(index.line_of(3), 1);
        assert_eq!(index.line_of(6), 2);
        assert_eq!(index.line_of(7), 3);
    }

    #[test]
    fn last_line_ignores_trailing_newline() {
        let source = "/// doc\nfn f() {}\n";
        let index = LineIndex::new(source);
        assert_eq!(index.last_line(source, 0, 8), 0);
        assert_eq!(index.last_line(source, 8, source.len()), 1);
    }

    #[test]
    fn detects_own_line_offsets() {
        let source = "x = 1  # note\n    # own\n";
        let index = LineIndex::new(source);
        assert!(!index.starts_line(source, 7));
        assert!(index.starts_line(source, 18));
    }
}
