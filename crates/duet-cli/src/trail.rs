//! JSONL negotiation trail.
//!
//! `duet analyze --trail FILE` appends one `IterationRecord` per line, so
//! repeated runs over the same file accumulate in one place.

use std::path::PathBuf;

use anyhow::Context;
use duet_core::entities::IterationRecord;

use crate::schema::SchemaRegistry;

pub struct TrailWriter {
    path: PathBuf,
}

impl TrailWriter {
    /// Creates the parent directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created.
    pub fn new(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create trail directory {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    /// Append every record, in iteration order.
    ///
    /// Records that do not match the `iteration_record` schema are still
    /// written; the mismatch is only logged.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn append_all(&self, records: &[IterationRecord], schema: &SchemaRegistry) -> anyhow::Result<()> {
        for record in records {
            let checked = serde_json::to_value(record)
                .map_err(anyhow::Error::from)
                .and_then(|value| schema.validate("iteration_record", &value));
            if let Err(error) = checked {
                tracing::warn!(iteration = record.iteration, %error, "trail record failed schema check");
            }
        }
        serde_jsonlines::append_json_lines(&self.path, records)
            .with_context(|| format!("failed to append trail to {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "trail appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use duet_config::DuetConfig;
    use duet_negotiate::Analyzer;
    use duet_parser::Language;
    use tokio_util::sync::CancellationToken;

    use super::*;

    async fn history() -> Vec<IterationRecord> {
        let analyzer = Analyzer::from_config(DuetConfig::default()).unwrap();
        let source = "import os\n\n\ndef load(path):\n    return os.path.exists(path)\n";
        analyzer
            .analyze(source, Language::Python, &CancellationToken::new())
            .await
            .unwrap()
            .outcome
            .history
    }

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trails").join("run.jsonl");
        let writer = TrailWriter::new(path.clone()).unwrap();
        let records = history().await;
        assert!(!records.is_empty());

        let registry = SchemaRegistry::new();
        writer.append_all(&records, &registry).unwrap();
        writer.append_all(&records, &registry).unwrap();

        let read: Vec<IterationRecord> = serde_jsonlines::json_lines(&path)
            .unwrap()
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(read.len(), records.len() * 2);
        assert_eq!(read[0].iteration, records[0].iteration);
        assert_eq!(read[0].hypothesis, records[0].hypothesis);
    }

    #[test]
    fn bare_file_name_needs_no_directory() {
        assert!(TrailWriter::new(PathBuf::from("trail.jsonl")).is_ok());
    }
}
