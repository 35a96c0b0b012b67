//! Request-level entry point: source text in, responsibility map out.

use std::path::Path;
use std::sync::Arc;

use duet_config::{DuetConfig, OracleKind};
use duet_core::entities::EntityGraph;
use duet_core::enums::{FatalCause, TerminationReason};
use duet_core::responses::{AnalysisOutcome, ResponsibilityMap};
use duet_parser::{GraphBuilder, Language};
use tokio_util::sync::CancellationToken;

use crate::controller::LoopController;
use crate::error::{AnalysisError, OracleError};
use crate::oracle::{HttpOracle, LocalOracle, Oracle};

/// A finished analysis: the graph it ran on and the loop's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub graph: EntityGraph,
    pub outcome: AnalysisOutcome,
}

impl Analysis {
    #[must_use]
    pub fn responsibility_map(&self) -> ResponsibilityMap {
        self.outcome.to_responsibility_map(&self.graph)
    }
}

/// Shared analysis service. Cheap to clone; every request gets its own
/// graph, history, and oracle link.
#[derive(Clone)]
pub struct Analyzer {
    oracle: Arc<dyn Oracle>,
    config: DuetConfig,
}

impl Analyzer {
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, config: DuetConfig) -> Self {
        Self { oracle, config }
    }

    /// Build the oracle selected by `config.oracle`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if the HTTP client cannot be constructed.
    pub fn from_config(config: DuetConfig) -> Result<Self, OracleError> {
        let oracle: Arc<dyn Oracle> = match config.oracle.kind {
            OracleKind::Local => Arc::new(LocalOracle::new()),
            OracleKind::Http => Arc::new(HttpOracle::new(
                config.oracle.endpoint.clone(),
                config.oracle.api_key().map(str::to_string),
            )?),
        };
        tracing::debug!(oracle = oracle.name(), "analyzer ready");
        Ok(Self::new(oracle, config))
    }

    #[must_use]
    pub fn config(&self) -> &DuetConfig {
        &self.config
    }

    #[must_use]
    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    fn builder(&self) -> GraphBuilder {
        GraphBuilder::new().with_max_depth(self.config.builder.max_depth)
    }

    /// # Errors
    ///
    /// Returns [`AnalysisError::Parse`] when the source does not parse.
    pub fn build_graph(&self, source: &str, language: Language) -> Result<EntityGraph, AnalysisError> {
        Ok(self.builder().build(source, language)?)
    }

    /// Read and parse `path`; the language comes from its extension unless
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Parse`] when the file cannot be read, its
    /// language is unsupported, or it does not parse.
    pub fn build_graph_from_file(
        &self,
        path: impl AsRef<Path>,
        language: Option<Language>,
    ) -> Result<EntityGraph, AnalysisError> {
        Ok(self.builder().build_file(path, language)?)
    }

    /// Run the negotiation loop over an already built graph.
    pub async fn negotiate(&self, graph: &EntityGraph, cancel: &CancellationToken) -> AnalysisOutcome {
        LoopController::new(self.oracle.as_ref(), &self.config)
            .run(graph, cancel)
            .await
    }

    /// Parse `source` and negotiate its responsibility map.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Parse`] for unparsable source and
    /// [`AnalysisError::Oracle`] when oracle failures ended the loop.
    pub async fn analyze(
        &self,
        source: &str,
        language: Language,
        cancel: &CancellationToken,
    ) -> Result<Analysis, AnalysisError> {
        let graph = self.build_graph(source, language)?;
        self.finish(graph, cancel).await
    }

    /// [`Analyzer::analyze`] for a file on disk.
    ///
    /// # Errors
    ///
    /// As [`Analyzer::build_graph_from_file`] and [`Analyzer::analyze`].
    pub async fn analyze_file(
        &self,
        path: impl AsRef<Path>,
        language: Option<Language>,
        cancel: &CancellationToken,
    ) -> Result<Analysis, AnalysisError> {
        let graph = self.build_graph_from_file(path, language)?;
        self.finish(graph, cancel).await
    }

    async fn finish(&self, graph: EntityGraph, cancel: &CancellationToken) -> Result<Analysis, AnalysisError> {
        tracing::info!(
            language = graph.language(),
            entities = graph.len(),
            "entity graph built"
        );
        let outcome = self.negotiate(&graph, cancel).await;
        if outcome.termination_reason == TerminationReason::FatalError {
            return Err(AnalysisError::Oracle {
                cause: outcome.fatal_cause.unwrap_or(FatalCause::Oracle),
                detail: outcome.fatal_detail.clone().unwrap_or_default(),
                outcome: Box::new(outcome),
            });
        }
        Ok(Analysis { graph, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn analyzer_is_shareable() {
        assert_send_sync::<Analyzer>();
    }

    #[test]
    fn default_config_uses_local_oracle() {
        let analyzer = Analyzer::from_config(DuetConfig::default()).unwrap();
        assert_eq!(analyzer.oracle_name(), "local");
    }

    #[test]
    fn http_config_uses_http_oracle() {
        let mut config = DuetConfig::default();
        config.oracle.kind = OracleKind::Http;
        config.oracle.endpoint = "http://127.0.0.1:9".into();
        let analyzer = Analyzer::from_config(config).unwrap();
        assert_eq!(analyzer.oracle_name(), "http");
    }

    #[test]
    fn builder_honours_configured_depth() {
        let mut config = DuetConfig::default();
        config.builder.max_depth = 2;
        let analyzer = Analyzer::from_config(config).unwrap();
        let source = "def a():\n    def b():\n        def c():\n            def d():\n                pass\n";
        let err = analyzer.build_graph(source, Language::Python).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)), "{err}");
    }
}
