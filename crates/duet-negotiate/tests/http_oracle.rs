//! `HttpOracle` against a mock oracle service.

use std::sync::Arc;

use duet_config::{DuetConfig, OracleKind};
use duet_core::enums::{OracleRole, TerminationReason};
use duet_negotiate::oracle::OracleRequest;
use duet_negotiate::{Analyzer, HttpOracle, Oracle, OracleError};
use duet_parser::{Language, build_entity_graph};
use mockito::Matcher;
use serde_json::json;
use tokio_util::sync::CancellationToken;

const SOURCE: &str = "def load(path):\n    return parse(path)\n\n\ndef parse(text):\n    return text\n";

fn request() -> OracleRequest {
    let graph = build_entity_graph(SOURCE, Language::Python).unwrap();
    OracleRequest::proposer(graph.summary(), 0, None)
}

fn proposal() -> serde_json::Value {
    json!({
        "file_intent": "Settings loading",
        "blocks": [{
            "id": "loading",
            "label": "Loading",
            "description": "Reads and parses",
            "entity_ids": ["e1", "e2"],
            "ranges": [[1, 6]],
        }],
        "response_to_feedback": [],
    })
}

#[tokio::test]
async fn posts_request_with_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/propose")
        .match_header("authorization", "Bearer tok")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({ "role": "proposer", "iteration": 0 })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(proposal().to_string())
        .create_async()
        .await;

    let oracle = HttpOracle::new(server.url(), Some("tok".into())).unwrap();
    let answer = oracle.call(&request()).await.unwrap();

    assert_eq!(answer, proposal());
    mock.assert_async().await;
}

#[tokio::test]
async fn rate_limit_reads_retry_after() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/propose")
        .with_status(429)
        .with_header("retry-after", "7")
        .create_async()
        .await;

    let oracle = HttpOracle::new(server.url(), None).unwrap();
    let err = oracle.call(&request()).await.unwrap_err();
    assert!(
        matches!(err, OracleError::RateLimited { retry_after_secs: 7 }),
        "{err}"
    );
}

#[tokio::test]
async fn server_error_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/propose")
        .with_status(503)
        .with_body("model overloaded")
        .create_async()
        .await;

    let oracle = HttpOracle::new(server.url(), None).unwrap();
    let err = oracle.call(&request()).await.unwrap_err();
    match err {
        OracleError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "model overloaded");
        }
        other => panic!("expected Api error, got {other}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_contract_violation() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/review")
        .with_status(200)
        .with_body("<html>hello</html>")
        .create_async()
        .await;

    let mut request = request();
    request.role = OracleRole::Validator;

    let oracle = HttpOracle::new(server.url(), None).unwrap();
    let err = oracle.call(&request).await.unwrap_err();
    assert!(matches!(err, OracleError::Contract(_)), "{err}");
}

#[tokio::test]
async fn analyzer_negotiates_over_http() {
    let mut server = mockito::Server::new_async().await;
    let propose = server
        .mock("POST", "/propose")
        .with_status(200)
        .with_body(proposal().to_string())
        .expect(1)
        .create_async()
        .await;
    let review = server
        .mock("POST", "/review")
        .match_body(Matcher::PartialJson(json!({ "role": "validator" })))
        .with_status(200)
        .with_body(json!({ "issues": [] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut config = DuetConfig::default();
    config.oracle.kind = OracleKind::Http;
    config.oracle.endpoint = format!("{}/", server.url());
    let analyzer = Analyzer::from_config(config).unwrap();

    let analysis = analyzer
        .analyze(SOURCE, Language::Python, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(analysis.outcome.termination_reason, TerminationReason::Approved);
    let map = analysis.responsibility_map();
    assert_eq!(map.responsibility_blocks[0].id, "loading");
    assert_eq!(map.responsibility_blocks[0].elements.functions, vec!["load", "parse"]);

    propose.assert_async().await;
    review.assert_async().await;
}

#[tokio::test]
async fn unreachable_service_is_fatal() {
    let oracle = HttpOracle::new("http://127.0.0.1:9", None).unwrap();
    let analyzer = Analyzer::new(Arc::new(oracle), DuetConfig::default());
    let err = analyzer
        .analyze(SOURCE, Language::Python, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("after 0 completed iteration(s)"), "{err}");
}
