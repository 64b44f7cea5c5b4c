/// Integration tests for the HTTP gateway executor
///
/// Test coverage:
/// - Successful invocation against a mock gateway
/// - Gateway errors surface as invocation failures
/// - Bearer authentication when an API key is configured
/// - Capability failures reported in the body stay `Ok`
use std::collections::BTreeMap;
use std::time::Duration;

use ada::adapters::executors::HttpExecutor;
use ada::domain::errors::DomainError;
use ada::domain::models::{HttpExecutorConfig, Payload};
use ada::domain::ports::{Executor, Invocation};
use mockito::{Matcher, Server};
use serde_json::json;

fn invocation(executor: &str) -> Invocation {
    Invocation {
        executor: executor.to_string(),
        subtask_id: format!("{executor}_001"),
        description: "Search for rust schedulers".to_string(),
        input: Payload::new().with("query", "rust schedulers"),
        timeout: Duration::from_secs(5),
        prior_results: BTreeMap::new(),
    }
}

fn executor_for(server: &Server, api_key: Option<&str>) -> HttpExecutor {
    HttpExecutor::new(&HttpExecutorConfig {
        base_url: server.url(),
        timeout_secs: 5,
        api_key: api_key.map(str::to_string),
    })
    .expect("Failed to create executor")
}

#[tokio::test]
async fn test_invoke_success_with_mock() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/executors/omnisearch/invoke")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "executor": "omnisearch",
            "subtask_id": "omnisearch_001",
            "input": {"query": "rust schedulers"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "result": {"results": [{"id": "a", "title": "Tokio"}], "total_results": 1},
                "execution_time_ms": 42
            })
            .to_string(),
        )
        .create_async()
        .await;

    let outcome = executor_for(&server, None)
        .invoke(invocation("omnisearch"))
        .await
        .expect("invocation failed");

    assert!(outcome.success);
    assert_eq!(outcome.execution_time_ms, 42);
    assert_eq!(outcome.result.u64_or("total_results", 0), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gateway_error_is_invocation_failure() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/executors/code-grouper-ion/invoke")
        .with_status(500)
        .with_body("executor crashed")
        .create_async()
        .await;

    let err = executor_for(&server, None)
        .invoke(invocation("code-grouper-ion"))
        .await
        .unwrap_err();

    match err {
        DomainError::InvocationFailed { executor, reason } => {
            assert_eq!(executor, "code-grouper-ion");
            assert!(reason.contains("500"), "unexpected reason: {reason}");
            assert!(reason.contains("executor crashed"));
        }
        other => panic!("Expected InvocationFailed, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bearer_auth_sent_when_configured() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/executors/omnisearch/invoke")
        .match_header("authorization", "Bearer secret-token")
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    let outcome = executor_for(&server, Some("secret-token"))
        .invoke(invocation("omnisearch"))
        .await
        .expect("invocation failed");

    assert!(outcome.success);
    assert!(outcome.result.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_reported_failure_is_not_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/executors/quality-assessor/invoke")
        .with_status(200)
        .with_body(r#"{"success": false, "error": "content path not found"}"#)
        .create_async()
        .await;

    let outcome = executor_for(&server, None)
        .invoke(invocation("quality-assessor"))
        .await
        .expect("transport should succeed");

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("content path not found"));
}

#[tokio::test]
async fn test_malformed_body_is_invocation_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/executors/omnisearch/invoke")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let err = executor_for(&server, None)
        .invoke(invocation("omnisearch"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid response body"));
}
