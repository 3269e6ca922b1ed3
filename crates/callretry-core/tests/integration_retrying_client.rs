//! Integration test: curl todo client behind the retry interceptor, against a
//! local server that fails a scripted number of times.

mod common;

use callretry_core::client::{ClientError, CurlTodoClient, RetryingTodoClient, TodoClient};
use callretry_core::config::{BackoffSpec, ClientConfig, RetrySpec};
use callretry_core::control::AbortToken;
use callretry_core::retry::FailureKind;
use std::time::Duration;

fn config_for(base_url: &str) -> ClientConfig {
    let mut cfg = ClientConfig {
        base_url: base_url.to_string(),
        connect_timeout_secs: 2,
        timeout_secs: 5,
        ..ClientConfig::default()
    };
    cfg.operations.insert(
        "todos".to_string(),
        RetrySpec {
            max_attempts: 5,
            retryable: vec![FailureKind::Throttled, FailureKind::ServerError],
            backoff: BackoffSpec {
                delay_ms: 5,
                max_delay_ms: 40,
                multiplier: 4.0,
            },
        },
    );
    cfg
}

fn retrying_client(cfg: &ClientConfig) -> RetryingTodoClient<CurlTodoClient> {
    let registry = cfg.registry().unwrap();
    RetryingTodoClient::from_registry(CurlTodoClient::from_config(cfg).unwrap(), &registry)
}

#[test]
fn succeeds_after_two_unavailable_responses() {
    let server = common::todo_server::start(vec![503, 503]);
    let client = retrying_client(&config_for(&server.base_url));

    let todo = client.todo(1).expect("todo after retries");
    assert_eq!(todo["id"], 1);
    assert_eq!(todo["completed"], false);
    assert_eq!(server.hits(), 3);
    assert_eq!(server.paths(), vec!["/todos/1"; 3]);
}

#[test]
fn not_found_is_not_retried() {
    let server = common::todo_server::start(vec![404]);
    let client = retrying_client(&config_for(&server.base_url));

    match client.todo(2) {
        Err(ClientError::Http { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected HTTP 404, got {other:?}"),
    }
    assert_eq!(server.hits(), 1);
}

#[test]
fn exhausted_attempts_return_last_status() {
    let server = common::todo_server::start(vec![503, 500, 503, 500, 503, 500]);
    let client = retrying_client(&config_for(&server.base_url));

    match client.todo(3) {
        Err(ClientError::Http { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected HTTP 503, got {other:?}"),
    }
    assert_eq!(server.hits(), 5);
}

#[test]
fn connection_refused_is_fatal_unless_declared() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = retrying_client(&config_for(&format!("http://127.0.0.1:{port}/")));
    let err = client.todo(4).unwrap_err();
    assert!(matches!(err, ClientError::Curl(_)), "got {err:?}");
}

#[test]
fn unwrapped_client_makes_a_single_request() {
    let server = common::todo_server::start(vec![503]);
    let cfg = config_for(&server.base_url);
    let client = CurlTodoClient::from_config(&cfg).unwrap();

    assert!(client.todo(5).is_err());
    assert_eq!(server.hits(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn abort_during_backoff_stops_retrying() {
    let server = common::todo_server::start(vec![503; 10]);
    let mut cfg = config_for(&server.base_url);
    if let Some(todos) = cfg.operations.get_mut("todos") {
        todos.backoff = BackoffSpec {
            delay_ms: 10_000,
            max_delay_ms: 10_000,
            multiplier: 0.0,
        };
    }
    let client = retrying_client(&cfg);
    let token = AbortToken::new();
    let aborter = tokio::spawn({
        let token = token.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.abort();
        }
    });

    let started = std::time::Instant::now();
    let err = client.todo_cancellable(6, &token).await.unwrap_err();
    aborter.await.unwrap();

    assert!(matches!(err, ClientError::Cancelled(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(server.hits(), 1);
}
