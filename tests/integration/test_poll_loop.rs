//! End-to-end tests for the poll loop over real HTTP.
//!
//! Both remote services are replaced by axum stub servers bound to an
//! ephemeral localhost port, so the tests exercise the reqwest transports,
//! the response validation and the deduplication together.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use homework_transport::{PracticumClient, TelegramNotifier};
use homework_watcher::{CycleOutcome, Delivery, PollLoop, WatchConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const PRACTICUM_TOKEN: &str = "practicum-secret";
const TELEGRAM_TOKEN: &str = "123456:telegram-secret";
const CHAT_ID: &str = "4242";

// ============================================================================
// Stub servers
// ============================================================================

/// A request seen by the homework API stub.
#[derive(Debug, Clone)]
struct HomeworkRequest {
    authorization: Option<String>,
    from_date: Option<String>,
}

/// Homework API stub answering with a fixed script of replies.
///
/// The last reply repeats once the script is exhausted.
#[derive(Clone)]
struct HomeworkStub {
    replies: Arc<Vec<(StatusCode, Value)>>,
    requests: Arc<Mutex<Vec<HomeworkRequest>>>,
}

impl HomeworkStub {
    fn new(replies: Vec<(StatusCode, Value)>) -> Self {
        Self {
            replies: Arc::new(replies),
            requests: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<HomeworkRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

async fn homework_statuses(
    State(stub): State<HomeworkStub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let index = {
        let mut requests = stub.requests.lock().expect("lock poisoned");
        requests.push(HomeworkRequest {
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            from_date: query.get("from_date").cloned(),
        });
        requests.len() - 1
    };

    let (status, body) = stub
        .replies
        .get(index)
        .or_else(|| stub.replies.last())
        .cloned()
        .unwrap_or((StatusCode::OK, json!({"homeworks": []})));
    (status, Json(body))
}

#[derive(Debug, Deserialize)]
struct SendMessage {
    chat_id: String,
    text: String,
}

/// Bot API stub recording every delivered text.
#[derive(Clone)]
struct TelegramStub {
    accept: bool,
    bot_paths: Arc<Mutex<Vec<String>>>,
    chat_ids: Arc<Mutex<Vec<String>>>,
    texts: Arc<Mutex<Vec<String>>>,
}

impl TelegramStub {
    fn accepting() -> Self {
        Self::new(true)
    }

    fn rejecting() -> Self {
        Self::new(false)
    }

    fn new(accept: bool) -> Self {
        Self {
            accept,
            bot_paths: Arc::default(),
            chat_ids: Arc::default(),
            texts: Arc::default(),
        }
    }

    fn texts(&self) -> Vec<String> {
        self.texts.lock().expect("lock poisoned").clone()
    }
}

async fn send_message(
    State(stub): State<TelegramStub>,
    Path(bot): Path<String>,
    Json(body): Json<SendMessage>,
) -> (StatusCode, Json<Value>) {
    stub.bot_paths.lock().expect("lock poisoned").push(bot);
    stub.chat_ids.lock().expect("lock poisoned").push(body.chat_id);
    stub.texts.lock().expect("lock poisoned").push(body.text);

    if stub.accept {
        (StatusCode::OK, Json(json!({"ok": true, "result": {}})))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "description": "Bad Request: chat not found"})),
        )
    }
}

/// Serves `router` on an ephemeral localhost port and returns its base URL.
async fn spawn_server(router: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    (format!("http://{addr}"), handle)
}

/// Running stubs plus a config pointing at them.
struct TestEnv {
    homework: HomeworkStub,
    telegram: TelegramStub,
    config: WatchConfig,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl TestEnv {
    async fn start(homework: HomeworkStub, telegram: TelegramStub) -> Self {
        let homework_router = Router::new()
            .route("/api/user_api/homework_statuses/", get(homework_statuses))
            .with_state(homework.clone());
        let telegram_router = Router::new()
            .route("/:bot/sendMessage", post(send_message))
            .with_state(telegram.clone());

        let (homework_url, homework_handle) = spawn_server(homework_router).await;
        let (telegram_url, telegram_handle) = spawn_server(telegram_router).await;

        let vars = HashMap::from([
            ("PRACTICUM_TOKEN", PRACTICUM_TOKEN.to_string()),
            ("TELEGRAM_TOKEN", TELEGRAM_TOKEN.to_string()),
            ("TELEGRAM_CHAT_ID", CHAT_ID.to_string()),
            (
                "PRACTICUM_ENDPOINT",
                format!("{homework_url}/api/user_api/homework_statuses/"),
            ),
            ("TELEGRAM_API_URL", telegram_url),
        ]);
        let config = WatchConfig::from_lookup(|name: &str| vars.get(name).cloned())
            .expect("Failed to build config");

        Self {
            homework,
            telegram,
            config,
            handles: vec![homework_handle, telegram_handle],
        }
    }

    fn poll_loop(&self) -> PollLoop<PracticumClient, TelegramNotifier> {
        let client = reqwest::Client::new();
        PollLoop::from_config(
            &self.config,
            PracticumClient::from_config(client.clone(), &self.config),
            TelegramNotifier::from_config(client, &self.config),
        )
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

fn reviewing_snapshot() -> Value {
    json!({
        "homeworks": [{"homework_name": "hw05_final", "status": "reviewing"}],
        "current_date": 1_700_000_500
    })
}

// ============================================================================
// Tests
// ============================================================================

/// Tests that an unchanged status reaches the chat exactly once.
#[tokio::test]
async fn test_status_sent_once_across_cycles() {
    let env = TestEnv::start(
        HomeworkStub::new(vec![(StatusCode::OK, reviewing_snapshot())]),
        TelegramStub::accepting(),
    )
    .await;
    let mut poll_loop = env.poll_loop().with_cursor(1_700_000_000);

    let first = poll_loop.run_cycle().await;
    let second = poll_loop.run_cycle().await;

    let expected =
        "Review status changed for \"hw05_final\": work has been taken up for review.";
    assert_eq!(
        first,
        CycleOutcome::Status {
            message: expected.to_string(),
            delivery: Delivery::Sent,
        }
    );
    assert_eq!(
        second,
        CycleOutcome::Status {
            message: expected.to_string(),
            delivery: Delivery::Suppressed,
        }
    );
    assert_eq!(env.telegram.texts(), vec![expected.to_string()]);
    assert_eq!(poll_loop.state().last_message(), Some(expected));
}

/// Tests the request details sent to both services.
#[tokio::test]
async fn test_requests_carry_credentials_and_cursor() {
    let env = TestEnv::start(
        HomeworkStub::new(vec![(StatusCode::OK, reviewing_snapshot())]),
        TelegramStub::accepting(),
    )
    .await;
    let mut poll_loop = env.poll_loop().with_cursor(1_700_000_000);

    poll_loop.run_cycle().await;
    poll_loop.run_cycle().await;

    let requests = env.homework.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(
            request.authorization.as_deref(),
            Some("OAuth practicum-secret")
        );
    }
    assert_eq!(requests[0].from_date.as_deref(), Some("1700000000"));
    assert_eq!(requests[1].from_date.as_deref(), Some("1700000500"));
    assert_eq!(poll_loop.cursor(), 1_700_000_500);

    let bot_paths = env.telegram.bot_paths.lock().expect("lock poisoned").clone();
    assert_eq!(bot_paths, vec![format!("bot{TELEGRAM_TOKEN}")]);
    let chat_ids = env.telegram.chat_ids.lock().expect("lock poisoned").clone();
    assert_eq!(chat_ids, vec![CHAT_ID.to_string()]);
}

/// Tests that an empty list sends nothing and still moves the cursor.
#[tokio::test]
async fn test_empty_list_sends_nothing() {
    let env = TestEnv::start(
        HomeworkStub::new(vec![(
            StatusCode::OK,
            json!({"homeworks": [], "current_date": 1_700_000_900}),
        )]),
        TelegramStub::accepting(),
    )
    .await;
    let mut poll_loop = env.poll_loop().with_cursor(1_700_000_000);

    assert_eq!(poll_loop.run_cycle().await, CycleOutcome::NoSubmissions);
    assert!(env.telegram.texts().is_empty());
    assert_eq!(poll_loop.cursor(), 1_700_000_900);
}

/// Tests that a non-200 reply is reported once and leaves the cursor alone.
#[tokio::test]
async fn test_http_error_reported_once() {
    let env = TestEnv::start(
        HomeworkStub::new(vec![(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": "maintenance"}),
        )]),
        TelegramStub::accepting(),
    )
    .await;
    let mut poll_loop = env.poll_loop().with_cursor(1_700_000_000);

    let first = poll_loop.run_cycle().await;
    let second = poll_loop.run_cycle().await;

    assert!(first.is_failure());
    assert!(first.was_sent());
    assert!(second.is_failure());
    assert!(!second.was_sent());

    let texts = env.telegram.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Program failure: "));
    assert!(texts[0].contains("503"));
    assert_eq!(poll_loop.cursor(), 1_700_000_000);
}

/// Tests that a malformed body is reported as a shape failure.
#[tokio::test]
async fn test_malformed_response_reported() {
    let env = TestEnv::start(
        HomeworkStub::new(vec![(
            StatusCode::OK,
            json!({"homeworks": "none", "current_date": 1_700_000_100}),
        )]),
        TelegramStub::accepting(),
    )
    .await;
    let mut poll_loop = env.poll_loop().with_cursor(1_700_000_000);

    let outcome = poll_loop.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Failure {
            message: "Program failure: unexpected API response shape: 'homeworks' is not a list"
                .to_string(),
            delivery: Delivery::Sent,
        }
    );
    assert_eq!(poll_loop.cursor(), 1_700_000_100);
}

/// Tests the message sequence when a failure interrupts a stable status.
#[tokio::test]
async fn test_recovery_after_failure_does_not_repeat_status() {
    let env = TestEnv::start(
        HomeworkStub::new(vec![
            (StatusCode::OK, reviewing_snapshot()),
            (StatusCode::INTERNAL_SERVER_ERROR, json!({})),
            (StatusCode::OK, reviewing_snapshot()),
            (
                StatusCode::OK,
                json!({
                    "homeworks": [{"homework_name": "hw05_final", "status": "approved"}],
                    "current_date": 1_700_001_000
                }),
            ),
        ]),
        TelegramStub::accepting(),
    )
    .await;
    let mut poll_loop = env.poll_loop().with_cursor(1_700_000_000);

    for _ in 0..4 {
        poll_loop.run_cycle().await;
    }

    let texts = env.telegram.texts();
    assert_eq!(texts.len(), 3, "unexpected messages: {texts:?}");
    assert!(texts[0].ends_with("work has been taken up for review."));
    assert!(texts[1].starts_with("Program failure: "));
    assert!(texts[2].ends_with("work reviewed: no issues, approved."));
}

/// Tests that a rejected message is a failed delivery and is retried.
#[tokio::test]
async fn test_rejected_delivery_is_retried() {
    let env = TestEnv::start(
        HomeworkStub::new(vec![(StatusCode::OK, reviewing_snapshot())]),
        TelegramStub::rejecting(),
    )
    .await;
    let mut poll_loop = env.poll_loop().with_cursor(1_700_000_000);

    let first = poll_loop.run_cycle().await;
    let second = poll_loop.run_cycle().await;

    for outcome in [&first, &second] {
        assert!(matches!(
            outcome,
            CycleOutcome::Status {
                delivery: Delivery::Failed,
                ..
            }
        ));
    }
    assert_eq!(env.telegram.texts().len(), 2);
    assert_eq!(poll_loop.state().last_message(), None);
    assert_eq!(poll_loop.state().last_error(), None);
}

/// Tests that the running loop stops promptly when cancelled.
#[tokio::test]
async fn test_run_stops_on_cancellation() {
    let env = TestEnv::start(
        HomeworkStub::new(vec![(StatusCode::OK, reviewing_snapshot())]),
        TelegramStub::accepting(),
    )
    .await;
    let poll_loop = env.poll_loop().with_cursor(1_700_000_000);
    let token = CancellationToken::new();

    let task = tokio::spawn(poll_loop.run(token.clone()));

    timeout(Duration::from_secs(5), async {
        while env.telegram.texts().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Timeout waiting for first message");

    token.cancel();
    let stopped = timeout(Duration::from_secs(1), task)
        .await
        .expect("Loop did not stop after cancellation")
        .expect("Loop task panicked");

    assert_eq!(stopped.cursor(), 1_700_000_500);
    assert_eq!(env.telegram.texts().len(), 1);
    assert_eq!(env.homework.requests().len(), 1);
}
