//! Tests for careeragent-notify against a local Pushover stand-in

use axum::{extract::State, http::StatusCode, routing::post, Form, Router};
use careeragent_core::NotifierConfig;
use careeragent_notify::*;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
struct PushForm {
    token: String,
    user: String,
    message: String,
}

type Inbox = Arc<Mutex<Vec<PushForm>>>;

async fn accept(State(inbox): State<Inbox>, Form(form): Form<PushForm>) -> &'static str {
    inbox.lock().unwrap().push(form);
    r#"{"status":1}"#
}

async fn reject() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, r#"{"user":"invalid","status":0}"#)
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// ===========================================================================
// PushoverNotifier
// ===========================================================================

#[tokio::test]
async fn pushover_posts_form_fields() {
    let inbox: Inbox = Arc::default();
    let app = Router::new()
        .route("/1/messages.json", post(accept))
        .with_state(inbox.clone());
    let base = serve(app).await;

    let notifier = PushoverNotifier::new("app-token", "user-key", Duration::from_secs(5))
        .unwrap()
        .with_api_url(format!("{}/1/messages.json", base));
    notifier.notify("Recording What is your favourite language?").await.unwrap();

    let received = inbox.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].token, "app-token");
    assert_eq!(received[0].user, "user-key");
    assert_eq!(received[0].message, "Recording What is your favourite language?");
}

#[tokio::test]
async fn pushover_non_success_is_rejected() {
    let base = serve(Router::new().route("/1/messages.json", post(reject))).await;

    let notifier = PushoverNotifier::new("t", "u", Duration::from_secs(5))
        .unwrap()
        .with_api_url(format!("{}/1/messages.json", base));
    match notifier.notify("hello").await {
        Err(NotifyError::Rejected { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid"));
        }
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn pushover_unreachable_is_request_error() {
    let notifier = PushoverNotifier::new("t", "u", Duration::from_secs(2))
        .unwrap()
        .with_api_url("http://127.0.0.1:9/1/messages.json");
    assert!(matches!(notifier.notify("hello").await, Err(NotifyError::Request(_))));
}

// ===========================================================================
// LogNotifier / from_config
// ===========================================================================

#[tokio::test]
async fn log_notifier_always_succeeds() {
    assert!(LogNotifier.notify("Recording something").await.is_ok());
}

#[test]
fn from_config_without_credentials_logs() {
    let notifier = from_config(&NotifierConfig::default()).unwrap();
    assert_eq!(notifier.name(), "log");
}

#[test]
fn from_config_needs_both_credentials() {
    let config = NotifierConfig {
        pushover_token: Some("t".into()),
        ..Default::default()
    };
    assert_eq!(from_config(&config).unwrap().name(), "log");

    let config = NotifierConfig {
        pushover_token: Some("t".into()),
        pushover_user: Some("u".into()),
        ..Default::default()
    };
    assert_eq!(from_config(&config).unwrap().name(), "pushover");
}
