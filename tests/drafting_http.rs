//! Integration tests for the drafting and conversation HTTP endpoints.
//!
//! The router is driven with `tower::ServiceExt::oneshot`, backed by the
//! mock reply generator and in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use seller_draft::adapters::ai::{MockReply, MockReplyGenerator};
use seller_draft::adapters::http::{app_router, AppState};
use seller_draft::adapters::knowledge::KeywordKnowledgeRetriever;
use seller_draft::adapters::storage::{InMemoryConversationStore, InMemoryThreadStore};
use seller_draft::application::{DraftSessionManager, SellerHintsService};
use seller_draft::config::ServerConfig;
use seller_draft::ports::ReplyGenerator;

// =============================================================================
// Test Infrastructure
// =============================================================================

const PROPOSAL_REPLY: &str = "Je comprends, voici une proposition.\n\n\
📝 Message proposé au vendeur :\n\
Bonjour,\n\
Mon colis est arrivé endommagé.\n\
Merci\n\n\
Souhaitez-vous que j'envoie ce message ?";

const PROPOSAL_TEXT: &str = "Bonjour,\nMon colis est arrivé endommagé.\nMerci";

struct TestApp {
    router: Router,
    generator: MockReplyGenerator,
    conversations: Arc<InMemoryConversationStore>,
}

impl TestApp {
    fn new(generator: MockReplyGenerator) -> Self {
        let conversations = Arc::new(InMemoryConversationStore::new());
        let threads = Arc::new(InMemoryThreadStore::new());
        let hints = SellerHintsService::new(Arc::new(KeywordKnowledgeRetriever::builtin()));
        let manager = Arc::new(DraftSessionManager::new(
            Arc::new(generator.clone()),
            hints,
            conversations.clone(),
            threads,
        ));
        let state = AppState::new(manager, generator.provider_info());

        Self {
            router: app_router(state, &ServerConfig::default()),
            generator,
            conversations,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn open_session(&self) -> Value {
        let response = self
            .send(
                Method::POST,
                "/api/drafting/sessions",
                Some(json!({ "customerName": "Alice" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    async fn stream(&self, conversation_id: &str, message: &str) -> Response {
        self.send(
            Method::POST,
            "/api/drafting/stream",
            Some(json!({ "conversationId": conversation_id, "message": message })),
        )
        .await
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Event names in the order they appear in an SSE body.
fn event_names(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("event:"))
        .map(|name| name.trim().to_string())
        .collect()
}

/// JSON data of the last event with the given name.
fn event_data(body: &str, name: &str) -> Option<Value> {
    let mut current = None;
    let mut found = None;
    for line in body.lines() {
        if let Some(event) = line.strip_prefix("event:") {
            current = Some(event.trim().to_string());
        } else if let Some(data) = line.strip_prefix("data:") {
            if current.as_deref() == Some(name) {
                found = serde_json::from_str(data.trim()).ok();
            }
        }
    }
    found
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_provider() {
    let app = TestApp::new(MockReplyGenerator::new());
    let response = app.send(Method::GET, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "mock");
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn created_session_can_be_fetched() {
    let app = TestApp::new(MockReplyGenerator::new());
    let created = app.open_session().await;
    let conversation_id = created["conversationId"].as_str().unwrap();

    let response = app
        .send(
            Method::GET,
            &format!("/api/drafting/sessions/{}", conversation_id),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["state"], "idle");
    assert_eq!(body["customerName"], "Alice");
    assert_eq!(body["threadId"], created["threadId"]);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = TestApp::new(MockReplyGenerator::new());
    let response = app
        .send(Method::GET, "/api/drafting/sessions/conv-missing", None)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "NOT_FOUND");
}

// =============================================================================
// Streaming
// =============================================================================

#[tokio::test]
async fn stream_emits_start_tokens_and_end_with_proposal() {
    let app = TestApp::new(MockReplyGenerator::new().with_reply(PROPOSAL_REPLY));
    let session = app.open_session().await;
    let conversation_id = session["conversationId"].as_str().unwrap();

    let response = app.stream(conversation_id, "Mon colis est arrivé cassé").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let body = text_body(response).await;
    let names = event_names(&body);
    assert_eq!(names.first().map(String::as_str), Some("start"));
    assert_eq!(names.last().map(String::as_str), Some("end"));
    assert!(names.iter().filter(|n| *n == "token").count() > 1);

    let end = event_data(&body, "end").unwrap();
    assert_eq!(end["state"], "proposal_pending");
    assert_eq!(end["proposal"]["proposedMessage"], PROPOSAL_TEXT);
}

#[tokio::test]
async fn empty_message_is_rejected_before_streaming() {
    let app = TestApp::new(MockReplyGenerator::new());
    let session = app.open_session().await;

    let response = app
        .stream(session["conversationId"].as_str().unwrap(), "   ")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.generator.call_count(), 0);
}

#[tokio::test]
async fn stale_thread_id_conflicts() {
    let app = TestApp::new(MockReplyGenerator::new());
    let session = app.open_session().await;
    let conversation_id = session["conversationId"].as_str().unwrap();

    let response = app
        .send(
            Method::POST,
            "/api/drafting/stream",
            Some(json!({
                "conversationId": conversation_id,
                "threadId": format!("{}-ai-000000000000", conversation_id),
                "message": "Bonjour"
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn generator_failure_ends_stream_with_error_event() {
    let app = TestApp::new(
        MockReplyGenerator::new().with_script(MockReply::Truncated("Bonjour".into())),
    );
    let session = app.open_session().await;

    let response = app
        .stream(session["conversationId"].as_str().unwrap(), "Colis perdu")
        .await;
    let body = text_body(response).await;

    assert_eq!(event_names(&body).last().map(String::as_str), Some("error"));
}

#[tokio::test]
async fn second_stream_while_busy_conflicts_and_cancel_stops_the_first() {
    let app = TestApp::new(
        MockReplyGenerator::new().with_script(MockReply::Hanging("Je regarde ".into())),
    );
    let session = app.open_session().await;
    let conversation_id = session["conversationId"].as_str().unwrap();

    let first = app.stream(conversation_id, "Colis perdu").await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.stream(conversation_id, "Encore moi").await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let cancel = app
        .send(
            Method::POST,
            &format!("/api/drafting/sessions/{}/cancel", conversation_id),
            None,
        )
        .await;
    assert_eq!(cancel.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(cancel).await["cancelled"], true);

    let body = tokio::time::timeout(Duration::from_secs(5), text_body(first))
        .await
        .unwrap();
    assert_eq!(
        event_names(&body).last().map(String::as_str),
        Some("cancelled")
    );
}

// =============================================================================
// Approval
// =============================================================================

#[tokio::test]
async fn approve_persists_proposal_and_rotates_thread() {
    let app = TestApp::new(MockReplyGenerator::new().with_reply(PROPOSAL_REPLY));
    let session = app.open_session().await;
    let conversation_id = session["conversationId"].as_str().unwrap();

    text_body(app.stream(conversation_id, "Mon colis est arrivé cassé").await).await;

    let response = app
        .send(
            Method::POST,
            &format!("/api/drafting/sessions/{}/approve", conversation_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = json_body(response).await;
    assert_eq!(receipt["content"], PROPOSAL_TEXT);
    assert_ne!(receipt["threadId"], session["threadId"]);
    assert!(receipt["messageId"].as_str().is_some());

    let messages = json_body(
        app.send(
            Method::GET,
            &format!("/api/conversations/{}/messages", conversation_id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(messages[0]["content"], PROPOSAL_TEXT);
    assert_eq!(messages[0]["from"], "customer");
    assert_eq!(messages[0]["customerName"], "Alice");
}

#[tokio::test]
async fn approve_without_proposal_is_unprocessable() {
    let app = TestApp::new(MockReplyGenerator::new().with_reply("Pouvez-vous préciser ?"));
    let session = app.open_session().await;
    let conversation_id = session["conversationId"].as_str().unwrap();

    text_body(app.stream(conversation_id, "Problème").await).await;

    let response = app
        .send(
            Method::POST,
            &format!("/api/drafting/sessions/{}/approve", conversation_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn failed_persistence_is_internal_and_saves_nothing() {
    let app = TestApp::new(MockReplyGenerator::new().with_reply(PROPOSAL_REPLY));
    let session = app.open_session().await;
    let conversation_id = session["conversationId"].as_str().unwrap();

    text_body(app.stream(conversation_id, "Mon colis est arrivé cassé").await).await;
    app.conversations.set_failing_writes(true);

    let response = app
        .send(
            Method::POST,
            &format!("/api/drafting/sessions/{}/approve", conversation_id),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["message"], "An internal error occurred");
    assert!(app.conversations.is_empty().await);
}

// =============================================================================
// Conversations
// =============================================================================

#[tokio::test]
async fn saved_messages_are_listed_in_order() {
    let app = TestApp::new(MockReplyGenerator::new());

    for content in ["Premier", "Second"] {
        let response = app
            .send(
                Method::POST,
                "/api/conversations/messages",
                Some(json!({ "conversationId": "conv-42", "content": content })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(json_body(response).await["messageId"].as_str().is_some());
    }

    let messages = json_body(
        app.send(Method::GET, "/api/conversations/conv-42/messages", None)
            .await,
    )
    .await;
    let contents: Vec<_> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents, vec!["Premier", "Second"]);
}

#[tokio::test]
async fn blank_saved_message_is_bad_request() {
    let app = TestApp::new(MockReplyGenerator::new());
    let response = app
        .send(
            Method::POST,
            "/api/conversations/messages",
            Some(json!({ "conversationId": "conv-42", "content": "  " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clear_deletes_messages_and_returns_new_identity() {
    let app = TestApp::new(MockReplyGenerator::new());
    let session = app.open_session().await;
    let conversation_id = session["conversationId"].as_str().unwrap();

    app.send(
        Method::POST,
        "/api/conversations/messages",
        Some(json!({ "conversationId": conversation_id, "content": "Bonjour" })),
    )
    .await;

    let response = app
        .send(
            Method::DELETE,
            &format!("/api/conversations/{}", conversation_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = json_body(response).await;
    assert_eq!(outcome["deletedMessages"], 1);
    assert_ne!(outcome["conversationId"], conversation_id);
    let new_conversation = outcome["conversationId"].as_str().unwrap();
    assert!(outcome["threadId"]
        .as_str()
        .unwrap()
        .starts_with(&format!("{}-ai-", new_conversation)));

    let messages = json_body(
        app.send(
            Method::GET,
            &format!("/api/conversations/{}/messages", conversation_id),
            None,
        )
        .await,
    )
    .await;
    assert!(messages.as_array().unwrap().is_empty());
}
