// ABOUTME: Integration tests for the coach route handlers
// ABOUTME: Covers authentication, validation envelopes, and endpoint behavior end to end

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{test_resources, MockProvider};
use helpers::axum_test::AxumTestRequest;
use melius_coach::routes::CoachRoutes;

use axum::http::StatusCode;
use serde_json::json;

async fn setup_replying(reply: &str) -> (axum::Router, String) {
    let (resources, auth) = test_resources(MockProvider::replying(reply)).await;
    (CoachRoutes::routes(resources), auth)
}

async fn setup_failing() -> (axum::Router, String) {
    let (resources, auth) = test_resources(MockProvider::failing()).await;
    (CoachRoutes::routes(resources), auth)
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_chat_requires_auth() {
    let (router, _auth) = setup_replying("hi").await;

    let response = AxumTestRequest::post("/api/v1/coach/chat")
        .json(&json!({ "message": "hello" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body = response.json_value();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("AUTH_REQUIRED"));
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let (router, _auth) = setup_replying("hi").await;

    let response = AxumTestRequest::get("/api/v1/coach/conversations")
        .header("authorization", "Bearer not-a-real-token")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json_value()["error"]["code"],
        json!("AUTH_INVALID")
    );
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let (router, auth) = setup_replying("hi").await;

    let response = AxumTestRequest::post("/api/v1/coach/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json_value();
    assert_eq!(body["error"]["code"], json!("INVALID_INPUT"));
    assert_eq!(body["error"]["details"]["field"], json!("message"));
}

#[tokio::test]
async fn test_chat_rejects_oversized_message() {
    let (router, auth) = setup_replying("hi").await;

    let response = AxumTestRequest::post("/api/v1/coach/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "x".repeat(2001) }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_crisis_rejects_bad_urgency() {
    let (router, auth) = setup_replying("hi").await;

    let response = AxumTestRequest::post("/api/v1/coach/crisis")
        .header("authorization", &auth)
        .json(&json!({ "crisisData": {}, "urgency": "catastrophic" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json_value()["error"]["details"]["field"],
        json!("urgency")
    );
}

#[tokio::test]
async fn test_journal_rejects_short_entry() {
    let (router, auth) = setup_replying("hi").await;

    let response = AxumTestRequest::post("/api/v1/coach/analyze-journal")
        .header("authorization", &auth)
        .json(&json!({ "entry": "too short" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json_value()["error"]["details"]["field"],
        json!("entry")
    );
}

#[tokio::test]
async fn test_list_rejects_out_of_range_limit() {
    let (router, auth) = setup_replying("hi").await;

    let response = AxumTestRequest::get("/api/v1/coach/conversations?limit=500")
        .header("authorization", &auth)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json_value()["error"]["details"]["field"],
        json!("limit")
    );
}

// ============================================================================
// Chat and Crisis
// ============================================================================

#[tokio::test]
async fn test_chat_round_trip_envelope() {
    let (router, auth) = setup_replying("You are doing well. What helped today?").await;

    let response = AxumTestRequest::post("/api/v1/coach/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "good day overall" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json_value();
    assert_eq!(body["success"], json!(true));
    assert!(body["timestamp"].is_string());

    let data = &body["data"];
    assert!(data["conversationId"].is_string());
    assert_eq!(data["message"], json!("You are doing well. What helped today?"));
    assert_eq!(data["urgency"], json!("low"));
    assert_eq!(
        data["followUpQuestions"],
        json!(["What helped today?"])
    );
}

#[tokio::test]
async fn test_chat_continues_existing_conversation() {
    let (router, auth) = setup_replying("Noted. Keep going.").await;

    let first = AxumTestRequest::post("/api/v1/coach/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "first" }))
        .send(router.clone())
        .await;
    let id = first.json_value()["data"]["conversationId"]
        .as_str()
        .unwrap()
        .to_owned();

    let second = AxumTestRequest::post("/api/v1/coach/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "second", "conversationId": id }))
        .send(router.clone())
        .await;
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(
        second.json_value()["data"]["conversationId"],
        json!(id)
    );

    let detail = AxumTestRequest::get(&format!("/api/v1/coach/conversations/{id}"))
        .header("authorization", &auth)
        .send(router)
        .await;
    assert_eq!(detail.status_code(), StatusCode::OK);
    let messages = detail.json_value()["data"]["messages"]
        .as_array()
        .unwrap()
        .len();
    // Greeting plus two user/assistant exchanges.
    assert_eq!(messages, 5);
}

#[tokio::test]
async fn test_chat_survives_provider_outage() {
    let (router, auth) = setup_failing().await;

    let response = AxumTestRequest::post("/api/v1/coach/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "rough evening" }))
        .send(router)
        .await;

    // Provider outages never surface as error envelopes on the chat path.
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json_value();
    assert_eq!(body["success"], json!(true));
    assert!(body["data"]["message"].as_str().unwrap().contains("988"));
}

#[tokio::test]
async fn test_crisis_attaches_emergency_contacts() {
    let (router, auth) = setup_failing().await;

    let response = AxumTestRequest::post("/api/v1/coach/crisis")
        .header("authorization", &auth)
        .json(&json!({ "crisisData": { "situation": "acute urge" }, "urgency": "emergency" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data = &response.json_value()["data"];
    assert!(!data["message"].as_str().unwrap().is_empty());
    assert_eq!(data["urgency"], json!("emergency"));
    assert_eq!(data["emergencyContacts"].as_array().unwrap().len(), 3);
}

// ============================================================================
// Assessment and Journal
// ============================================================================

#[tokio::test]
async fn test_assessment_initial_returns_questions() {
    let (router, auth) = setup_failing().await;

    let response = AxumTestRequest::post("/api/v1/coach/assessment")
        .header("authorization", &auth)
        .json(&json!({ "userContext": { "primaryGoal": "stay sober" } }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data = &response.json_value()["data"];
    assert_eq!(data["stage"], json!("initial"));
    assert_eq!(data["nextStep"], json!("planning"));
    // Provider is down, so the fixed fallback set is served.
    assert_eq!(data["questions"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_assessment_planning_returns_plan() {
    let (router, auth) = setup_replying("Week one: morning routine.\n- Keep a journal").await;

    let response = AxumTestRequest::post("/api/v1/coach/assessment")
        .header("authorization", &auth)
        .json(&json!({
            "userContext": { "goals": ["complete 30 days"], "currentStreak": 4 },
            "stage": "planning"
        }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data = &response.json_value()["data"];
    assert_eq!(data["stage"], json!("planning"));
    assert!(data["plan"].as_str().unwrap().contains("Week one"));
    assert_eq!(data["suggestions"], json!(["Keep a journal"]));
}

#[tokio::test]
async fn test_assessment_rejects_unknown_stage() {
    let (router, auth) = setup_replying("hi").await;

    let response = AxumTestRequest::post("/api/v1/coach/assessment")
        .header("authorization", &auth)
        .json(&json!({ "userContext": {}, "stage": "review" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_journal_analysis_envelope() {
    let (router, auth) = setup_replying("unused").await;

    let response = AxumTestRequest::post("/api/v1/coach/analyze-journal")
        .header("authorization", &auth)
        .json(&json!({ "entry": "I feel proud and grateful today", "mood": 8 }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data = &response.json_value()["data"];
    assert_eq!(data["sentiment"], json!("positive"));
    assert_eq!(data["mood"], json!(8));
    assert!(!data["insights"].as_array().unwrap().is_empty());
}

// ============================================================================
// Conversations, Models, Status
// ============================================================================

#[tokio::test]
async fn test_get_unknown_conversation_is_404() {
    let (router, auth) = setup_replying("hi").await;

    let response = AxumTestRequest::get("/api/v1/coach/conversations/no-such-id")
        .header("authorization", &auth)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.json_value()["error"]["code"],
        json!("RESOURCE_NOT_FOUND")
    );
}

#[tokio::test]
async fn test_delete_conversation_then_404() {
    let (router, auth) = setup_replying("Noted.").await;

    let created = AxumTestRequest::post("/api/v1/coach/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "start one" }))
        .send(router.clone())
        .await;
    let id = created.json_value()["data"]["conversationId"]
        .as_str()
        .unwrap()
        .to_owned();

    let deleted = AxumTestRequest::delete(&format!("/api/v1/coach/conversations/{id}"))
        .header("authorization", &auth)
        .send(router.clone())
        .await;
    assert_eq!(deleted.status_code(), StatusCode::OK);

    let gone = AxumTestRequest::delete(&format!("/api/v1/coach/conversations/{id}"))
        .header("authorization", &auth)
        .send(router)
        .await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_conversations_with_pagination_info() {
    let (router, auth) = setup_replying("Noted.").await;

    for message in ["one", "two"] {
        AxumTestRequest::post("/api/v1/coach/chat")
            .header("authorization", &auth)
            .json(&json!({ "message": message }))
            .send(router.clone())
            .await;
    }

    let response = AxumTestRequest::get("/api/v1/coach/conversations?page=1&limit=10")
        .header("authorization", &auth)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let data = &response.json_value()["data"];
    assert_eq!(data["conversations"].as_array().unwrap().len(), 2);
    assert_eq!(data["pagination"]["page"], json!(1));
    assert_eq!(data["pagination"]["limit"], json!(10));
}

#[tokio::test]
async fn test_models_endpoint_lists_provider_models() {
    let (router, auth) = setup_replying("hi").await;

    let response = AxumTestRequest::get("/api/v1/coach/models")
        .header("authorization", &auth)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let models = response.json_value()["data"]["models"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0]["id"], json!("mock-model"));
}

#[tokio::test]
async fn test_status_reflects_provider_health() {
    let (router, auth) = setup_replying("hi").await;
    let response = AxumTestRequest::get("/api/v1/coach/status")
        .header("authorization", &auth)
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let data = response.json_value()["data"].clone();
    assert_eq!(data["status"], json!("healthy"));
    assert_eq!(data["model"], json!("mock-model"));

    let (router, auth) = setup_failing().await;
    let response = AxumTestRequest::get("/api/v1/coach/status")
        .header("authorization", &auth)
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json_value()["data"]["status"],
        json!("unhealthy")
    );
}
