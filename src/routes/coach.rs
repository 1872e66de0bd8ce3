// ABOUTME: Coach API route handlers: chat, crisis, assessment, journal analysis, conversations
// ABOUTME: Validates request bodies by hand so failures return 400 envelopes with field detail
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coach routes
//!
//! REST endpoints under `/api/v1/coach`. Every handler authenticates from the
//! request headers before touching any state. Responses share the
//! `{success, data, timestamp}` envelope; errors are formatted by
//! [`AppError`]'s response conversion.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::ServerResources;
use crate::coach::orchestrator::AssessmentRequest;
use crate::coach::CrisisRequest;
use crate::errors::{AppError, AppResult};
use crate::models::{MessageMetadata, Urgency};

// ============================================================================
// Request/Query Types
// ============================================================================

/// Body of a chat turn request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    /// User message text
    pub message: String,
    /// Existing conversation to continue, or absent to start a new one
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Optional per-message metadata
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Body of a crisis escalation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisBody {
    /// Free-form situation description
    pub crisis_data: Option<Value>,
    /// Client-reported urgency
    pub urgency: Option<String>,
}

/// Body of an assessment request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentBody {
    /// Assessment answers and goal details
    pub user_context: Option<Value>,
    /// Assessment stage, defaults to initial
    #[serde(default)]
    pub stage: Option<String>,
    /// Conversation to move into planning, when applicable
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Body of a journal analysis request
#[derive(Debug, Deserialize)]
pub struct JournalBody {
    /// Journal entry text
    pub entry: String,
    /// Mood rating at writing time
    #[serde(default)]
    pub mood: Option<i64>,
}

/// Query parameters for listing conversations
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Wrap payload in the success envelope
fn success(data: Value) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": data,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Build a validation error carrying the offending field
fn field_error(field: &str, message: &str) -> AppError {
    AppError::invalid_input("Validation failed")
        .with_details(json!({ "field": field, "message": message }))
}

// ============================================================================
// Coach Routes
// ============================================================================

/// Coach routes handler
pub struct CoachRoutes;

impl CoachRoutes {
    /// Create all coach routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/v1/coach/chat", post(Self::chat))
            .route("/api/v1/coach/crisis", post(Self::crisis))
            .route("/api/v1/coach/assessment", post(Self::assessment))
            .route("/api/v1/coach/analyze-journal", post(Self::analyze_journal))
            .route("/api/v1/coach/conversations", get(Self::list_conversations))
            .route(
                "/api/v1/coach/conversations/:id",
                get(Self::get_conversation),
            )
            .route(
                "/api/v1/coach/conversations/:id",
                delete(Self::delete_conversation),
            )
            .route("/api/v1/coach/models", get(Self::list_models))
            .route("/api/v1/coach/status", get(Self::status))
            .with_state(resources)
    }

    /// POST /api/v1/coach/chat
    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<ChatBody>,
    ) -> AppResult<Json<Value>> {
        let principal = resources.auth.authenticate(&headers)?;

        if body.message.is_empty() || body.message.chars().count() > 2000 {
            return Err(field_error(
                "message",
                "Message must be between 1 and 2000 characters",
            ));
        }
        let metadata = match body.metadata {
            Some(value) => {
                if !value.is_object() {
                    return Err(field_error("metadata", "Metadata must be an object"));
                }
                Some(
                    serde_json::from_value::<MessageMetadata>(value)
                        .map_err(|e| field_error("metadata", &e.to_string()))?,
                )
            }
            None => None,
        };

        let turn = resources
            .coach
            .handle_message(
                body.conversation_id.as_deref(),
                &principal.user_id,
                &body.message,
                metadata,
            )
            .await?;

        let mut data = serde_json::to_value(&turn.response)
            .map_err(|e| AppError::internal(format!("Failed to serialize response: {e}")))?;
        data["conversationId"] = Value::String(turn.conversation_id);
        Ok(success(data))
    }

    /// POST /api/v1/coach/crisis
    async fn crisis(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CrisisBody>,
    ) -> AppResult<Json<Value>> {
        let principal = resources.auth.authenticate(&headers)?;

        let crisis_data = body
            .crisis_data
            .filter(Value::is_object)
            .ok_or_else(|| field_error("crisisData", "Crisis data is required"))?;
        let urgency = body
            .urgency
            .as_deref()
            .and_then(Urgency::parse)
            .ok_or_else(|| field_error("urgency", "Invalid urgency level"))?;

        let outcome = resources
            .coach
            .handle_crisis(
                &principal.user_id,
                &CrisisRequest {
                    crisis_data,
                    urgency,
                },
            )
            .await?;

        let mut data = serde_json::to_value(&outcome.response)
            .map_err(|e| AppError::internal(format!("Failed to serialize response: {e}")))?;
        data["emergencyContacts"] = json!(outcome.emergency_contacts);
        Ok(success(data))
    }

    /// POST /api/v1/coach/assessment
    async fn assessment(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<AssessmentBody>,
    ) -> AppResult<Json<Value>> {
        let principal = resources.auth.authenticate(&headers)?;

        let user_context = body
            .user_context
            .filter(Value::is_object)
            .ok_or_else(|| field_error("userContext", "User context is required"))?;
        let request: AssessmentRequest = serde_json::from_value(user_context)
            .map_err(|e| field_error("userContext", &e.to_string()))?;

        let stage = body.stage.as_deref().unwrap_or("initial");
        if !matches!(stage, "initial" | "planning") {
            return Err(field_error("stage", "Invalid assessment stage"));
        }

        if stage == "initial" {
            let questions = resources.coach.generate_assessment_questions(&request).await?;
            return Ok(success(json!({
                "stage": stage,
                "questions": questions,
                "nextStep": "planning",
            })));
        }

        let plan = resources
            .coach
            .generate_plan(
                &principal.user_id,
                &request,
                body.conversation_id.as_deref(),
            )
            .await?;

        Ok(success(json!({
            "stage": stage,
            "plan": plan.plan,
            "suggestions": plan.suggestions,
            "followUpQuestions": plan.follow_up_questions,
        })))
    }

    /// POST /api/v1/coach/analyze-journal
    async fn analyze_journal(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<JournalBody>,
    ) -> AppResult<Json<Value>> {
        let principal = resources.auth.authenticate(&headers)?;

        let length = body.entry.chars().count();
        if !(10..=5000).contains(&length) {
            return Err(field_error(
                "entry",
                "Journal entry must be between 10 and 5000 characters",
            ));
        }
        let mood = match body.mood {
            Some(m) => {
                if !(1..=10).contains(&m) {
                    return Err(field_error("mood", "Mood must be between 1 and 10"));
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                Some(m as u8)
            }
            None => None,
        };

        let analysis = resources
            .coach
            .analyze_journal(&principal.user_id, &body.entry, mood)
            .await?;
        let data = serde_json::to_value(&analysis)
            .map_err(|e| AppError::internal(format!("Failed to serialize analysis: {e}")))?;
        Ok(success(data))
    }

    /// GET /api/v1/coach/conversations
    async fn list_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListQuery>,
    ) -> AppResult<Json<Value>> {
        let principal = resources.auth.authenticate(&headers)?;

        let page = query.page.unwrap_or(1);
        if page < 1 {
            return Err(field_error("page", "Page must be a positive integer"));
        }
        let limit = query.limit.unwrap_or(20);
        if !(1..=50).contains(&limit) {
            return Err(field_error("limit", "Limit must be between 1 and 50"));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let conversations = resources
            .store
            .list_conversations(&principal.user_id, page as u32, limit as u32)
            .await?;

        let total = conversations.len() as i64;
        Ok(success(json!({
            "conversations": conversations,
            "pagination": {
                "page": page,
                "limit": limit,
                "total": total,
                "pages": (total + limit - 1) / limit,
            },
        })))
    }

    /// GET /api/v1/coach/conversations/:id
    async fn get_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Json<Value>> {
        let principal = resources.auth.authenticate(&headers)?;

        let conversation = resources
            .store
            .get_conversation(&id, &principal.user_id)
            .await?;
        let messages = resources.store.get_messages(&id).await?;

        let mut data = serde_json::to_value(&conversation)
            .map_err(|e| AppError::internal(format!("Failed to serialize conversation: {e}")))?;
        data["messages"] = serde_json::to_value(&messages)
            .map_err(|e| AppError::internal(format!("Failed to serialize messages: {e}")))?;
        Ok(success(data))
    }

    /// DELETE /api/v1/coach/conversations/:id
    async fn delete_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> AppResult<Json<Value>> {
        let principal = resources.auth.authenticate(&headers)?;

        resources
            .store
            .delete_conversation(&id, &principal.user_id)
            .await?;
        Ok(success(json!({
            "message": "Conversation deleted successfully",
        })))
    }

    /// GET /api/v1/coach/models
    async fn list_models(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<Value>> {
        resources.auth.authenticate(&headers)?;

        let models = resources.provider.list_models().await?;
        Ok(success(json!({ "models": models })))
    }

    /// GET /api/v1/coach/status
    async fn status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<Value>> {
        resources.auth.authenticate(&headers)?;

        let healthy = resources.provider.check_status().await;
        Ok(success(json!({
            "status": if healthy { "healthy" } else { "unhealthy" },
            "model": resources.provider.default_model(),
        })))
    }
}
