// ABOUTME: Shared fixtures for integration tests: in-memory store, mock provider, server wiring
// ABOUTME: Each test gets its own sqlite memory database and a ready-signed bearer token

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;

use melius_coach::auth::AuthManager;
use melius_coach::coach::{CoachService, JournalAnalyzer};
use melius_coach::config::GenerationDefaults;
use melius_coach::database::{init_schema, ConversationStore, SqliteConversationStore};
use melius_coach::errors::{AppError, AppResult};
use melius_coach::llm::{ChatRequest, ChatResponse, CompletionProvider, ModelInfo};
use melius_coach::routes::ServerResources;

pub const TEST_USER: &str = "test-user";
pub const OTHER_USER: &str = "other-user";
const TEST_SECRET: &str = "integration-test-secret-key";

/// How the mock provider behaves on every call
#[derive(Clone)]
pub enum MockBehavior {
    /// Return this text as the completion
    Reply(String),
    /// Fail with an upstream error
    Fail,
}

/// Completion provider double for tests
pub struct MockProvider {
    behavior: MockBehavior,
}

impl MockProvider {
    pub fn replying(text: &str) -> Arc<dyn CompletionProvider> {
        Arc::new(Self {
            behavior: MockBehavior::Reply(text.to_owned()),
        })
    }

    pub fn failing() -> Arc<dyn CompletionProvider> {
        Arc::new(Self {
            behavior: MockBehavior::Fail,
        })
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> AppResult<ChatResponse> {
        match &self.behavior {
            MockBehavior::Reply(text) => Ok(ChatResponse {
                content: text.clone(),
                model: "mock-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            MockBehavior::Fail => Err(AppError::external_service("mock", "simulated outage")),
        }
    }

    async fn list_models(&self) -> AppResult<Vec<ModelInfo>> {
        match &self.behavior {
            MockBehavior::Reply(_) => Ok(vec![ModelInfo {
                id: "mock-model".to_owned(),
                name: Some("Mock Model".to_owned()),
            }]),
            MockBehavior::Fail => Err(AppError::external_service("mock", "simulated outage")),
        }
    }

    async fn check_status(&self) -> bool {
        matches!(self.behavior, MockBehavior::Reply(_))
    }
}

/// Fresh store over a private in-memory database
pub async fn memory_store() -> Arc<dyn ConversationStore> {
    // A single connection keeps every query on the same :memory: database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    init_schema(&pool).await.expect("Failed to create schema");
    Arc::new(SqliteConversationStore::new(pool))
}

/// Coach service over a fresh store and the given provider
pub async fn coach_service(
    provider: Arc<dyn CompletionProvider>,
) -> (CoachService, Arc<dyn ConversationStore>) {
    let store = memory_store().await;
    let coach = CoachService::new(
        provider,
        Arc::clone(&store),
        JournalAnalyzer::default(),
        GenerationDefaults::default(),
        20,
    );
    (coach, store)
}

/// Full server resources plus a bearer header for `TEST_USER`
pub async fn test_resources(
    provider: Arc<dyn CompletionProvider>,
) -> (Arc<ServerResources>, String) {
    let store = memory_store().await;
    let coach = CoachService::new(
        Arc::clone(&provider),
        Arc::clone(&store),
        JournalAnalyzer::default(),
        GenerationDefaults::default(),
        20,
    );
    let auth = AuthManager::new(TEST_SECRET);
    let token = auth
        .generate_token(TEST_USER)
        .expect("Failed to sign test token");

    let resources = Arc::new(ServerResources::new(coach, store, provider, auth));
    (resources, format!("Bearer {token}"))
}
