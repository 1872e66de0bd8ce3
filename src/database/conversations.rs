// ABOUTME: Database operations for coaching conversations, messages, and user recovery context
// ABOUTME: Enforces per-user ownership in every query; missing and foreign rows are indistinguishable
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store
//!
//! Message order is the append order, backed by a monotonic `seq` column.
//! Every read and delete carries the caller's user id in the WHERE clause,
//! so a conversation owned by someone else looks exactly like one that does
//! not exist.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::llm::MessageRole;
use crate::models::{
    Conversation, ConversationStage, MessageType, StoredMessage, Urgency, UserContext,
};

/// Greeting seeded as the first message of every new conversation
pub const INITIAL_GREETING: &str = "Hello! I'm Melius, your AI recovery coach. I'm here to support you on your recovery journey. How are you feeling today?";

/// Persistence contract for conversations and related state
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a conversation seeded with the system greeting
    async fn create_conversation(&self, user_id: &str) -> AppResult<Conversation>;

    /// Fetch a conversation owned by `user_id`; not-owned reads as not-found
    async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<Conversation>;

    /// List a user's conversations, most recently updated first
    async fn list_conversations(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> AppResult<Vec<Conversation>>;

    /// Delete a conversation and its messages; not-owned reads as not-found
    async fn delete_conversation(&self, conversation_id: &str, user_id: &str) -> AppResult<()>;

    /// Append a message and refresh the conversation's updated timestamp
    async fn append_message(&self, message: &StoredMessage) -> AppResult<()>;

    /// All messages of a conversation in append order
    async fn get_messages(&self, conversation_id: &str) -> AppResult<Vec<StoredMessage>>;

    /// The most recent `limit` messages, returned oldest-first
    async fn get_recent_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> AppResult<Vec<StoredMessage>>;

    /// Set the conversation stage
    async fn update_stage(
        &self,
        conversation_id: &str,
        stage: ConversationStage,
    ) -> AppResult<()>;

    /// Replace the conversation's context snapshot
    async fn update_conversation_context(
        &self,
        conversation_id: &str,
        context: &UserContext,
    ) -> AppResult<()>;

    /// Latest known recovery context for a user, default when none stored
    async fn get_user_context(&self, user_id: &str) -> AppResult<UserContext>;

    /// Upsert a user's recovery context snapshot
    async fn update_user_context(&self, user_id: &str, context: &UserContext) -> AppResult<()>;

    /// Record a crisis escalation for audit
    async fn log_crisis_event(
        &self,
        user_id: &str,
        urgency: Urgency,
        details: &serde_json::Value,
    ) -> AppResult<()>;
}

/// Create the schema if it does not exist
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub async fn init_schema(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            session_id TEXT NOT NULL,
            context TEXT NOT NULL,
            stage TEXT NOT NULL,
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to create conversations table: {e}")))?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS messages (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL,
            conversation_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            message_type TEXT NOT NULL,
            metadata TEXT,
            created_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to create messages table: {e}")))?;

    sqlx::query(
        r"
        CREATE INDEX IF NOT EXISTS idx_messages_conversation
        ON messages (conversation_id, seq)
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to create message index: {e}")))?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS user_contexts (
            user_id TEXT PRIMARY KEY,
            context TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to create user_contexts table: {e}")))?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS crisis_events (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            urgency TEXT NOT NULL,
            details TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to create crisis_events table: {e}")))?;

    Ok(())
}

/// Sqlite-backed conversation store
pub struct SqliteConversationStore {
    pool: SqlitePool,
}

impl SqliteConversationStore {
    /// Create a store over an existing pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> AppResult<Conversation> {
        let context_json: String = row.get("context");
        let context: UserContext = serde_json::from_str(&context_json)
            .map_err(|e| AppError::database(format!("Corrupt context column: {e}")))?;
        let stage: String = row.get("stage");

        Ok(Conversation {
            id: row.get("id"),
            user_id: row.get("user_id"),
            session_id: row.get("session_id"),
            context,
            stage: ConversationStage::from_str_or_default(&stage),
            is_completed: row.get::<i64, _>("is_completed") != 0,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> AppResult<StoredMessage> {
        let role: String = row.get("role");
        let role = MessageRole::parse(&role)
            .ok_or_else(|| AppError::database(format!("Unknown message role: {role}")))?;
        let message_type: String = row.get("message_type");
        let metadata: Option<String> = row.get("metadata");
        let metadata = match metadata {
            Some(json) => Some(
                serde_json::from_str(&json)
                    .map_err(|e| AppError::database(format!("Corrupt metadata column: {e}")))?,
            ),
            None => None,
        };

        Ok(StoredMessage {
            id: row.get("id"),
            conversation_id: row.get("conversation_id"),
            role,
            content: row.get("content"),
            message_type: MessageType::from_str_or_default(&message_type),
            metadata,
            created_at: row.get("created_at"),
        })
    }

    fn serialize_context(context: &UserContext) -> AppResult<String> {
        serde_json::to_string(context)
            .map_err(|e| AppError::internal(format!("Failed to serialize context: {e}")))
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn create_conversation(&self, user_id: &str) -> AppResult<Conversation> {
        let id = Uuid::new_v4().to_string();
        let session_id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let context = self.get_user_context(user_id).await?;
        let context_json = Self::serialize_context(&context)?;
        let stage = ConversationStage::Assessment;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to start transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO conversations (id, user_id, session_id, context, stage, is_completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $6)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&session_id)
        .bind(&context_json)
        .bind(stage.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, role, content, message_type, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, NULL, $6)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&id)
        .bind(MessageRole::System.as_str())
        .bind(INITIAL_GREETING)
        .bind(MessageType::Text.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to seed greeting: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit conversation: {e}")))?;

        Ok(Conversation {
            id,
            user_id: user_id.to_owned(),
            session_id,
            context,
            stage,
            is_completed: false,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<Conversation> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, session_id, context, stage, is_completed, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.map_or_else(
            || Err(AppError::not_found("Conversation")),
            |r| Self::row_to_conversation(&r),
        )
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> AppResult<Vec<Conversation>> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);
        let rows = sqlx::query(
            r"
            SELECT id, user_id, session_id, context, stage, is_completed, created_at, updated_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        rows.iter().map(Self::row_to_conversation).collect()
    }

    async fn delete_conversation(&self, conversation_id: &str, user_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            r"
            DELETE FROM conversations
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete conversation: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Conversation"));
        }

        sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete messages: {e}")))?;

        Ok(())
    }

    async fn append_message(&self, message: &StoredMessage) -> AppResult<()> {
        let metadata_json = match &message.metadata {
            Some(value) => Some(
                serde_json::to_string(value)
                    .map_err(|e| AppError::internal(format!("Failed to serialize metadata: {e}")))?,
            ),
            None => None,
        };

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, role, content, message_type, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(metadata_json)
        .bind(&message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to append message: {e}")))?;

        sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(&message.created_at)
            .bind(&message.conversation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to touch conversation: {e}")))?;

        Ok(())
    }

    async fn get_messages(&self, conversation_id: &str) -> AppResult<Vec<StoredMessage>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, role, content, message_type, metadata, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY seq ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn get_recent_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> AppResult<Vec<StoredMessage>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, role, content, message_type, metadata, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY seq DESC
            LIMIT $2
            ",
        )
        .bind(conversation_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recent messages: {e}")))?;

        let mut messages: Vec<StoredMessage> = rows
            .iter()
            .map(Self::row_to_message)
            .collect::<AppResult<_>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn update_stage(
        &self,
        conversation_id: &str,
        stage: ConversationStage,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r"
            UPDATE conversations
            SET stage = $1, updated_at = $2
            WHERE id = $3
            ",
        )
        .bind(stage.as_str())
        .bind(&now)
        .bind(conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update stage: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Conversation"));
        }
        Ok(())
    }

    async fn update_conversation_context(
        &self,
        conversation_id: &str,
        context: &UserContext,
    ) -> AppResult<()> {
        let context_json = Self::serialize_context(context)?;
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE conversations
            SET context = $1, updated_at = $2
            WHERE id = $3
            ",
        )
        .bind(&context_json)
        .bind(&now)
        .bind(conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update context: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Conversation"));
        }
        Ok(())
    }

    async fn get_user_context(&self, user_id: &str) -> AppResult<UserContext> {
        let row = sqlx::query("SELECT context FROM user_contexts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user context: {e}")))?;

        match row {
            Some(r) => {
                let json: String = r.get("context");
                serde_json::from_str(&json)
                    .map_err(|e| AppError::database(format!("Corrupt user context: {e}")))
            }
            None => Ok(UserContext::default()),
        }
    }

    async fn update_user_context(&self, user_id: &str, context: &UserContext) -> AppResult<()> {
        let context_json = Self::serialize_context(context)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO user_contexts (user_id, context, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET context = $2, updated_at = $3
            ",
        )
        .bind(user_id)
        .bind(&context_json)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update user context: {e}")))?;

        Ok(())
    }

    async fn log_crisis_event(
        &self,
        user_id: &str,
        urgency: Urgency,
        details: &serde_json::Value,
    ) -> AppResult<()> {
        let details_json = serde_json::to_string(details)
            .map_err(|e| AppError::internal(format!("Failed to serialize crisis details: {e}")))?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO crisis_events (id, user_id, urgency, details, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(urgency.as_str())
        .bind(&details_json)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to log crisis event: {e}")))?;

        Ok(())
    }
}
