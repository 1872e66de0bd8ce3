// ABOUTME: Persistence layer for conversations, messages, user context, and crisis events
// ABOUTME: Defines the store trait plus its sqlite implementation and schema bootstrap
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Conversation Persistence
//!
//! All cross-request state lives here. The orchestrator and routes depend on
//! the [`ConversationStore`] trait, never on sqlite directly, so tests can
//! swap in an in-memory database.

pub mod conversations;

pub use conversations::{init_schema, ConversationStore, SqliteConversationStore};
