// ABOUTME: HTTP route handlers for the coach API and health endpoints
// ABOUTME: Holds the shared server resources passed to every handler as axum state
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HTTP Routes
//!
//! Route handlers grouped by concern. All coach endpoints authenticate
//! per-request; health endpoints are open for load balancers.

pub mod coach;
pub mod health;

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::coach::CoachService;
use crate::database::ConversationStore;
use crate::llm::CompletionProvider;

pub use coach::CoachRoutes;
pub use health::HealthRoutes;

/// Shared resources wired once at startup and handed to every handler
pub struct ServerResources {
    /// Coach orchestrator
    pub coach: CoachService,
    /// Conversation persistence
    pub store: Arc<dyn ConversationStore>,
    /// Completion provider, used directly by status and model listing
    pub provider: Arc<dyn CompletionProvider>,
    /// Token validation
    pub auth: AuthManager,
}

impl ServerResources {
    /// Bundle the server resources
    #[must_use]
    pub fn new(
        coach: CoachService,
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn CompletionProvider>,
        auth: AuthManager,
    ) -> Self {
        Self {
            coach,
            store,
            provider,
            auth,
        }
    }
}
