// ABOUTME: Core domain types for coaching conversations, recovery context, and urgency tiers
// ABOUTME: Shared data structures used by the store, orchestrator, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain models for the coaching subsystem
//!
//! A [`Conversation`] is one ongoing coaching thread owned by a user. Its
//! messages are append-only; its [`UserContext`] snapshot personalizes
//! prompts; its [`ConversationStage`] tracks the dominant coaching posture
//! and only ever escalates to crisis, never auto-de-escalates.

use serde::{Deserialize, Serialize};

use crate::llm::MessageRole;

/// Coarse phase of a coaching conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStage {
    /// Initial recovery assessment
    Assessment,
    /// Recovery plan creation
    Planning,
    /// Day-to-day coaching on an active plan
    Implementation,
    /// Crisis intervention posture
    Crisis,
}

impl ConversationStage {
    /// String representation used in storage and API payloads
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Assessment => "assessment",
            Self::Planning => "planning",
            Self::Implementation => "implementation",
            Self::Crisis => "crisis",
        }
    }

    /// Parse from storage representation, defaulting to assessment
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "planning" => Self::Planning,
            "implementation" => Self::Implementation,
            "crisis" => Self::Crisis,
            _ => Self::Assessment,
        }
    }
}

/// Classified severity of a coaching response
///
/// Ordered: `Low < Medium < High < Emergency`. Emergency drives the one-way
/// stage escalation to crisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Emergency,
}

impl Urgency {
    /// String representation used in storage and API payloads
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Emergency => "emergency",
        }
    }

    /// Parse from an API payload value
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }
}

/// Aggregated emotional state from recent check-ins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    #[default]
    Stable,
    Struggling,
    Improving,
    Crisis,
}

impl EmotionalState {
    /// String representation used in prompt text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Struggling => "struggling",
            Self::Improving => "improving",
            Self::Crisis => "crisis",
        }
    }
}

/// Rolling averages from recent check-ins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProgress {
    /// Average mood rating, 1-10
    pub mood_average: f64,
    /// Average urge intensity, 0-10
    pub urge_average: f64,
    /// Habit completion rate, 0-100 percent
    pub habit_completion: f64,
}

impl Default for RecentProgress {
    fn default() -> Self {
        Self {
            mood_average: 5.0,
            urge_average: 3.0,
            habit_completion: 0.0,
        }
    }
}

/// Recovery-progress snapshot used to personalize prompts
///
/// Read-mostly from the orchestrator's perspective; only `emotional_state`
/// and `recent_progress` are updated opportunistically after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    /// Current streak in days
    pub current_streak: u32,
    /// Recent check-in averages
    pub recent_progress: RecentProgress,
    /// Recently identified triggers (order irrelevant)
    pub recent_triggers: Vec<String>,
    /// Strategies that have worked before (order irrelevant)
    pub successful_strategies: Vec<String>,
    /// Active goals in priority order
    pub current_goals: Vec<String>,
    /// Aggregated emotional state
    pub emotional_state: EmotionalState,
}

/// Kind of message content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Voice,
    Exercise,
}

impl MessageType {
    /// String representation used in storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Exercise => "exercise",
        }
    }

    /// Parse from storage representation, defaulting to text
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "voice" => Self::Voice,
            "exercise" => Self::Exercise,
            _ => Self::Text,
        }
    }
}

/// Optional per-message metadata supplied by the client with a user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    /// Mood rating at send time, 1-10
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    /// Urge intensity at send time, 0-10
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urge_intensity: Option<u8>,
    /// Trigger the user identified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_identified: Option<String>,
    /// Strategy the coach suggested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_suggested: Option<String>,
}

/// One persisted turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Unique message ID
    pub id: String,
    /// Conversation this message belongs to
    pub conversation_id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// Kind of message content
    pub message_type: MessageType,
    /// Arbitrary metadata: client metadata for user turns, classification
    /// output for assistant turns
    pub metadata: Option<serde_json::Value>,
    /// When the message was created (ISO 8601)
    pub created_at: String,
}

/// One ongoing coaching thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation ID
    pub id: String,
    /// User who owns the conversation
    pub user_id: String,
    /// Session identifier
    pub session_id: String,
    /// Latest known recovery context snapshot
    pub context: UserContext,
    /// Dominant current posture
    pub stage: ConversationStage,
    /// Set when the conversation is explicitly closed
    pub is_completed: bool,
    /// When the conversation was created (ISO 8601)
    pub created_at: String,
    /// Refreshed on every message append or stage change (ISO 8601)
    pub updated_at: String,
}

/// Structured output of one coaching turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingResponse {
    /// Reply text for the user
    pub message: String,
    /// Actionable suggestions extracted from the reply (at most 5)
    pub suggestions: Vec<String>,
    /// Follow-up questions extracted from the reply (at most 3)
    pub follow_up_questions: Vec<String>,
    /// Coping strategies referenced in the reply
    pub strategies: Vec<String>,
    /// Classified urgency tier; governs stage escalation
    pub urgency: Urgency,
}
