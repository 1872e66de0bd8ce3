// ABOUTME: Coach orchestrator driving one coaching turn end-to-end: prompt, complete, classify, persist
// ABOUTME: Contains provider failures behind safe static content; crisis path never returns empty-handed
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coach orchestrator
//!
//! Wires the completion provider, prompt builder, classifier, and store into
//! the turn-level operations. Provider failures during chat and crisis are
//! contained here: the caller always receives a safe, non-empty response
//! while the failure is logged for operators. Store failures propagate, there
//! is no safe default to fabricate for persistence.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::classifier;
use super::journal::{JournalAnalysis, JournalAnalyzer};
use super::prompts::{self, AssessmentProfile, DailyCheckIn, ProgressSummary};
use crate::config::GenerationDefaults;
use crate::database::ConversationStore;
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, CompletionProvider, MessageRole};
use crate::models::{
    CoachingResponse, ConversationStage, EmotionalState, MessageMetadata, MessageType,
    StoredMessage, Urgency, UserContext,
};

/// Number of trailing messages included in the prompt window
const MESSAGE_WINDOW: u32 = 10;

/// Crisis completions run colder and shorter than regular chat
const CRISIS_TEMPERATURE: f32 = 0.3;
const CRISIS_MAX_TOKENS: u32 = 500;

/// Assessment-question generation parameters
const ASSESSMENT_TEMPERATURE: f32 = 0.5;
const ASSESSMENT_MAX_TOKENS: u32 = 800;

/// Maximum assessment questions surfaced to the caller
const MAX_ASSESSMENT_QUESTIONS: usize = 5;

/// Static reply used when the provider fails during a regular chat turn
const CHAT_FALLBACK_MESSAGE: &str = "I'm having trouble responding right now, but I'm still here with you. If you are in distress, please call 988 (Suicide & Crisis Lifeline) or 911 in an emergency. Let's try again in a moment.";

/// Static reply used when the provider fails during crisis handling
const CRISIS_FALLBACK_MESSAGE: &str = "I understand you're in crisis. Please call 988 immediately for 24/7 support, or dial 911 if you're in immediate danger. You deserve help and support is available.";

/// Emergency contacts attached to every crisis response
pub const EMERGENCY_CONTACTS: [&str; 3] = [
    "988 - Suicide & Crisis Lifeline",
    "911 - Emergency Services",
    "Text HOME to 741741 - Crisis Text Line",
];

/// Canned crisis suggestions returned alongside the generated message
const CRISIS_SUGGESTIONS: [&str; 4] = [
    "Call 988 for immediate support",
    "Use the 5-4-3-2-1 grounding technique",
    "Practice deep breathing: 4 seconds in, 7 hold, 8 out",
    "Remove yourself from triggering environment",
];

/// Canned crisis suggestions for the provider-failure fallback
const CRISIS_FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Call 988 - Suicide & Crisis Lifeline",
    "Call 911 for emergency",
    "Text HOME to 741741 for crisis text line",
];

const CRISIS_FOLLOW_UPS: [&str; 3] = [
    "Are you in a safe place right now?",
    "Is there someone you can contact immediately?",
    "What has helped you in similar situations before?",
];

const CRISIS_STRATEGIES: [&str; 4] = ["grounding", "breathing", "distraction", "social_support"];

/// Fallback assessment questions when generation fails
const ASSESSMENT_FALLBACK_QUESTIONS: [&str; 5] = [
    "What led you to start your recovery journey today?",
    "What are your biggest challenges right now?",
    "What support systems do you have available?",
    "What strategies have helped you in the past?",
    "What does success look like for you?",
];

/// Result of one chat turn, pairing the response with its conversation
#[derive(Debug, Clone)]
pub struct CoachTurn {
    pub conversation_id: String,
    pub response: CoachingResponse,
}

/// Inbound crisis escalation payload
#[derive(Debug, Clone)]
pub struct CrisisRequest {
    /// Free-form situation description supplied by the client
    pub crisis_data: serde_json::Value,
    /// Urgency as reported by the client
    pub urgency: Urgency,
}

/// Crisis response with emergency contacts attached
#[derive(Debug, Clone)]
pub struct CrisisResponse {
    pub response: CoachingResponse,
    pub emergency_contacts: Vec<String>,
}

/// A generated recovery plan with extracted guidance
#[derive(Debug, Clone)]
pub struct RecoveryPlan {
    pub plan: String,
    pub suggestions: Vec<String>,
    pub follow_up_questions: Vec<String>,
}

/// Inbound assessment payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    /// Primary recovery goal
    pub primary_goal: Option<String>,
    /// Recovery start date (free text)
    pub start_date: Option<String>,
    /// Previous recovery attempts
    pub previous_attempts: Option<String>,
    /// Current streak in days
    pub current_streak: Option<u32>,
    /// Stated goals, in priority order
    #[serde(default)]
    pub goals: Vec<String>,
}

/// Coach orchestrator
///
/// Explicitly constructed at startup and shared behind `Arc`; holds no
/// request-scoped state.
pub struct CoachService {
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn ConversationStore>,
    journal: JournalAnalyzer,
    generation: GenerationDefaults,
    crisis_timeout_secs: u64,
}

impl CoachService {
    /// Create the orchestrator from its collaborators
    #[must_use]
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn ConversationStore>,
        journal: JournalAnalyzer,
        generation: GenerationDefaults,
        crisis_timeout_secs: u64,
    ) -> Self {
        Self {
            provider,
            store,
            journal,
            generation,
            crisis_timeout_secs,
        }
    }

    /// Handle one chat turn
    ///
    /// Resolves or creates the conversation, appends the user message, runs
    /// the completion against the trailing message window, classifies the
    /// reply, persists the assistant turn, and escalates the stage when the
    /// classified urgency is emergency.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown or foreign conversation id, and
    /// database errors from persistence. Provider failures do not surface
    /// here; they degrade to a static fallback reply.
    pub async fn handle_message(
        &self,
        conversation_id: Option<&str>,
        user_id: &str,
        text: &str,
        metadata: Option<MessageMetadata>,
    ) -> AppResult<CoachTurn> {
        let conversation = match conversation_id {
            Some(id) => self.store.get_conversation(id, user_id).await?,
            None => self.store.create_conversation(user_id).await?,
        };
        let context = conversation.context.clone();

        let user_metadata = match &metadata {
            Some(m) => Some(serde_json::to_value(m).map_err(|e| {
                AppError::internal(format!("Failed to serialize metadata: {e}"))
            })?),
            None => None,
        };
        self.store
            .append_message(&new_message(
                &conversation.id,
                MessageRole::User,
                text,
                user_metadata,
            ))
            .await?;

        let window = self
            .store
            .get_recent_messages(&conversation.id, MESSAGE_WINDOW)
            .await?;

        let system = prompts::system_prompt(conversation.stage, &context);
        let mut chat_messages = Vec::with_capacity(window.len() + 1);
        chat_messages.push(ChatMessage::system(system));
        chat_messages.extend(
            window
                .iter()
                .map(|m| ChatMessage::new(m.role, m.content.clone())),
        );

        let request = ChatRequest::new(chat_messages)
            .with_temperature(self.generation.temperature)
            .with_max_tokens(self.generation.max_tokens)
            .with_top_p(self.generation.top_p)
            .with_penalties(
                self.generation.presence_penalty,
                self.generation.frequency_penalty,
            );

        let (message_text, classification) = match self.provider.complete(&request).await {
            Ok(reply) => {
                let classification = classifier::classify(&reply.content, &context);
                (reply.content, classification)
            }
            Err(e) => {
                error!(
                    conversation_id = %conversation.id,
                    error = %e,
                    "Completion failed, serving fallback reply"
                );
                // Classify the empty string so urgency still reflects context.
                let classification = classifier::classify("", &context);
                (CHAT_FALLBACK_MESSAGE.to_owned(), classification)
            }
        };

        let assistant_metadata = serde_json::json!({
            "suggestions": classification.suggestions,
            "followUpQuestions": classification.follow_up_questions,
            "strategies": classification.strategies,
            "urgency": classification.urgency,
        });
        self.store
            .append_message(&new_message(
                &conversation.id,
                MessageRole::Assistant,
                &message_text,
                Some(assistant_metadata),
            ))
            .await?;

        if classification.urgency == Urgency::Emergency {
            warn!(conversation_id = %conversation.id, "Emergency urgency classified, escalating stage");
            self.store
                .update_stage(&conversation.id, ConversationStage::Crisis)
                .await?;
        }

        self.refresh_context(&conversation.id, user_id, context, metadata.as_ref(), classification.urgency)
            .await?;

        Ok(CoachTurn {
            conversation_id: conversation.id,
            response: CoachingResponse {
                message: message_text,
                suggestions: classification.suggestions,
                follow_up_questions: classification.follow_up_questions,
                strategies: classification.strategies,
                urgency: classification.urgency,
            },
        })
    }

    /// Handle a crisis escalation, bypassing the conversation window
    ///
    /// Forces urgency to emergency regardless of any classification, attaches
    /// fixed emergency contacts, and logs the event. Never returns without a
    /// message: provider failure degrades to a hard-coded safety reply.
    ///
    /// # Errors
    ///
    /// Returns database errors from crisis-event logging only.
    pub async fn handle_crisis(
        &self,
        user_id: &str,
        request: &CrisisRequest,
    ) -> AppResult<CrisisResponse> {
        let chat_request = ChatRequest::new(vec![
            ChatMessage::system(prompts::crisis_system_prompt()),
            ChatMessage::user(prompts::crisis_user_prompt(request.urgency.as_str())),
        ])
        .with_temperature(CRISIS_TEMPERATURE)
        .with_max_tokens(CRISIS_MAX_TOKENS)
        .with_timeout_secs(self.crisis_timeout_secs);

        let response = match self.provider.complete(&chat_request).await {
            Ok(reply) => CoachingResponse {
                message: reply.content,
                suggestions: to_strings(&CRISIS_SUGGESTIONS),
                follow_up_questions: to_strings(&CRISIS_FOLLOW_UPS),
                strategies: to_strings(&CRISIS_STRATEGIES),
                urgency: Urgency::Emergency,
            },
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Crisis completion failed, serving static safety reply");
                CoachingResponse {
                    message: CRISIS_FALLBACK_MESSAGE.to_owned(),
                    suggestions: to_strings(&CRISIS_FALLBACK_SUGGESTIONS),
                    follow_up_questions: Vec::new(),
                    strategies: Vec::new(),
                    urgency: Urgency::Emergency,
                }
            }
        };

        self.store
            .log_crisis_event(
                user_id,
                request.urgency,
                &serde_json::json!({
                    "crisisData": request.crisis_data,
                    "response": response.message,
                }),
            )
            .await?;
        info!(user_id = %user_id, urgency = request.urgency.as_str(), "Crisis event logged");

        Ok(CrisisResponse {
            response,
            emergency_contacts: to_strings(&EMERGENCY_CONTACTS),
        })
    }

    /// Generate initial assessment questions
    ///
    /// Falls back to a fixed question set when generation fails; an
    /// assessment should never come back empty.
    ///
    /// # Errors
    ///
    /// Infallible beyond the signature; kept fallible for symmetry with the
    /// other operations.
    pub async fn generate_assessment_questions(
        &self,
        request: &AssessmentRequest,
    ) -> AppResult<Vec<String>> {
        let profile = AssessmentProfile {
            primary_goal: request.primary_goal.clone(),
            start_date: request.start_date.clone(),
            previous_attempts: request.previous_attempts.clone(),
        };
        let chat_request = ChatRequest::new(vec![ChatMessage::user(prompts::assessment_prompt(
            &profile,
        ))])
        .with_temperature(ASSESSMENT_TEMPERATURE)
        .with_max_tokens(ASSESSMENT_MAX_TOKENS);

        match self.provider.complete(&chat_request).await {
            Ok(reply) => {
                let questions = extract_questions(&reply.content);
                if questions.is_empty() {
                    Ok(to_strings(&ASSESSMENT_FALLBACK_QUESTIONS))
                } else {
                    Ok(questions)
                }
            }
            Err(e) => {
                error!(error = %e, "Assessment question generation failed, using fallback set");
                Ok(to_strings(&ASSESSMENT_FALLBACK_QUESTIONS))
            }
        }
    }

    /// Generate a personalized recovery plan from assessment answers
    ///
    /// When `conversation_id` is given, the conversation's stage moves to
    /// planning, realizing the explicit assessment-to-planning transition.
    ///
    /// # Errors
    ///
    /// Propagates provider failures; unlike chat there is no canned plan to
    /// fall back on. Returns not-found for a foreign conversation id.
    pub async fn generate_plan(
        &self,
        user_id: &str,
        request: &AssessmentRequest,
        conversation_id: Option<&str>,
    ) -> AppResult<RecoveryPlan> {
        let context = UserContext {
            current_streak: request.current_streak.unwrap_or(0),
            current_goals: request.goals.clone(),
            ..UserContext::default()
        };

        let chat_request = ChatRequest::new(vec![
            ChatMessage::system(prompts::system_prompt(ConversationStage::Planning, &context)),
            ChatMessage::user(prompts::planning_prompt(&request.goals, &context)),
        ])
        .with_temperature(self.generation.temperature)
        .with_max_tokens(self.generation.max_tokens);

        let reply = self.provider.complete(&chat_request).await?;
        let classification = classifier::classify(&reply.content, &context);

        if let Some(id) = conversation_id {
            // Ownership check before the stage transition.
            self.store.get_conversation(id, user_id).await?;
            self.store
                .update_stage(id, ConversationStage::Planning)
                .await?;
        }

        Ok(RecoveryPlan {
            plan: reply.content,
            suggestions: classification.suggestions,
            follow_up_questions: classification.follow_up_questions,
        })
    }

    /// Review a daily check-in and respond with classified coaching output
    ///
    /// # Errors
    ///
    /// Propagates provider and database failures; check-ins are not a safety
    /// path and have no canned fallback.
    pub async fn review_check_in(
        &self,
        user_id: &str,
        check_in: &DailyCheckIn,
    ) -> AppResult<CoachingResponse> {
        let context = self.store.get_user_context(user_id).await?;
        self.contextual_reply(&context, prompts::daily_check_in_prompt(check_in))
            .await
    }

    /// Analyze the user's recurring triggers from their stored context
    ///
    /// # Errors
    ///
    /// Propagates provider and database failures.
    pub async fn analyze_triggers(&self, user_id: &str) -> AppResult<CoachingResponse> {
        let context = self.store.get_user_context(user_id).await?;
        self.contextual_reply(
            &context,
            prompts::trigger_analysis_prompt(&context.recent_triggers),
        )
        .await
    }

    /// Generate an encouragement message from a progress summary
    ///
    /// # Errors
    ///
    /// Propagates provider and database failures.
    pub async fn encourage(
        &self,
        user_id: &str,
        progress: &ProgressSummary,
    ) -> AppResult<CoachingResponse> {
        let context = self.store.get_user_context(user_id).await?;
        self.contextual_reply(&context, prompts::encouragement_prompt(progress))
            .await
    }

    /// Analyze a journal entry against the user's stored recovery context
    ///
    /// # Errors
    ///
    /// Returns database errors from the context lookup.
    pub async fn analyze_journal(
        &self,
        user_id: &str,
        entry: &str,
        mood: Option<u8>,
    ) -> AppResult<JournalAnalysis> {
        let context = self.store.get_user_context(user_id).await?;
        Ok(self.journal.analyze(entry, mood, &context))
    }

    /// Run a one-off completion against the user's context and classify it
    ///
    /// Shared by the windowless operations: the prompt carries the context,
    /// no conversation is touched.
    async fn contextual_reply(
        &self,
        context: &UserContext,
        user_prompt: String,
    ) -> AppResult<CoachingResponse> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(prompts::system_prompt(
                ConversationStage::Implementation,
                context,
            )),
            ChatMessage::user(user_prompt),
        ])
        .with_temperature(self.generation.temperature)
        .with_max_tokens(self.generation.max_tokens);

        let reply = self.provider.complete(&request).await?;
        let classification = classifier::classify(&reply.content, context);
        Ok(CoachingResponse {
            message: reply.content,
            suggestions: classification.suggestions,
            follow_up_questions: classification.follow_up_questions,
            strategies: classification.strategies,
            urgency: classification.urgency,
        })
    }

    /// Opportunistically refresh the context snapshot after classification
    ///
    /// Only `emotional_state` and `recent_progress` move; everything else is
    /// owned by external aggregation.
    async fn refresh_context(
        &self,
        conversation_id: &str,
        user_id: &str,
        mut context: UserContext,
        metadata: Option<&MessageMetadata>,
        urgency: Urgency,
    ) -> AppResult<()> {
        let mut changed = false;

        match urgency {
            Urgency::Emergency if context.emotional_state != EmotionalState::Crisis => {
                context.emotional_state = EmotionalState::Crisis;
                changed = true;
            }
            Urgency::High if context.emotional_state == EmotionalState::Stable => {
                context.emotional_state = EmotionalState::Struggling;
                changed = true;
            }
            _ => {}
        }

        if let Some(meta) = metadata {
            if let Some(mood) = meta.mood {
                context.recent_progress.mood_average =
                    (context.recent_progress.mood_average + f64::from(mood)) / 2.0;
                changed = true;
            }
            if let Some(urge) = meta.urge_intensity {
                context.recent_progress.urge_average =
                    (context.recent_progress.urge_average + f64::from(urge)) / 2.0;
                changed = true;
            }
        }

        if changed {
            self.store
                .update_conversation_context(conversation_id, &context)
                .await?;
            self.store.update_user_context(user_id, &context).await?;
        }
        Ok(())
    }
}

/// Build a fresh message for appending
fn new_message(
    conversation_id: &str,
    role: MessageRole,
    content: &str,
    metadata: Option<serde_json::Value>,
) -> StoredMessage {
    StoredMessage {
        id: Uuid::new_v4().to_string(),
        conversation_id: conversation_id.to_owned(),
        role,
        content: content.to_owned(),
        message_type: MessageType::Text,
        metadata,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Pull question lines out of generated assessment text
fn extract_questions(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.contains('?'))
        .map(|line| {
            line.trim_start()
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches('.')
                .trim()
                .to_owned()
        })
        .filter(|q| q.len() > 10)
        .take(MAX_ASSESSMENT_QUESTIONS)
        .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_questions_strips_numbering() {
        let text = "Here are some questions:\n1. What brings you here today?\n2. Who supports you?\nShort?\nNot a question line.";
        let questions = extract_questions(text);
        assert_eq!(
            questions,
            vec!["What brings you here today?", "Who supports you?"]
        );
    }

    #[test]
    fn test_extract_questions_caps_at_five() {
        let text = (1..=7)
            .map(|i| format!("{i}. Is this question number {i} of the list?"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(extract_questions(&text).len(), 5);
    }
}
