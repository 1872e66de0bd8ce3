// ABOUTME: Lexical classification of raw coach replies into structured coaching output
// ABOUTME: Extracts suggestions, follow-up questions, strategies, and an urgency tier
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response classification
//!
//! Keyword heuristics over the raw reply text. Urgency precedence is strict:
//! emergency beats high beats medium beats low, first match wins. The same
//! rules run against an empty string when the provider fails, so fallback
//! turns are still classified from context alone.

use crate::models::{EmotionalState, Urgency, UserContext};

/// Keywords that force the emergency tier
const EMERGENCY_KEYWORDS: [&str; 7] = [
    "crisis",
    "emergency",
    "urgent",
    "immediate",
    "danger",
    "suicide",
    "harm",
];

/// Keywords that raise the tier to high
const HIGH_URGENCY_KEYWORDS: [&str; 5] = [
    "difficult",
    "struggle",
    "intense",
    "overwhelmed",
    "triggered",
];

/// Fixed strategy vocabulary; output order follows this order
const STRATEGY_VOCABULARY: [&str; 7] = [
    "breathe",
    "meditate",
    "exercise",
    "journal",
    "connect",
    "grounding",
    "distraction",
];

/// Maximum suggestions surfaced per turn
const MAX_SUGGESTIONS: usize = 5;

/// Maximum follow-up questions surfaced per turn
const MAX_FOLLOW_UP_QUESTIONS: usize = 3;

/// Structured classification of one raw reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub suggestions: Vec<String>,
    pub follow_up_questions: Vec<String>,
    pub strategies: Vec<String>,
    pub urgency: Urgency,
}

/// Classify a raw reply against the user's recovery context
#[must_use]
pub fn classify(raw_text: &str, context: &UserContext) -> Classification {
    Classification {
        suggestions: extract_suggestions(raw_text),
        follow_up_questions: extract_follow_up_questions(raw_text),
        strategies: extract_strategies(raw_text),
        urgency: assess_urgency(raw_text, context),
    }
}

/// Extract bullet or numbered list items, markers stripped, capped at 5
#[must_use]
pub fn extract_suggestions(raw_text: &str) -> Vec<String> {
    raw_text
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            strip_bullet_marker(trimmed)
                .or_else(|| strip_numbered_marker(trimmed))
                .map(|rest| rest.trim().to_owned())
        })
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect()
}

fn strip_bullet_marker(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "\u{2022} "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest);
        }
    }
    None
}

fn strip_numbered_marker(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ").or_else(|| rest.strip_prefix(".\t"))
}

/// Extract sentences containing a question mark, trimmed, capped at 3
#[must_use]
pub fn extract_follow_up_questions(raw_text: &str) -> Vec<String> {
    raw_text
        .split_inclusive(['.', '!', '?'])
        .filter(|sentence| sentence.contains('?'))
        .map(|sentence| sentence.trim().to_owned())
        .filter(|s| !s.is_empty())
        .take(MAX_FOLLOW_UP_QUESTIONS)
        .collect()
}

/// Presence test against the fixed strategy vocabulary, in vocabulary order
#[must_use]
pub fn extract_strategies(raw_text: &str) -> Vec<String> {
    let lower = raw_text.to_lowercase();
    STRATEGY_VOCABULARY
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .map(|keyword| (*keyword).to_owned())
        .collect()
}

/// Assess the urgency tier of a reply; first matching rule wins
///
/// 1. emergency: reply contains an emergency keyword
/// 2. high: reply contains a high-urgency keyword, or context is in crisis
/// 3. medium: context is struggling, or urge average exceeds 6
/// 4. low: otherwise
#[must_use]
pub fn assess_urgency(raw_text: &str, context: &UserContext) -> Urgency {
    let lower = raw_text.to_lowercase();

    if EMERGENCY_KEYWORDS.iter().any(|word| lower.contains(word)) {
        return Urgency::Emergency;
    }

    if HIGH_URGENCY_KEYWORDS.iter().any(|word| lower.contains(word))
        || context.emotional_state == EmotionalState::Crisis
    {
        return Urgency::High;
    }

    if context.emotional_state == EmotionalState::Struggling
        || context.recent_progress.urge_average > 6.0
    {
        return Urgency::Medium;
    }

    Urgency::Low
}
