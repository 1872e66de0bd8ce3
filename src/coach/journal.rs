// ABOUTME: Lexical sentiment analysis of journal entries with canned insight and pattern text
// ABOUTME: Counts fixed positive/negative word lists; word count gates the depth suggestion
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Journal analysis
//!
//! Independent of conversation state. Sentiment is a strict-majority vote
//! between two fixed word lists; ties are neutral. All output strings are
//! canned, selected by sentiment bucket and a handful of keyword scans.

use serde::{Deserialize, Serialize};

use crate::models::UserContext;

/// Words counted toward a positive sentiment
const POSITIVE_WORDS: [&str; 15] = [
    "happy",
    "good",
    "great",
    "excellent",
    "proud",
    "accomplished",
    "success",
    "progress",
    "grateful",
    "calm",
    "peaceful",
    "confident",
    "hopeful",
    "motivated",
    "strong",
];

/// Words counted toward a negative sentiment
const NEGATIVE_WORDS: [&str; 23] = [
    "struggle",
    "difficult",
    "hard",
    "bad",
    "sad",
    "angry",
    "frustrated",
    "tempted",
    "urges",
    "anxious",
    "depressed",
    "lonely",
    "isolated",
    "ashamed",
    "guilty",
    "hopeless",
    "overwhelmed",
    "tired",
    "exhausted",
    "triggered",
    "stressed",
    "failed",
    "relapse",
];

/// Default word-count threshold separating brief entries from detailed ones
pub const DEFAULT_DEPTH_THRESHOLD: usize = 50;

/// Three-way sentiment of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// String representation used in API payloads
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

/// Structured analysis of one journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalAnalysis {
    /// Canned insight strings selected by sentiment bucket
    pub insights: Vec<String>,
    /// Canned pattern strings from keyword scans
    pub patterns: Vec<String>,
    /// Canned suggestions, depth-gated by word count
    pub suggestions: Vec<String>,
    /// Echoed mood rating, defaulting to the midpoint
    pub mood: u8,
    /// Derived sentiment
    pub sentiment: Sentiment,
    /// Number of whitespace-separated words in the entry
    pub word_count: usize,
}

/// Journal entry analyzer
#[derive(Debug, Clone)]
pub struct JournalAnalyzer {
    /// Word count at or above which an entry counts as detailed
    depth_threshold: usize,
}

impl Default for JournalAnalyzer {
    fn default() -> Self {
        Self {
            depth_threshold: DEFAULT_DEPTH_THRESHOLD,
        }
    }
}

impl JournalAnalyzer {
    /// Create an analyzer with a custom depth threshold
    #[must_use]
    pub const fn with_depth_threshold(depth_threshold: usize) -> Self {
        Self { depth_threshold }
    }

    /// Analyze a journal entry against the user's recovery context
    #[must_use]
    pub fn analyze(
        &self,
        entry: &str,
        mood: Option<u8>,
        _context: &UserContext,
    ) -> JournalAnalysis {
        let lower = entry.to_lowercase();

        let positive_count = POSITIVE_WORDS
            .iter()
            .filter(|word| lower.contains(*word))
            .count();
        let negative_count = NEGATIVE_WORDS
            .iter()
            .filter(|word| lower.contains(*word))
            .count();

        let (sentiment, insights) = if positive_count > negative_count {
            (
                Sentiment::Positive,
                vec![
                    "Your journal shows positive reflection and growth mindset. Keep building on this momentum!"
                        .to_owned(),
                ],
            )
        } else if negative_count > positive_count {
            (
                Sentiment::Negative,
                vec![
                    "Recognizing difficult emotions shows self-awareness and courage to seek support."
                        .to_owned(),
                    "You're facing challenges, but reaching out shows incredible courage and strength."
                        .to_owned(),
                ],
            )
        } else {
            (
                Sentiment::Neutral,
                vec!["Your journal shows self-awareness and balanced reflection.".to_owned()],
            )
        };

        let mut patterns = Vec::new();
        if lower.contains("trigger") {
            patterns.push("Identified potential triggers for recovery".to_owned());
        }
        if lower.contains("strategy") || lower.contains("coping") {
            patterns.push("Exploring coping strategies and skills".to_owned());
        }
        if lower.contains("progress") || lower.contains("day") {
            patterns.push("Recognizing recovery progress and time tracking.".to_owned());
        }

        let word_count = entry.split_whitespace().count();
        let mut suggestions = vec![
            "Continue daily journaling to track progress".to_owned(),
            "Note successful coping strategies".to_owned(),
        ];
        if word_count < self.depth_threshold {
            suggestions
                .push("Consider writing more details to explore thoughts more deeply.".to_owned());
        } else {
            suggestions.push("Great journaling! Continue this self-reflection practice.".to_owned());
        }

        JournalAnalysis {
            insights,
            patterns,
            suggestions,
            mood: mood.unwrap_or(5),
            sentiment,
            word_count,
        }
    }
}
