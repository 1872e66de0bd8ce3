// ABOUTME: Recovery coaching logic: prompt construction, response classification, and orchestration
// ABOUTME: Pure text heuristics live in classifier and journal; orchestrator wires provider and store
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Recovery Coaching Core
//!
//! The coaching pipeline for one turn: build a stage-specific prompt from the
//! user's recovery context, call the completion provider, classify the raw
//! reply into structured output, then persist and escalate.
//!
//! Classification and journal analysis are deliberately lexical, not
//! model-driven, so their behavior is deterministic and testable offline.

pub mod classifier;
pub mod journal;
pub mod orchestrator;
pub mod prompts;

pub use classifier::Classification;
pub use journal::{JournalAnalysis, JournalAnalyzer, Sentiment};
pub use orchestrator::{
    AssessmentRequest, CoachService, CoachTurn, CrisisRequest, CrisisResponse, RecoveryPlan,
};
