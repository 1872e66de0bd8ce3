// ABOUTME: Main library entry point for the Melius recovery coach service
// ABOUTME: Provides the coaching orchestrator, crisis protocol, and REST API surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![deny(unsafe_code)]

//! # Melius Coach
//!
//! An AI recovery-coach conversation service. One coaching turn runs
//! end-to-end through a single pipeline: build a stage-specific prompt from
//! the user's recovery context, complete it against a hosted model, classify
//! the raw reply into structured coaching output, persist the exchange, and
//! escalate to the crisis posture when the classified urgency demands it.
//!
//! ## Features
//!
//! - **Stage-aware prompting**: assessment, planning, implementation, and
//!   crisis postures each get their own template
//! - **Deterministic classification**: suggestions, follow-up questions,
//!   strategies, and urgency derived by fixed lexical rules
//! - **Fail-safe crisis path**: crisis responses degrade to hard-coded
//!   hotline content, never to an error
//! - **Owned conversations**: every read and delete is scoped to the
//!   authenticated user; foreign ids read as not-found
//!
//! ## Architecture
//!
//! - **llm**: completion provider abstraction and the OpenRouter backend
//! - **coach**: prompt builder, classifier, journal analyzer, orchestrator
//! - **database**: conversation store trait and its sqlite implementation
//! - **routes**: axum handlers for the coach API and health probes
//! - **auth**: per-request JWT validation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use melius_coach::config::ServerConfig;
//! use melius_coach::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Melius coach configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod coach;
pub mod config;
pub mod database;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod routes;
