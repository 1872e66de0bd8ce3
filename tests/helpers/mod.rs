// ABOUTME: Shared helper modules for integration tests
// ABOUTME: Re-exports the axum request utilities used across test files

pub mod axum_test;
