//! Integration Tests Module
//!
//! Drives the auto-close pipeline and the minutes analyzer end to end
//! against an in-memory document store and a scripted model provider, and
//! the git facade against a real temporary repository.

// Shared test doubles and fixtures
mod support;

// Auto-close pipeline: phase precedence, persistence, guardrails
mod autoclose_test;

// Minutes analysis: extraction, project resolution, pending records
mod minutes_test;

// DOCX minutes conversion
mod docx_test;

// Git facade against a real repository
mod git_test;
