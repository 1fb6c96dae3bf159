//! Todo Tracker Core
//!
//! Domain types and the core error type shared by the todo tracker workspace.
//! This crate knows nothing about git, the document store, or any model provider.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `ticket` - Tracked TODO/issue documents and their audit history
//! - `commit` - Commit snapshot read from the version-control tool
//! - `project` - Project lookup records
//! - `minutes` - Pending minutes records and the extraction schema

pub mod commit;
pub mod error;
pub mod minutes;
pub mod project;
pub mod ticket;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Domain Types ───────────────────────────────────────────────────────
pub use commit::CommitInfo;
pub use minutes::{
    ApprovalStatus, ExtractedIssue, ExtractedMinutes, ExtractedTodo, PendingMinutes,
};
pub use project::{normalize_project_name, Project};
pub use ticket::{AiAnalysis, HistoryEntry, MatchPhase, Ticket, TicketStatus};
