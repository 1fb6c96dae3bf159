//! Services
//!
//! Business logic for the two automations: TODO auto-close and minutes
//! analysis, plus the git facade and the guardrails in front of every
//! model call.

pub mod autoclose;
pub mod git;
pub mod guardrail;
pub mod minutes;
pub mod model;


pub use autoclose::{AutoCloseConfig, AutoClosePipeline, RunSummary};
pub use git::{CommitSource, GitService};
pub use guardrail::DiffSanitizer;
pub use minutes::{MinutesAnalyzer, MinutesRequest};
pub use model::provider_from_settings;
