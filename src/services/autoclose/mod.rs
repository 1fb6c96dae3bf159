//! TODO Auto-Close
//!
//! Proposes tickets a commit resolves, in three phases merged by
//! precedence:
//!
//! 1. `message` - closing keywords in the commit message (ground truth)
//! 2. `filename` - changed files against each ticket's artifact pattern,
//!    optionally confirmed by the model on that file's diff
//! 3. `diff_analysis` - one batched model call over the whole diff
//!
//! `merge` keeps the first result per ticket, `persist` writes them, and
//! `pipeline` drives a run end to end.

pub mod diff_analysis;
pub mod filename;
pub mod merge;
pub mod message;
pub mod persist;
pub mod pipeline;
pub mod prompts;
pub mod summary;

pub use diff_analysis::{DiffAnalysisPhase, DiffMatch};
pub use filename::{find_matching_file, pattern_matches, FileGate, FileVerdict, FilenamePhase};
pub use merge::{MatchResult, MatchSet};
pub use message::extract_closing_ids;
pub use persist::persist_results;
pub use pipeline::{AutoCloseConfig, AutoClosePipeline};
pub use summary::{RunSummary, TicketOutcome};
