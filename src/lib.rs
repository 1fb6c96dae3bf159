//! Todo Tracker
//!
//! Automation around the task tracker's document store:
//! - `auto-close-todos` proposes tickets the latest commit resolves
//! - `analyze-minutes` extracts issues and TODOs from meeting minutes into
//!   a pending-approval record
//! - `docx-to-md` converts Word minutes to the Markdown the analyzer reads
//!
//! Components receive the store, the git facade and the model provider at
//! construction; each binary builds them once.

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::Settings;
pub use storage::DocumentStore;
pub use utils::error::{AnalysisError, AnalysisResult, AppError, AppResult};

/// Install the stderr log subscriber. `RUST_LOG` overrides the `info`
/// default.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
