//! `auto-close-todos`: propose the tickets the latest commit resolves.
//!
//! Reads everything from the environment. Exit code 0 when all matches were
//! persisted (or there were none), 1 on a setup failure or when any ticket
//! could not be updated.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use todo_tracker::services::{
    provider_from_settings, AutoCloseConfig, AutoClosePipeline, CommitSource, GitService,
};
use todo_tracker::{DocumentStore, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    todo_tracker::init_logging();
    match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("[AutoClose] {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let settings = Settings::from_env().context("invalid configuration")?;

    let store_path = settings.resolve_store_path()?;
    let store = DocumentStore::open(&store_path)
        .with_context(|| format!("failed to open document store {}", store_path.display()))?;
    let source: Arc<dyn CommitSource> = Arc::new(GitService::new(settings.git_repo_path.clone()));
    let provider = provider_from_settings(&settings)?;

    let pipeline = AutoClosePipeline::new(AutoCloseConfig::from(&settings), store, source, provider);
    let summary = pipeline.run().await.context("auto-close run failed")?;

    print!("{}", summary.render());
    for failure in summary.failures() {
        tracing::error!(
            "[AutoClose] {} was not updated: {}",
            failure.result.ticket_id,
            failure.error.as_deref().unwrap_or_default()
        );
    }
    Ok(ExitCode::from(summary.exit_code() as u8))
}
