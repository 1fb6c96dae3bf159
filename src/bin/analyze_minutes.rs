//! `analyze-minutes`: extract issues and TODOs from a minutes file into a
//! pending-approval record.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use todo_tracker::services::{provider_from_settings, MinutesAnalyzer, MinutesRequest};
use todo_tracker::{DocumentStore, Settings};

#[derive(Parser, Debug)]
#[command(name = "analyze-minutes")]
#[command(about = "Extract issues and TODOs from meeting minutes for approval")]
#[command(version)]
struct Cli {
    /// Minutes file (.md, .txt or .docx)
    #[arg(long)]
    file: PathBuf,

    /// Project to file the record under, instead of the name in the minutes
    #[arg(long = "projectId")]
    project_id: Option<String>,

    /// Commit that added the minutes
    #[arg(long)]
    commit: Option<String>,

    /// Who pushed the minutes
    #[arg(long = "pushedBy")]
    pushed_by: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    todo_tracker::init_logging();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("[MinutesAnalyzer] {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env().context("invalid configuration")?;
    let Some(provider) = provider_from_settings(&settings)? else {
        bail!("OPENAI_API_KEY is not set");
    };

    let store_path = settings.resolve_store_path()?;
    let store = DocumentStore::open(&store_path)
        .with_context(|| format!("failed to open document store {}", store_path.display()))?;

    let request = MinutesRequest {
        file: cli.file,
        project_id: cli.project_id,
        commit_hash: cli.commit,
        pushed_by: cli.pushed_by,
    };
    let outcome = MinutesAnalyzer::new(provider, store)
        .analyze(&request)
        .await
        .with_context(|| format!("failed to analyze {}", request.file.display()))?;

    let record = &outcome.record;
    println!(
        "Stored pending minutes {}: {} issue(s), {} TODO(s), project {}",
        outcome.record_id,
        record.extracted.issues.len(),
        record.extracted.todos.len(),
        record.project_id.as_deref().unwrap_or("(unassigned)")
    );
    if !outcome.dropped.is_empty() {
        println!("Dropped {} malformed record(s)", outcome.dropped.len());
    }
    Ok(())
}
