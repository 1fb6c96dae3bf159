//! `docx-to-md`: convert Word meeting minutes to Markdown.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use todo_tracker::services::minutes::{docx_to_markdown, DocxDocument};

#[derive(Parser, Debug)]
#[command(name = "docx-to-md")]
#[command(about = "Convert .docx meeting minutes to Markdown")]
#[command(version)]
struct Cli {
    /// Input .docx file
    input: PathBuf,
    /// Output .md file
    output: PathBuf,
}

fn main() -> ExitCode {
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
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("[DocxToMarkdown] {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    tracing::info!(
        "[DocxToMarkdown] converting {} -> {}",
        cli.input.display(),
        cli.output.display()
    );
    let doc = DocxDocument::open(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let markdown = docx_to_markdown(&doc);
    std::fs::write(&cli.output, markdown)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    tracing::info!("[DocxToMarkdown] wrote {}", cli.output.display());
    Ok(())
}
