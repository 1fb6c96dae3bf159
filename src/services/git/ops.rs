//! Git Operations
//!
//! Thin wrapper around the git CLI. Every call runs non-interactively and
//! prints non-ASCII paths verbatim (`core.quotepath=false`).

use std::path::Path;
use std::process::Command;

use crate::utils::error::{AppError, AppResult};

/// Result of a git command execution
#[derive(Debug)]
pub struct GitResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl GitResult {
    /// Check if the command was successful and return stdout or error
    pub fn into_result(self) -> AppResult<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(AppError::command(format!(
                "Git command failed (exit {}): {}",
                self.exit_code,
                self.stderr.trim()
            )))
        }
    }
}

/// Options placed before every subcommand
const GLOBAL_ARGS: [&str; 2] = ["-c", "core.quotepath=false"];

/// Safe git operations wrapper
#[derive(Debug, Default, Clone, Copy)]
pub struct GitOps;

impl GitOps {
    /// Create a new GitOps instance
    pub fn new() -> Self {
        Self
    }

    /// Execute a git command in the specified directory
    pub fn execute(&self, cwd: &Path, args: &[&str]) -> AppResult<GitResult> {
        tracing::debug!("[GitOps] git {}", args.join(" "));
        let output = Command::new("git")
            .args(GLOBAL_ARGS)
            .args(args)
            .current_dir(cwd)
            // Disable interactive prompts so CI runs never hang.
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GCM_INTERACTIVE", "never")
            .output()
            .map_err(|e| AppError::command(format!("Failed to execute git: {}", e)))?;

        Ok(GitResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Execute and return stdout, failing on a non-zero exit.
    pub fn run(&self, cwd: &Path, args: &[&str]) -> AppResult<String> {
        self.execute(cwd, args)?.into_result()
    }
}
