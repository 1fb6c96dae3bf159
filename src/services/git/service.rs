//! Git Service
//!
//! Reads the commit under analysis: metadata, changed files, and diffs
//! against the first parent. Merge commits show an empty combined diff
//! through `git show`, so those fall back to `git diff <hash>^1 <hash>`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use todo_tracker_core::CommitInfo;

use super::ops::GitOps;
use super::{unquote_path, CommitSource};
use crate::utils::error::{AppError, AppResult};

/// Field separator used in the `git log` format string
const FIELD_SEP: char = '\0';

/// Git facade bound to one repository working directory.
#[derive(Debug, Clone)]
pub struct GitService {
    git: GitOps,
    repo_path: PathBuf,
}

impl GitService {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            git: GitOps::new(),
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Hash, author, timestamp, and full message of `rev`.
    fn commit_header(&self, rev: &str) -> AppResult<CommitInfo> {
        let output = self
            .git
            .run(
                &self.repo_path,
                &["log", "-1", "--format=%H%x00%an%x00%aI%x00%B", rev],
            )
            .map_err(|e| AppError::command(format!("no commit found at {}: {}", rev, e)))?;

        parse_commit_header(&output)
    }

    /// Whether `hash` has more than one parent.
    fn is_merge(&self, hash: &str) -> AppResult<bool> {
        let output = self
            .git
            .run(&self.repo_path, &["rev-list", "--parents", "-n", "1", hash])?;
        Ok(output.split_whitespace().count() > 2)
    }

    /// Files changed by `hash` relative to its first parent.
    pub fn changed_files(&self, hash: &str) -> AppResult<Vec<String>> {
        let output = if self.is_merge(hash)? {
            let parent = format!("{}^1", hash);
            self.git
                .run(&self.repo_path, &["diff", "--name-only", parent.as_str(), hash])?
        } else {
            self.git
                .run(&self.repo_path, &["show", "--name-only", "--format=", hash])?
        };
        Ok(parse_name_list(&output))
    }

    /// Unified diff of `hash`, optionally limited to one path.
    pub fn diff(&self, hash: &str, path: Option<&str>) -> AppResult<String> {
        let parent = format!("{}^1", hash);
        let mut args: Vec<&str> = if self.is_merge(hash)? {
            vec!["diff", "--no-color", parent.as_str(), hash]
        } else {
            vec!["show", "--no-color", "--format=", "--patch", hash]
        };
        if let Some(path) = path {
            args.push("--");
            args.push(path);
        }
        self.git.run(&self.repo_path, &args)
    }
}

impl CommitSource for GitService {
    fn latest_commit(&self) -> AppResult<CommitInfo> {
        let mut commit = self.commit_header("HEAD")?;
        commit.changed_files = self.changed_files(&commit.hash)?;
        commit.diff = self.diff(&commit.hash, None)?;
        tracing::info!(
            "[GitService] commit {} by {}: {} file(s) changed",
            commit.short_hash(),
            commit.author,
            commit.changed_files.len()
        );
        Ok(commit)
    }

    fn file_diff(&self, commit: &CommitInfo, path: &str) -> AppResult<String> {
        self.diff(&commit.hash, Some(path))
    }
}

/// Parse `%H%x00%an%x00%aI%x00%B` output.
fn parse_commit_header(output: &str) -> AppResult<CommitInfo> {
    let mut fields = output.splitn(4, FIELD_SEP);
    let hash = fields.next().unwrap_or("").trim().to_string();
    if hash.is_empty() {
        return Err(AppError::command("git log returned no commit"));
    }
    let author = fields.next().unwrap_or("").trim().to_string();
    let timestamp = fields
        .next()
        .and_then(|t| DateTime::parse_from_rfc3339(t.trim()).ok())
        .map(|t| t.with_timezone(&Utc));
    let message = fields.next().unwrap_or("").trim_end().to_string();

    Ok(CommitInfo {
        hash,
        message,
        author,
        timestamp,
        changed_files: Vec::new(),
        diff: String::new(),
    })
}

fn parse_name_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| unquote_path(l).into_owned())
        .collect()
}
