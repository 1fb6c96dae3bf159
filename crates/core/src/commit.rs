//! Commit snapshot read once per invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The commit being analyzed, with its changed files and diff text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub hash: String,
    /// Full commit message (subject and body)
    pub message: String,
    pub author: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub changed_files: Vec<String>,
    /// Unified diff of the commit against its first parent
    #[serde(skip)]
    pub diff: String,
}

impl CommitInfo {
    /// First line of the commit message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    /// Abbreviated hash for log lines.
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.hash.len());
        &self.hash[..end]
    }
}
