//! Minutes Extraction Types
//!
//! Schema for the structured extraction returned by the model, and the
//! pending-approval record stored once per analysis run. Records are never
//! written into the tickets collection from here; an external approval step
//! promotes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ticket::TicketStatus;

/// Approval state of a pending minutes record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// An issue extracted from minutes.
///
/// With `existing_id` set this is an update record and carries only the
/// fields the meeting changed. Without it, it describes a new issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

/// A TODO extracted from minutes. Same update/create split as issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Artifact filename or glob the TODO is judged against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_status: Option<String>,
    /// Title of the new issue this TODO belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

/// The full object the model must return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMinutes {
    #[serde(default)]
    pub project_name: Option<String>,
    pub issues: Vec<ExtractedIssue>,
    pub todos: Vec<ExtractedTodo>,
}

/// Trim a field and turn blanks into `None`.
fn compact(field: &mut Option<String>) {
    if let Some(value) = field.take() {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *field = Some(trimmed.to_string());
        }
    }
}

/// Whether `id` looks like `TODO-12`, `ISSUE-3` or `NEW-ISSUE-7`.
pub fn is_backlink_id(id: &str) -> bool {
    let Some((prefix, number)) = id.rsplit_once('-') else {
        return false;
    };
    matches!(prefix, "TODO" | "ISSUE" | "NEW-ISSUE")
        && !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit())
}

impl ExtractedIssue {
    pub fn is_update(&self) -> bool {
        self.existing_id.is_some()
    }

    fn compact(&mut self) {
        compact(&mut self.existing_id);
        compact(&mut self.title);
        compact(&mut self.content);
        compact(&mut self.latest_status);
        compact(&mut self.strategy);
        compact(&mut self.assignee);
        compact(&mut self.due_date);
        if self.is_update() {
            // The stored issue keeps its own title
            self.title = None;
        }
    }

    fn check(&self) -> Result<(), String> {
        match (&self.existing_id, &self.title) {
            (Some(id), _) if !is_backlink_id(id) => {
                Err(format!("issue update has malformed back-reference '{}'", id))
            }
            (None, None) => Err("new issue has no title".to_string()),
            _ => Ok(()),
        }
    }
}

impl ExtractedTodo {
    pub fn is_update(&self) -> bool {
        self.existing_id.is_some()
    }

    fn compact(&mut self) {
        compact(&mut self.existing_id);
        compact(&mut self.title);
        compact(&mut self.assignee);
        compact(&mut self.due_date);
        compact(&mut self.content);
        compact(&mut self.target_file);
        compact(&mut self.latest_status);
        compact(&mut self.issue_title);
        if self.is_update() {
            self.title = None;
            self.issue_title = None;
        }
    }

    fn check(&self) -> Result<(), String> {
        match (&self.existing_id, &self.title) {
            (Some(id), _) if !is_backlink_id(id) => {
                Err(format!("todo update has malformed back-reference '{}'", id))
            }
            (None, None) => Err("new todo has no title".to_string()),
            _ => Ok(()),
        }
    }
}

impl ExtractedMinutes {
    /// Compact every record and drop the ones that violate the schema rules.
    ///
    /// Returns one message per dropped record.
    pub fn sanitize(&mut self) -> Vec<String> {
        compact(&mut self.project_name);
        let mut dropped = Vec::new();

        self.issues.retain_mut(|issue| {
            issue.compact();
            match issue.check() {
                Ok(()) => true,
                Err(reason) => {
                    dropped.push(reason);
                    false
                }
            }
        });

        self.todos.retain_mut(|todo| {
            todo.compact();
            match todo.check() {
                Ok(()) => true,
                Err(reason) => {
                    dropped.push(reason);
                    false
                }
            }
        });

        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.todos.is_empty()
    }
}

/// One minutes-analysis run awaiting human approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMinutes {
    #[serde(default, skip_serializing)]
    pub id: String,
    /// Path of the analyzed file as given on the command line
    pub source_file: String,
    /// `markdown`, `text` or `docx`
    pub source_format: String,
    /// SHA-256 of the text sent to the model
    pub content_digest: String,
    /// Resolved project, `None` when the name did not resolve
    pub project_id: Option<String>,
    /// Project name as extracted from the document
    pub project_name: Option<String>,
    pub extracted: ExtractedMinutes,
    pub status: ApprovalStatus,
    pub commit_hash: Option<String>,
    pub pushed_by: Option<String>,
    pub model: String,
    pub created_at: DateTime<Utc>,
}
