//! Ticket Types
//!
//! A ticket is a tracked TODO or issue stored in the `todos` collection.
//! Automation only ever flips the close-candidate flag, appends to the
//! audit history, and optionally moves the status; tickets are created and
//! deleted elsewhere.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    ReviewPending,
    Closed,
    Cancelled,
}

impl TicketStatus {
    /// Statuses whose tickets are still candidates for automatic matching.
    pub const MATCHABLE: [TicketStatus; 2] = [TicketStatus::Open, TicketStatus::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::ReviewPending => "review_pending",
            TicketStatus::Closed => "closed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Whether automation is allowed to write this status.
    pub fn is_automation_writable(&self) -> bool {
        matches!(
            self,
            TicketStatus::Closed | TicketStatus::InProgress | TicketStatus::ReviewPending
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "in_progress" | "in-progress" => Ok(TicketStatus::InProgress),
            "review_pending" | "review-pending" => Ok(TicketStatus::ReviewPending),
            "closed" => Ok(TicketStatus::Closed),
            "cancelled" | "canceled" => Ok(TicketStatus::Cancelled),
            other => Err(CoreError::parse(format!("unknown ticket status: {}", other))),
        }
    }
}

/// Heuristic that produced a match decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Phase 1: explicit closing keyword in the commit message.
    CommitMessage,
    /// Phase 2: changed file matched the ticket's declared artifact.
    FileName,
    /// Phase 3: model analysis of the full diff.
    DiffAnalysis,
}

impl MatchPhase {
    /// Short label written into audit history and logs.
    pub fn label(&self) -> &'static str {
        match self {
            MatchPhase::CommitMessage => "phase1_commit_message",
            MatchPhase::FileName => "phase2_filename",
            MatchPhase::DiffAnalysis => "phase3_ai_diff",
        }
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a model analysis attached to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Short rationale returned by the model
    pub reasoning: String,
    /// Model that produced the analysis
    pub model: String,
    pub analyzed_at: DateTime<Utc>,
}

/// One append-only audit record on a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    /// Action taken, e.g. `auto_close_candidate`
    pub action: String,
    /// Free-text reason for the decision
    pub reason: String,
    pub phase: MatchPhase,
    pub commit_hash: String,
    pub commit_message: String,
}

/// A tracked TODO or issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Document id (e.g. `TODO-12`); filled from the store key
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Declared artifact filename or glob the ticket is expected to touch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_file: Option<String>,
    #[serde(default)]
    pub close_candidate: bool,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Create an open ticket with no artifact pattern.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: TicketStatus::Open,
            project_id: None,
            target_file: None,
            close_candidate: false,
            history: Vec::new(),
            ai_analysis: None,
            closed_at: None,
            updated_at: None,
        }
    }

    /// Builder-style setter for the declared artifact pattern.
    pub fn with_target_file(mut self, pattern: impl Into<String>) -> Self {
        self.target_file = Some(pattern.into());
        self
    }

    /// Builder-style setter for the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style setter for the owning project.
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// The declared artifact pattern, if present and non-blank.
    pub fn artifact_pattern(&self) -> Option<&str> {
        self.target_file
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}
