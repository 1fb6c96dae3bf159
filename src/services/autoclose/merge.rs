//! Result merging.
//!
//! Phases run in order and each only adds tickets that have no result
//! yet, so an earlier phase always wins.

use std::collections::HashSet;

use serde::Serialize;
use todo_tracker_core::{AiAnalysis, MatchPhase, TicketStatus};

/// One phase's decision about one ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub ticket_id: String,
    pub phase: MatchPhase,
    /// Status to write on the ticket
    pub status: TicketStatus,
    /// Model confidence, when a model was consulted
    pub confidence: Option<f64>,
    pub reason: String,
    pub ai_analysis: Option<AiAnalysis>,
}

impl MatchResult {
    /// Ground-truth close from the commit message.
    pub fn closed_by_message(ticket_id: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            phase: MatchPhase::CommitMessage,
            status: TicketStatus::Closed,
            confidence: None,
            reason: "Commit message names this ticket with a closing keyword".to_string(),
            ai_analysis: None,
        }
    }

    /// Candidate awaiting review, from the filename or diff phase.
    pub fn review_candidate(
        ticket_id: impl Into<String>,
        phase: MatchPhase,
        reason: impl Into<String>,
        ai_analysis: Option<AiAnalysis>,
    ) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            phase,
            status: TicketStatus::ReviewPending,
            confidence: ai_analysis.as_ref().map(|a| a.confidence),
            reason: reason.into(),
            ai_analysis,
        }
    }

    /// History action recorded for this result
    pub fn action(&self) -> &'static str {
        if self.status == TicketStatus::Closed {
            "auto_closed"
        } else {
            "auto_close_candidate"
        }
    }
}

/// Results keyed by ticket id, first writer wins, insertion-ordered.
#[derive(Debug, Default, Clone)]
pub struct MatchSet {
    results: Vec<MatchResult>,
    ids: HashSet<String>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result unless the ticket already has one. Returns whether it
    /// was added.
    pub fn insert(&mut self, result: MatchResult) -> bool {
        if self.ids.contains(&result.ticket_id) {
            tracing::debug!(
                "[MatchSet] {} already matched; ignoring {} result",
                result.ticket_id,
                result.phase
            );
            return false;
        }
        self.ids.insert(result.ticket_id.clone());
        self.results.push(result);
        true
    }

    pub fn contains(&self, ticket_id: &str) -> bool {
        self.ids.contains(ticket_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter()
    }

    /// Number of results contributed by `phase`
    pub fn count_phase(&self, phase: MatchPhase) -> usize {
        self.results.iter().filter(|r| r.phase == phase).count()
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        self.results
    }
}
