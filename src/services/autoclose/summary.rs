//! Run summary printed by `auto-close-todos`.

use std::fmt::Write as _;

use serde::Serialize;
use todo_tracker_core::MatchPhase;

use super::merge::MatchResult;

/// What happened to one matched ticket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketOutcome {
    pub result: MatchResult,
    /// Persistence error, `None` when the write succeeded
    pub error: Option<String>,
}

impl TicketOutcome {
    pub fn is_persisted(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one auto-close run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub commit_hash: String,
    pub commit_subject: String,
    /// Tickets that were eligible for filename and diff matching
    pub candidate_count: usize,
    pub outcomes: Vec<TicketOutcome>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &TicketOutcome> {
        self.outcomes.iter().filter(|o| !o.is_persisted())
    }

    pub fn persisted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_persisted()).count()
    }

    /// 0 when every match was persisted (or there were none), else 1.
    pub fn exit_code(&self) -> i32 {
        if self.failures().next().is_some() {
            1
        } else {
            0
        }
    }

    fn phase_count(&self, phase: MatchPhase) -> usize {
        self.outcomes.iter().filter(|o| o.result.phase == phase).count()
    }

    /// Human-readable report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let short: String = self.commit_hash.chars().take(7).collect();
        let _ = writeln!(out, "Commit {} {}", short, self.commit_subject);
        let _ = writeln!(out, "Candidate tickets: {}", self.candidate_count);

        if self.outcomes.is_empty() {
            let _ = writeln!(out, "No matching tickets.");
            return out;
        }

        for outcome in &self.outcomes {
            let r = &outcome.result;
            let confidence = r
                .confidence
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "-".to_string());
            let state = match &outcome.error {
                None => r.status.to_string(),
                Some(e) => format!("FAILED ({})", e),
            };
            let _ = writeln!(
                out,
                "  {:<14} {:<22} conf={:<5} {:<15} {}",
                r.ticket_id,
                r.phase.label(),
                confidence,
                state,
                r.reason
            );
        }

        let _ = writeln!(
            out,
            "Matched {} (message {}, filename {}, diff {}); persisted {}, failed {}",
            self.outcomes.len(),
            self.phase_count(MatchPhase::CommitMessage),
            self.phase_count(MatchPhase::FileName),
            self.phase_count(MatchPhase::DiffAnalysis),
            self.persisted_count(),
            self.outcomes.len() - self.persisted_count()
        );
        out
    }
}
