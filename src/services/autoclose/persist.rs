//! Writes merged results onto the stored tickets.

use chrono::Utc;
use todo_tracker_core::{CommitInfo, HistoryEntry};

use super::merge::MatchResult;
use super::summary::TicketOutcome;
use crate::storage::{CloseCandidateMark, TicketRepository};

/// Persist every result. Each ticket is written independently; a failure
/// is recorded on its outcome and the rest continue.
pub fn persist_results(
    tickets: &TicketRepository,
    commit: &CommitInfo,
    results: Vec<MatchResult>,
) -> Vec<TicketOutcome> {
    results
        .into_iter()
        .map(|result| {
            let now = Utc::now();
            let mark = CloseCandidateMark {
                status: Some(result.status),
                ai_analysis: result.ai_analysis.clone(),
                entry: HistoryEntry {
                    timestamp: now,
                    action: result.action().to_string(),
                    reason: result.reason.clone(),
                    phase: result.phase,
                    commit_hash: commit.hash.clone(),
                    commit_message: commit.message.clone(),
                },
                now,
            };

            match tickets.mark_close_candidate(&result.ticket_id, &mark) {
                Ok(_) => {
                    tracing::info!(
                        "[Persist] {} marked {} ({})",
                        result.ticket_id,
                        result.status,
                        result.phase
                    );
                    TicketOutcome {
                        result,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!("[Persist] failed to update {}: {}", result.ticket_id, e);
                    TicketOutcome {
                        result,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect()
}
