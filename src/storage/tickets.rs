//! Ticket Repository
//!
//! Typed access to the `todos` collection. Automation only ever adds
//! close-candidate marks here; tickets are never created or deleted by the
//! auto-close pipeline.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use todo_tracker_core::{AiAnalysis, HistoryEntry, Ticket, TicketStatus};

use super::database::{Document, DocumentStore, Filter};
use crate::utils::error::{AppError, AppResult};

/// Collection holding TODOs and issues
pub const TODOS_COLLECTION: &str = "todos";

/// One close-candidate decision to persist on a ticket.
#[derive(Debug, Clone)]
pub struct CloseCandidateMark {
    /// New status; ignored unless automation may write it
    pub status: Option<TicketStatus>,
    pub ai_analysis: Option<AiAnalysis>,
    pub entry: HistoryEntry,
    pub now: DateTime<Utc>,
}

/// Repository over the `todos` collection
#[derive(Clone)]
pub struct TicketRepository {
    store: DocumentStore,
}

impl TicketRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Read one ticket by id.
    pub fn get(&self, id: &str) -> AppResult<Option<Ticket>> {
        self.store
            .get(TODOS_COLLECTION, id)?
            .map(|data| decode(Document {
                id: id.to_string(),
                data,
            }))
            .transpose()
    }

    /// Store a ticket under its own id (used for seeding and imports).
    pub fn put(&self, ticket: &Ticket) -> AppResult<()> {
        if ticket.id.trim().is_empty() {
            return Err(AppError::validation("ticket id must not be empty"));
        }
        let data = serde_json::to_value(ticket)?;
        self.store.set(TODOS_COLLECTION, &ticket.id, &data)
    }

    /// Tickets automation may still act on (`open` or `in_progress`),
    /// optionally scoped to one project.
    ///
    /// Documents that do not decode as tickets are skipped with a warning.
    pub fn find_matchable(&self, project_id: Option<&str>) -> AppResult<Vec<Ticket>> {
        let statuses: Vec<Value> = TicketStatus::MATCHABLE
            .iter()
            .map(|s| Value::String(s.as_str().to_string()))
            .collect();
        let mut filters = vec![Filter::is_in("status", statuses)];
        if let Some(project_id) = project_id {
            filters.push(Filter::eq("projectId", project_id));
        }

        let mut tickets = Vec::new();
        for doc in self.store.query(TODOS_COLLECTION, &filters)? {
            let id = doc.id.clone();
            match decode(doc) {
                Ok(ticket) => tickets.push(ticket),
                Err(e) => tracing::warn!("[TicketRepository] skipping malformed ticket {}: {}", id, e),
            }
        }
        Ok(tickets)
    }

    /// Mark a ticket as close candidate and append one audit entry.
    ///
    /// Re-reads the stored ticket inside the write; fails with `NotFound`
    /// when it no longer exists. Only the touched fields are written, every
    /// other stored field is kept. Returns the document as written; it is
    /// not decoded, so a stored field `Ticket` cannot read never turns a
    /// committed write into an error.
    pub fn mark_close_candidate(&self, id: &str, mark: &CloseCandidateMark) -> AppResult<Value> {
        let entry = serde_json::to_value(&mark.entry)?;
        let analysis = mark
            .ai_analysis
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let status = mark.status.filter(TicketStatus::is_automation_writable);
        let now = json!(mark.now);

        self.store.update(TODOS_COLLECTION, id, |doc| {
            doc.insert("closeCandidate".to_string(), Value::Bool(true));

            if let Some(status) = status {
                doc.insert("status".to_string(), json!(status));
                if status == TicketStatus::Closed {
                    doc.insert("closedAt".to_string(), now.clone());
                }
            }

            if let Some(analysis) = analysis {
                doc.insert("aiAnalysis".to_string(), analysis);
            }

            match doc.get_mut("history") {
                Some(Value::Array(history)) => history.push(entry),
                _ => {
                    doc.insert("history".to_string(), Value::Array(vec![entry]));
                }
            }

            doc.insert("updatedAt".to_string(), now);
            Ok(())
        })
    }
}

fn decode(doc: Document) -> AppResult<Ticket> {
    let mut ticket: Ticket = serde_json::from_value(doc.data)?;
    ticket.id = doc.id;
    Ok(ticket)
}
