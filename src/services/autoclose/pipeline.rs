//! Auto-close pipeline.
//!
//! commit -> candidate tickets -> message -> filename -> diff -> persist.
//! Setup failures (no commit, store unreadable) are fatal. Everything
//! after that degrades per step or per ticket.

use std::sync::Arc;

use todo_tracker_core::{CommitInfo, MatchPhase, Ticket};
use todo_tracker_llm::LlmProvider;

use super::diff_analysis::DiffAnalysisPhase;
use super::filename::{FileGate, FilenamePhase};
use super::merge::{MatchResult, MatchSet};
use super::message::extract_closing_ids;
use super::persist::persist_results;
use super::summary::RunSummary;
use crate::models::Settings;
use crate::services::git::CommitSource;
use crate::services::guardrail::DiffSanitizer;
use crate::storage::{DocumentStore, ProjectRepository, TicketRepository};
use crate::utils::error::AppResult;

/// Feature flags and thresholds the pipeline needs.
#[derive(Debug, Clone)]
pub struct AutoCloseConfig {
    pub ai_analysis_enabled: bool,
    pub phase2_ai_enabled: bool,
    pub ai_confidence_threshold: f64,
    pub phase2_confidence_threshold: f64,
    pub github_repository: Option<String>,
}

impl From<&Settings> for AutoCloseConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            ai_analysis_enabled: settings.ai_analysis_enabled,
            phase2_ai_enabled: settings.phase2_ai_enabled,
            ai_confidence_threshold: settings.ai_confidence_threshold,
            phase2_confidence_threshold: settings.phase2_confidence_threshold,
            github_repository: settings.github_repository.clone(),
        }
    }
}

/// Ticket candidates scoped to the current repository.
#[derive(Debug, Clone)]
enum Scope {
    Unscoped,
    Project(String),
    /// Repository given but linked to no project
    Unlinked,
}

pub struct AutoClosePipeline {
    config: AutoCloseConfig,
    tickets: TicketRepository,
    projects: ProjectRepository,
    source: Arc<dyn CommitSource>,
    /// `None` when no model credential is configured
    provider: Option<Arc<dyn LlmProvider>>,
    sanitizer: DiffSanitizer,
}

impl AutoClosePipeline {
    pub fn new(
        config: AutoCloseConfig,
        store: DocumentStore,
        source: Arc<dyn CommitSource>,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            config,
            tickets: TicketRepository::new(store.clone()),
            projects: ProjectRepository::new(store),
            source,
            provider,
            sanitizer: DiffSanitizer::default(),
        }
    }

    fn resolve_scope(&self) -> AppResult<Scope> {
        let Some(repository) = self.config.github_repository.as_deref() else {
            return Ok(Scope::Unscoped);
        };
        match self.projects.find_by_repository(repository)? {
            Some(project) => {
                tracing::info!(
                    "[AutoClose] repository {} belongs to project {} ({})",
                    repository,
                    project.name,
                    project.id
                );
                Ok(Scope::Project(project.id))
            }
            None => {
                tracing::warn!(
                    "[AutoClose] repository {} is not linked to any project; no candidate tickets",
                    repository
                );
                Ok(Scope::Unlinked)
            }
        }
    }

    /// Tickets eligible for filename and diff matching.
    pub fn load_candidates(&self) -> AppResult<Vec<Ticket>> {
        match self.resolve_scope()? {
            Scope::Unscoped => self.tickets.find_matchable(None),
            Scope::Project(id) => self.tickets.find_matchable(Some(&id)),
            Scope::Unlinked => Ok(Vec::new()),
        }
    }

    fn message_phase(&self, commit: &CommitInfo, results: &mut MatchSet) {
        for id in extract_closing_ids(&commit.message) {
            tracing::info!("[MessagePhase] commit message closes {}", id);
            results.insert(MatchResult::closed_by_message(id));
        }
    }

    async fn filename_phase(&self, commit: &CommitInfo, tickets: &[Ticket], results: &mut MatchSet) {
        let files = self.sanitizer.exclusions().filter_paths(&commit.changed_files);
        let skipped = commit.changed_files.len() - files.len();
        if skipped > 0 {
            tracing::info!("[FilenamePhase] ignoring {} excluded file(s)", skipped);
        }
        if files.is_empty() {
            return;
        }

        let gate = match (&self.provider, self.config.phase2_ai_enabled) {
            (Some(provider), true) => Some(FileGate::new(
                provider.clone(),
                self.config.phase2_confidence_threshold,
                self.sanitizer.clone(),
            )),
            (None, true) => {
                tracing::info!("[FilenamePhase] no model credential; accepting filename matches as-is");
                None
            }
            (_, false) => {
                tracing::info!("[FilenamePhase] model check disabled; accepting filename matches as-is");
                None
            }
        };

        FilenamePhase::new(gate)
            .run(commit, &files, tickets, self.source.as_ref(), results)
            .await;
    }

    async fn diff_phase(&self, commit: &CommitInfo, tickets: &[Ticket], results: &mut MatchSet) {
        if !self.config.ai_analysis_enabled {
            tracing::info!("[DiffAnalysis] disabled (AI_ANALYSIS_ENABLED)");
            return;
        }
        let Some(provider) = &self.provider else {
            tracing::info!("[DiffAnalysis] no model credential; skipping");
            return;
        };
        DiffAnalysisPhase::new(
            provider.clone(),
            self.config.ai_confidence_threshold,
            self.sanitizer.clone(),
        )
        .run(commit, tickets, results)
        .await;
    }

    /// Run all phases on the latest commit and persist the results.
    pub async fn run(&self) -> AppResult<RunSummary> {
        let commit = self.source.latest_commit()?;
        let tickets = self.load_candidates()?;
        tracing::info!(
            "[AutoClose] analyzing {} against {} candidate ticket(s)",
            commit.short_hash(),
            tickets.len()
        );

        let mut results = MatchSet::new();
        self.message_phase(&commit, &mut results);
        self.filename_phase(&commit, &tickets, &mut results).await;
        self.diff_phase(&commit, &tickets, &mut results).await;

        tracing::info!(
            "[AutoClose] matches: message={} filename={} diff={}",
            results.count_phase(MatchPhase::CommitMessage),
            results.count_phase(MatchPhase::FileName),
            results.count_phase(MatchPhase::DiffAnalysis)
        );

        let outcomes = persist_results(&self.tickets, &commit, results.into_results());

        Ok(RunSummary {
            commit_hash: commit.hash.clone(),
            commit_subject: commit.subject().to_string(),
            candidate_count: tickets.len(),
            outcomes,
        })
    }
}
