//! Full-diff analysis.
//!
//! One batched model call over the sanitized commit diff and every ticket
//! still without a result. Matches under the threshold, for unknown ids,
//! or with out-of-range confidence are dropped.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use todo_tracker_core::{AiAnalysis, CommitInfo, MatchPhase, Ticket};
use todo_tracker_llm::{parse_json_response, LlmProvider, LlmRequestOptions, Message};

use super::merge::{MatchResult, MatchSet};
use super::prompts;
use crate::models::MODEL_TEMPERATURE;
use crate::services::guardrail::{DiffSanitizer, MAX_DIFF_CHARS};
use crate::utils::error::{AnalysisError, AnalysisResult};

/// One entry of the model's `matches` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffMatch {
    pub todo_id: String,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
struct DiffAnalysisResponse {
    matches: Vec<DiffMatch>,
}

/// Batched diff analysis against a set of tickets.
pub struct DiffAnalysisPhase {
    provider: Arc<dyn LlmProvider>,
    threshold: f64,
    sanitizer: DiffSanitizer,
}

impl DiffAnalysisPhase {
    pub fn new(provider: Arc<dyn LlmProvider>, threshold: f64, sanitizer: DiffSanitizer) -> Self {
        Self {
            provider,
            threshold,
            sanitizer,
        }
    }

    /// Ask the model which of `tickets` the commit completes.
    ///
    /// Returns the matches that pass validation and the threshold.
    pub async fn analyze(
        &self,
        commit: &CommitInfo,
        tickets: &[&Ticket],
    ) -> AnalysisResult<Vec<DiffMatch>> {
        if tickets.is_empty() {
            return Ok(Vec::new());
        }

        self.sanitizer.check_text("commit message", &commit.message)?;
        let diff = self.sanitizer.sanitize(&commit.diff, MAX_DIFF_CHARS)?;
        if diff.text.trim().is_empty() {
            return Err(AnalysisError::invalid_response(
                "nothing left to analyze after exclusions",
            ));
        }

        let response = self
            .provider
            .send_message(
                vec![Message::user(prompts::diff_analysis_user_prompt(
                    tickets,
                    &commit.message,
                    &diff.text,
                ))],
                Some(prompts::diff_analysis_system_prompt()),
                LlmRequestOptions::json(MODEL_TEMPERATURE),
            )
            .await?;

        let content = response
            .content
            .ok_or_else(|| AnalysisError::invalid_response("empty completion"))?;
        let parsed: DiffAnalysisResponse = parse_json_response(&content)?;

        let known: HashSet<&str> = tickets.iter().map(|t| t.id.as_str()).collect();
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        for m in parsed.matches {
            if !known.contains(m.todo_id.as_str()) {
                tracing::warn!("[DiffAnalysis] model returned unknown id '{}'", m.todo_id);
                continue;
            }
            if !(0.0..=1.0).contains(&m.confidence) {
                tracing::warn!(
                    "[DiffAnalysis] dropping {}: confidence {} outside [0, 1]",
                    m.todo_id,
                    m.confidence
                );
                continue;
            }
            if m.confidence < self.threshold {
                tracing::info!(
                    "[DiffAnalysis] {} below threshold: {:.2} < {:.2}",
                    m.todo_id,
                    m.confidence,
                    self.threshold
                );
                continue;
            }
            if seen.insert(m.todo_id.clone()) {
                accepted.push(m);
            }
        }
        Ok(accepted)
    }

    /// Run the analysis over tickets without a result and merge the
    /// accepted matches. Any failure means no results from this step.
    pub async fn run(&self, commit: &CommitInfo, tickets: &[Ticket], results: &mut MatchSet) -> usize {
        let remaining: Vec<&Ticket> = tickets.iter().filter(|t| !results.contains(&t.id)).collect();
        if remaining.is_empty() {
            tracing::info!("[DiffAnalysis] no unmatched tickets left; skipping");
            return 0;
        }

        let matches = match self.analyze(commit, &remaining).await {
            Ok(matches) => matches,
            Err(e) if e.is_security_abort() => {
                tracing::warn!("[DiffAnalysis] skipped: {}", e);
                return 0;
            }
            Err(e) => {
                tracing::warn!("[DiffAnalysis] no results for this run: {}", e);
                return 0;
            }
        };

        let mut added = 0;
        for m in matches {
            let analysis = AiAnalysis {
                confidence: m.confidence,
                reasoning: m.reasoning.clone(),
                model: self.provider.model().to_string(),
                analyzed_at: Utc::now(),
            };
            let result = MatchResult::review_candidate(
                m.todo_id,
                MatchPhase::DiffAnalysis,
                m.reasoning,
                Some(analysis),
            );
            if results.insert(result) {
                added += 1;
            }
        }
        added
    }
}
