//! Filename matching.
//!
//! A ticket's declared artifact pattern is compared with the commit's
//! changed files. Patterns with wildcards use glob semantics; plain
//! patterns match by substring in either direction. The first matching
//! file wins. When a model is available the match is confirmed against
//! that one file's diff before it is accepted.

use std::sync::Arc;

use chrono::Utc;
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use todo_tracker_core::{AiAnalysis, CommitInfo, MatchPhase, Ticket};
use todo_tracker_llm::{parse_json_response, LlmProvider, LlmRequestOptions, Message};

use super::merge::{MatchResult, MatchSet};
use super::prompts;
use crate::models::MODEL_TEMPERATURE;
use crate::services::git::CommitSource;
use crate::services::guardrail::{DiffSanitizer, MAX_FILE_DIFF_CHARS};
use crate::utils::error::{AnalysisError, AnalysisResult};

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn normalize_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.strip_prefix("./").map(str::to_string).unwrap_or(path)
}

fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Whether a declared artifact pattern matches a changed path.
///
/// A glob without any `/` is also tried against the file's basename, so
/// `*.csv.ts` matches `src/export/orders.csv.ts`.
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern = normalize_path(pattern);
    let path = normalize_path(path);
    if pattern.is_empty() || path.is_empty() {
        return false;
    }

    if has_wildcards(&pattern) {
        let Ok(glob) = Pattern::new(&pattern) else {
            tracing::warn!("[FilenameMatcher] invalid glob pattern '{}'", pattern);
            return false;
        };
        if glob.matches_with(&path, GLOB_OPTIONS) {
            return true;
        }
        if !pattern.contains('/') {
            let basename = path.rsplit('/').next().unwrap_or(&path);
            return glob.matches_with(basename, GLOB_OPTIONS);
        }
        false
    } else {
        path.contains(&pattern) || pattern.contains(&path)
    }
}

/// First changed file matching `pattern`.
pub fn find_matching_file<'a>(pattern: &str, files: &'a [String]) -> Option<&'a str> {
    files
        .iter()
        .map(String::as_str)
        .find(|file| pattern_matches(pattern, file))
}

/// Model verdict on one file diff.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileVerdict {
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Confirms a filename match against that file's diff.
pub struct FileGate {
    provider: Arc<dyn LlmProvider>,
    threshold: f64,
    sanitizer: DiffSanitizer,
}

impl FileGate {
    pub fn new(provider: Arc<dyn LlmProvider>, threshold: f64, sanitizer: DiffSanitizer) -> Self {
        Self {
            provider,
            threshold,
            sanitizer,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Ask the model how likely `file_diff` completes `ticket`.
    pub async fn judge(
        &self,
        ticket: &Ticket,
        file: &str,
        file_diff: &str,
    ) -> AnalysisResult<FileVerdict> {
        let diff = self.sanitizer.sanitize(file_diff, MAX_FILE_DIFF_CHARS)?;
        let response = self
            .provider
            .send_message(
                vec![Message::user(prompts::file_gate_user_prompt(
                    ticket, file, &diff.text,
                ))],
                Some(prompts::file_gate_system_prompt()),
                LlmRequestOptions::json(MODEL_TEMPERATURE),
            )
            .await?;

        let content = response
            .content
            .ok_or_else(|| AnalysisError::invalid_response("empty completion"))?;
        let verdict: FileVerdict = parse_json_response(&content)?;
        if !(0.0..=1.0).contains(&verdict.confidence) {
            return Err(AnalysisError::invalid_response(format!(
                "confidence {} outside [0, 1]",
                verdict.confidence
            )));
        }
        Ok(verdict)
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }
}

/// Filename matching over all still-unmatched tickets.
pub struct FilenamePhase {
    gate: Option<FileGate>,
}

impl FilenamePhase {
    /// `gate` is `None` when the model check is disabled or has no
    /// credentials; matches are then accepted as-is.
    pub fn new(gate: Option<FileGate>) -> Self {
        Self { gate }
    }

    /// Match `tickets` against `files` (already exclusion-filtered) and
    /// add accepted results to `results`. Tickets are handled one at a
    /// time, in order; a failed model call only rejects that ticket.
    pub async fn run(
        &self,
        commit: &CommitInfo,
        files: &[String],
        tickets: &[Ticket],
        source: &dyn CommitSource,
        results: &mut MatchSet,
    ) -> usize {
        let mut added = 0;
        for ticket in tickets {
            if results.contains(&ticket.id) {
                continue;
            }
            let Some(pattern) = ticket.artifact_pattern() else {
                continue;
            };
            let Some(file) = find_matching_file(pattern, files) else {
                continue;
            };
            tracing::info!(
                "[FilenamePhase] {} matched '{}' via pattern '{}'",
                ticket.id,
                file,
                pattern
            );

            let result = match &self.gate {
                None => Some(MatchResult::review_candidate(
                    &ticket.id,
                    MatchPhase::FileName,
                    format!("Changed file '{}' matches target '{}'", file, pattern),
                    None,
                )),
                Some(gate) => self.gated(gate, commit, ticket, file, source).await,
            };

            if let Some(result) = result {
                if results.insert(result) {
                    added += 1;
                }
            }
        }
        added
    }

    async fn gated(
        &self,
        gate: &FileGate,
        commit: &CommitInfo,
        ticket: &Ticket,
        file: &str,
        source: &dyn CommitSource,
    ) -> Option<MatchResult> {
        let verdict = match source.file_diff(commit, file) {
            Ok(diff) => gate.judge(ticket, file, &diff).await,
            Err(e) => Err(AnalysisError::invalid_response(format!(
                "could not read diff for {}: {}",
                file, e
            ))),
        };

        let (confidence, reasoning) = match verdict {
            Ok(v) => (v.confidence, v.reasoning),
            Err(e) => {
                tracing::warn!(
                    "[FilenamePhase] model check for {} failed, treating confidence as 0: {}",
                    ticket.id,
                    e
                );
                (0.0, e.to_string())
            }
        };

        if confidence < gate.threshold() {
            tracing::info!(
                "[FilenamePhase] {} rejected: confidence {:.2} below {:.2}",
                ticket.id,
                confidence,
                gate.threshold()
            );
            return None;
        }

        let analysis = AiAnalysis {
            confidence,
            reasoning: reasoning.clone(),
            model: gate.model().to_string(),
            analyzed_at: Utc::now(),
        };
        Some(MatchResult::review_candidate(
            &ticket.id,
            MatchPhase::FileName,
            format!("Changed file '{}' matches target; {}", file, reasoning),
            Some(analysis),
        ))
    }
}
