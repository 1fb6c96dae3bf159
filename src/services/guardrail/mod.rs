//! Outbound Guardrails
//!
//! Everything that sends commit content to the model goes through
//! `DiffSanitizer`: excluded files are stripped, the remaining text is
//! scanned for secrets (any hit aborts the step), and the result is
//! truncated to a fixed character budget.
//!
//! - `exclusion`: deny-list of paths
//! - `sensitive_data`: secret-shaped regexes

pub mod exclusion;
pub mod sensitive_data;

pub use exclusion::ExclusionFilter;
pub use sensitive_data::{default_sensitive_patterns, find_secret, SensitivePattern};

use crate::utils::error::{AnalysisError, AnalysisResult};

/// Character budget for the full commit diff (diff analysis)
pub const MAX_DIFF_CHARS: usize = 30_000;
/// Character budget for a single file's diff (filename gate)
pub const MAX_FILE_DIFF_CHARS: usize = 8_000;

/// Truncate to at most `max_chars` characters, on a char boundary.
pub fn truncate_for_llm(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Diff text cleared to leave the process.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedDiff {
    pub text: String,
    /// Character count before truncation
    pub original_chars: usize,
    pub truncated: bool,
}

/// Prepares diff text for a model call.
#[derive(Debug, Clone, Default)]
pub struct DiffSanitizer {
    exclusions: ExclusionFilter,
}

impl DiffSanitizer {
    pub fn new(exclusions: ExclusionFilter) -> Self {
        Self { exclusions }
    }

    pub fn exclusions(&self) -> &ExclusionFilter {
        &self.exclusions
    }

    /// Scan free text that travels with the diff (a commit message, for
    /// one). Nothing is stripped or truncated.
    pub fn check_text(&self, label: &str, text: &str) -> AnalysisResult<()> {
        match find_secret(text) {
            Some(pattern) => {
                tracing::warn!("[DiffSanitizer] secret pattern '{}' found in {}", pattern, label);
                Err(AnalysisError::SecretDetected {
                    pattern: pattern.to_string(),
                })
            }
            None => Ok(()),
        }
    }

    /// Strip excluded sections, scan for secrets, then truncate.
    ///
    /// The scan covers the whole stripped diff, not just the part that
    /// survives truncation.
    pub fn sanitize(&self, diff: &str, max_chars: usize) -> AnalysisResult<SanitizedDiff> {
        let stripped = self.exclusions.strip_excluded_sections(diff);

        if let Some(pattern) = find_secret(&stripped) {
            tracing::warn!("[DiffSanitizer] secret pattern '{}' found in diff", pattern);
            return Err(AnalysisError::SecretDetected {
                pattern: pattern.to_string(),
            });
        }

        let original_chars = stripped.chars().count();
        let text = truncate_for_llm(&stripped, max_chars).to_string();
        let truncated = original_chars > max_chars;
        if truncated {
            tracing::info!(
                "[DiffSanitizer] diff truncated from {} to {} characters",
                original_chars,
                max_chars
            );
        }

        Ok(SanitizedDiff {
            text,
            original_chars,
            truncated,
        })
    }
}
