//! Settings Models
//!
//! Runtime configuration read from the environment once per invocation.

use std::path::PathBuf;

use serde::Serialize;
use todo_tracker_llm::{ProviderConfig, DEFAULT_MODEL};

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::default_store_path;

/// Default Phase 3 acceptance threshold
pub const DEFAULT_AI_CONFIDENCE_THRESHOLD: f64 = 0.7;
/// Default Phase 2 acceptance threshold
pub const DEFAULT_PHASE2_CONFIDENCE_THRESHOLD: f64 = 0.5;
/// Default HTTP timeout for model calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Temperature used for every model call
pub const MODEL_TEMPERATURE: f32 = 0.2;

/// Process configuration
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Phase 3 diff analysis enabled
    pub ai_analysis_enabled: bool,
    /// Model name for every call
    pub ai_model: String,
    /// Phase 3 acceptance threshold
    pub ai_confidence_threshold: f64,
    /// Phase 2 model gate enabled
    pub phase2_ai_enabled: bool,
    /// Phase 2 acceptance threshold
    pub phase2_confidence_threshold: f64,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub ai_proxy_url: Option<String>,
    pub ai_request_timeout_secs: u64,
    /// Document store file; `None` means the default location
    pub store_path: Option<PathBuf>,
    /// `owner/name` of the repository being analyzed
    pub github_repository: Option<String>,
    pub git_repo_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_analysis_enabled: false,
            ai_model: DEFAULT_MODEL.to_string(),
            ai_confidence_threshold: DEFAULT_AI_CONFIDENCE_THRESHOLD,
            phase2_ai_enabled: true,
            phase2_confidence_threshold: DEFAULT_PHASE2_CONFIDENCE_THRESHOLD,
            openai_api_key: None,
            openai_base_url: None,
            ai_proxy_url: None,
            ai_request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            store_path: None,
            github_repository: None,
            git_repo_path: PathBuf::from("."),
        }
    }
}

/// Opt-in flag: only explicit truthy values enable.
fn flag_enabled(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes")
    )
}

/// Opt-out flag: only explicit falsy values disable.
fn flag_not_disabled(value: Option<&str>) -> bool {
    !matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("false" | "0" | "no")
    )
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> AppResult<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{} must be a number, got '{}'", key, raw))),
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let settings = Self {
            ai_analysis_enabled: flag_enabled(get("AI_ANALYSIS_ENABLED").as_deref()),
            ai_model: get("AI_MODEL")
                .map(|m| m.trim().to_string())
                .unwrap_or(defaults.ai_model),
            ai_confidence_threshold: parse_number(
                "AI_CONFIDENCE_THRESHOLD",
                get("AI_CONFIDENCE_THRESHOLD"),
                defaults.ai_confidence_threshold,
            )?,
            phase2_ai_enabled: flag_not_disabled(get("PHASE2_AI_ENABLED").as_deref()),
            phase2_confidence_threshold: parse_number(
                "PHASE2_CONFIDENCE_THRESHOLD",
                get("PHASE2_CONFIDENCE_THRESHOLD"),
                defaults.phase2_confidence_threshold,
            )?,
            openai_api_key: get("OPENAI_API_KEY").map(|k| k.trim().to_string()),
            openai_base_url: get("OPENAI_BASE_URL"),
            ai_proxy_url: get("AI_PROXY_URL"),
            ai_request_timeout_secs: parse_number(
                "AI_REQUEST_TIMEOUT_SECS",
                get("AI_REQUEST_TIMEOUT_SECS"),
                defaults.ai_request_timeout_secs,
            )?,
            store_path: get("TODO_STORE_PATH").map(PathBuf::from),
            github_repository: get("GITHUB_REPOSITORY").map(|r| r.trim().to_string()),
            git_repo_path: get("GIT_REPO_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.git_repo_path),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("AI_CONFIDENCE_THRESHOLD", self.ai_confidence_threshold),
            ("PHASE2_CONFIDENCE_THRESHOLD", self.phase2_confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        if self.ai_model.trim().is_empty() {
            return Err(AppError::config("AI_MODEL must not be empty"));
        }

        if self.ai_request_timeout_secs == 0 {
            return Err(AppError::config("AI_REQUEST_TIMEOUT_SECS must be positive"));
        }

        Ok(())
    }

    /// Whether a model credential is configured
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// Store path, falling back to ~/.todo-tracker/store.db
    pub fn resolve_store_path(&self) -> AppResult<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => default_store_path(),
        }
    }

    /// Provider configuration for model calls
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.ai_model.clone(),
            temperature: MODEL_TEMPERATURE,
            timeout_secs: self.ai_request_timeout_secs,
            proxy_url: self.ai_proxy_url.clone(),
            ..ProviderConfig::default()
        }
    }
}
