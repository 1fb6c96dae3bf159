//! Model provider construction.

use std::sync::Arc;

use todo_tracker_llm::{LlmError, LlmProvider, OpenAIProvider};

use crate::models::Settings;
use crate::utils::error::{AppError, AppResult};

/// Provider for the configured model, or `None` when no credential is set.
///
/// A bad endpoint or proxy is a configuration error.
pub fn provider_from_settings(settings: &Settings) -> AppResult<Option<Arc<dyn LlmProvider>>> {
    let config = settings.provider_config();
    if !config.has_credentials() {
        return Ok(None);
    }
    match OpenAIProvider::new(config) {
        Ok(provider) => {
            tracing::info!(
                "[Model] using {} at {}",
                provider.model(),
                provider.endpoint()
            );
            Ok(Some(Arc::new(provider)))
        }
        Err(LlmError::Config { message }) => Err(AppError::config(message)),
        Err(e) => Err(AppError::config(e.to_string())),
    }
}
