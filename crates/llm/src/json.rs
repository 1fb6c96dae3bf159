//! JSON Output Handling
//!
//! Models asked for JSON sometimes wrap it in markdown fences or prose.
//! These helpers pull out the object and deserialize it, turning any
//! mismatch into `LlmError::SchemaViolation`.

use serde::de::DeserializeOwned;

use crate::types::{LlmError, LlmResult};

/// Extract the JSON object text from a model response.
///
/// Handles ```` ```json ... ``` ```` fences and leading/trailing prose by
/// taking the span from the first `{` to the last `}`.
pub fn extract_json_object(response_text: &str) -> Option<&str> {
    let mut text = response_text.trim();

    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        // Skip optional language identifier
        let content_start = after_fence.find('\n').map(|nl| nl + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            text = content[..end].trim();
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start > end {
        return None;
    }
    Some(&text[start..=end])
}

/// Deserialize a model response into `T`.
pub fn parse_json_response<T: DeserializeOwned>(response_text: &str) -> LlmResult<T> {
    if response_text.trim().is_empty() {
        return Err(LlmError::SchemaViolation {
            message: "model returned an empty response".to_string(),
        });
    }

    let json_str = extract_json_object(response_text).ok_or_else(|| LlmError::SchemaViolation {
        message: format!(
            "no JSON object in response (starts with: {:?})",
            response_text.chars().take(80).collect::<String>()
        ),
    })?;

    serde_json::from_str(json_str).map_err(|e| LlmError::SchemaViolation {
        message: e.to_string(),
    })
}
