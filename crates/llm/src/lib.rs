//! Todo Tracker LLM
//!
//! The hosted language-model seam: a one-shot, JSON-mode chat completion
//! treated as a remote function that may fail.
//!
//! - `provider` - `LlmProvider` trait and HTTP error mapping
//! - `openai` - OpenAI-compatible chat-completions provider
//! - `http_client` - reqwest client factory (timeout, optional proxy)
//! - `json` - extraction and schema validation of JSON model output
//! - `types` - request/response/config/error types

pub mod http_client;
pub mod json;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use json::{extract_json_object, parse_json_response};
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;
