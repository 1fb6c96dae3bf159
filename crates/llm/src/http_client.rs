//! HTTP Client Factory
//!
//! Builds the reqwest client used by providers, with request timeout and
//! optional proxy support.

use std::time::Duration;

use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client` with a request timeout and proxy setting.
///
/// - `Some(url)` -> route every request through the proxy
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
pub fn build_http_client(proxy_url: Option<&str>, timeout: Duration) -> LlmResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    match proxy_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let proxy = reqwest::Proxy::all(url).map_err(|e| LlmError::Config {
                message: format!("invalid proxy URL '{}': {}", url, e),
            })?;
            builder = builder.proxy(proxy);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder.build().map_err(|e| LlmError::Config {
        message: format!("failed to build HTTP client: {}", e),
    })
}
