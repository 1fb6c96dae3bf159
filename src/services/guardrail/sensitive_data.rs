//! Secret Detection
//!
//! Scans text bound for the model for API keys, tokens, private keys, and
//! credential assignments. Detection is all-or-nothing: callers abort the
//! step on any hit instead of redacting.

use regex::Regex;
use std::sync::OnceLock;

/// A named secret-shaped pattern.
#[derive(Debug, Clone)]
pub struct SensitivePattern {
    pub name: &'static str,
    pub regex: &'static str,
    pub description: &'static str,
}

/// Compiled regex patterns, compiled once.
struct CompiledPattern {
    name: &'static str,
    regex: Regex,
}

fn compiled_patterns() -> &'static Vec<CompiledPattern> {
    static PATTERNS: OnceLock<Vec<CompiledPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        default_sensitive_patterns()
            .into_iter()
            .filter_map(|p| match Regex::new(p.regex) {
                Ok(regex) => Some(CompiledPattern { name: p.name, regex }),
                Err(e) => {
                    tracing::error!("[SecretScanner] pattern {} failed to compile: {}", p.name, e);
                    None
                }
            })
            .collect()
    })
}

/// Returns the fixed set of secret patterns.
pub fn default_sensitive_patterns() -> Vec<SensitivePattern> {
    vec![
        SensitivePattern {
            name: "openai_api_key",
            regex: r"sk-[a-zA-Z0-9_\-]{20,}",
            description: "OpenAI-style API key (sk-...)",
        },
        SensitivePattern {
            name: "aws_access_key",
            regex: r"AKIA[0-9A-Z]{16}",
            description: "AWS access key ID (AKIA...)",
        },
        SensitivePattern {
            name: "github_token",
            regex: r"gh[pousr]_[a-zA-Z0-9]{36,}",
            description: "GitHub token (ghp_, gho_, ghs_...)",
        },
        SensitivePattern {
            name: "slack_token",
            regex: r"xox[abprs]-[a-zA-Z0-9\-]{10,}",
            description: "Slack token (xox?-...)",
        },
        SensitivePattern {
            name: "google_api_key",
            regex: r"AIza[0-9A-Za-z_\-]{35}",
            description: "Google API key (AIza...)",
        },
        SensitivePattern {
            name: "bearer_token",
            regex: r"(?i)bearer\s+[a-z0-9_\-\.=]{20,}",
            description: "Bearer token in a header or string",
        },
        SensitivePattern {
            name: "private_key",
            regex: r"-----BEGIN [A-Z ]*PRIVATE KEY-----",
            description: "PEM private key header",
        },
        SensitivePattern {
            name: "credential_literal",
            regex: r#"(?i)(password|passwd|secret|token|api_?key)\w*["']?\s*[=:]\s*["'][^"'\s]{4,}["']"#,
            description: "Password/secret/token assigned a string literal",
        },
        SensitivePattern {
            name: "credential_env",
            regex: r"(?m)^[+\-\s]*[A-Z0-9_]*(PASSWORD|SECRET|TOKEN|API_KEY)[A-Z0-9_]*\s*=\s*\S{4,}",
            description: "Password/secret/token in an env-style assignment",
        },
    ]
}

/// Name of the first secret pattern found in `text`, if any.
pub fn find_secret(text: &str) -> Option<&'static str> {
    compiled_patterns()
        .iter()
        .find(|p| p.regex.is_match(text))
        .map(|p| p.name)
}
