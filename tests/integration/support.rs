//! Shared helpers for the integration suite.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use async_trait::async_trait;
use todo_tracker::storage::{DocumentStore, ProjectRepository, TicketRepository};
use todo_tracker::services::CommitSource;
use todo_tracker::{AppError, AppResult};
use todo_tracker_core::{CommitInfo, Project, Ticket};
use todo_tracker_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
};

// ============================================================================
// Scripted model
// ============================================================================

/// A recorded model call: system prompt and joined user content.
#[derive(Debug, Clone)]
pub struct Call {
    pub system: Option<String>,
    pub user: String,
}

/// Provider replaying queued responses; an empty queue is an error.
pub struct ScriptedProvider {
    config: ProviderConfig,
    responses: Mutex<VecDeque<LlmResult<LlmResponse>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            config: ProviderConfig {
                api_key: Some("test-key".to_string()),
                model: "scripted-model".to_string(),
                ..ProviderConfig::default()
            },
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, content: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::text("scripted-model", content)));
        self
    }

    pub fn fail(self, error: LlmError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let user = messages
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n");
        self.calls.lock().unwrap().push(Call { system, user });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::Other {
                    message: "no scripted response left".to_string(),
                })
            })
    }
}

// ============================================================================
// Commit source
// ============================================================================

/// Serves one prepared commit and per-file diffs.
pub struct StaticCommitSource {
    commit: Option<CommitInfo>,
    file_diffs: HashMap<String, String>,
}

impl StaticCommitSource {
    pub fn new(commit: CommitInfo) -> Self {
        Self {
            commit: Some(commit),
            file_diffs: HashMap::new(),
        }
    }

    /// A repository without commits.
    pub fn empty() -> Self {
        Self {
            commit: None,
            file_diffs: HashMap::new(),
        }
    }

    pub fn with_file_diff(mut self, path: &str, diff: &str) -> Self {
        self.file_diffs.insert(path.to_string(), diff.to_string());
        self
    }
}

impl CommitSource for StaticCommitSource {
    fn latest_commit(&self) -> AppResult<CommitInfo> {
        self.commit
            .clone()
            .ok_or_else(|| AppError::command("no commit found at HEAD"))
    }

    fn file_diff(&self, _commit: &CommitInfo, path: &str) -> AppResult<String> {
        self.file_diffs
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::command(format!("no diff for {}", path)))
    }
}

/// Unified diff section adding `lines` to `path`.
pub fn file_section(path: &str, lines: &[&str]) -> String {
    let mut diff = format!(
        "diff --git a/{p} b/{p}\n--- a/{p}\n+++ b/{p}\n@@ -0,0 +1,{n} @@\n",
        p = path,
        n = lines.len()
    );
    for line in lines {
        diff.push('+');
        diff.push_str(line);
        diff.push('\n');
    }
    diff
}

// ============================================================================
// Store fixtures
// ============================================================================

pub fn store() -> DocumentStore {
    DocumentStore::new_in_memory().unwrap()
}

pub fn seed_tickets(store: &DocumentStore, tickets: &[Ticket]) {
    let repo = TicketRepository::new(store.clone());
    for ticket in tickets {
        repo.put(ticket).unwrap();
    }
}

pub fn seed_project(store: &DocumentStore, id: &str, name: &str, repositories: &[&str]) {
    ProjectRepository::new(store.clone())
        .put(&Project {
            id: id.to_string(),
            name: name.to_string(),
            repositories: repositories.iter().map(|r| r.to_string()).collect(),
        })
        .unwrap();
}

// ============================================================================
// Git fixtures
// ============================================================================

/// Run git in `path`; false when git is unavailable or the command failed.
pub fn git(path: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(path)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Initialize a repository with a committer identity.
pub fn init_git_repo(path: &Path) -> bool {
    if !git(path, &["init", "-q", "-b", "main"]) && !git(path, &["init", "-q"]) {
        return false;
    }
    git(path, &["config", "user.email", "test@example.com"])
        && git(path, &["config", "user.name", "Test User"])
        && git(path, &["config", "commit.gpgsign", "false"])
}

/// Write `files` and commit them with `message`.
pub fn commit_files(path: &Path, files: &[(&str, &str)], message: &str) -> bool {
    for (name, content) in files {
        let file = path.join(name);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(file, content).unwrap();
    }
    git(path, &["add", "-A"]) && git(path, &["commit", "-q", "-m", message])
}
