//! Minutes analyzer.
//!
//! file -> (docx conversion) -> one model call -> schema check -> project
//! lookup -> one pending-approval record. Nothing is written to the tickets
//! collection; an external approval step promotes the record.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use todo_tracker_core::{ApprovalStatus, ExtractedMinutes, PendingMinutes};
use todo_tracker_llm::{parse_json_response, LlmProvider, LlmRequestOptions, Message};

use super::docx::DocxDocument;
use super::markdown;
use super::prompt;
use crate::models::MODEL_TEMPERATURE;
use crate::storage::{DocumentStore, PendingMinutesRepository, ProjectRepository};
use crate::utils::error::{AnalysisError, AnalysisResult, AppError, AppResult};

/// Largest minutes text sent to the model (512KB)
pub const MAX_MINUTES_BYTES: usize = 512 * 1024;

/// How the analyzed text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Markdown,
    Text,
    /// Converted from `.docx`
    Docx,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("docx") => Self::Docx,
            Some("md") | Some("markdown") => Self::Markdown,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Docx => "docx",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minutes text ready for analysis.
#[derive(Debug, Clone)]
pub struct MinutesSource {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub content: String,
}

impl MinutesSource {
    /// Read a minutes file, converting `.docx` to Markdown first.
    ///
    /// Text over `MAX_MINUTES_BYTES` is rejected, as is an empty document.
    pub fn load(path: &Path) -> AppResult<Self> {
        let format = SourceFormat::from_path(path);
        let content = match format {
            SourceFormat::Docx => {
                let doc = DocxDocument::open(path)?;
                markdown::convert(&doc)
            }
            SourceFormat::Markdown | SourceFormat::Text => {
                let size = std::fs::metadata(path)?.len();
                if size > MAX_MINUTES_BYTES as u64 {
                    return Err(too_large(size as usize));
                }
                std::fs::read_to_string(path)?
            }
        };

        if content.len() > MAX_MINUTES_BYTES {
            return Err(too_large(content.len()));
        }
        if content.trim().is_empty() {
            return Err(AppError::validation(format!(
                "minutes file {} is empty",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            format,
            content,
        })
    }

    /// SHA-256 of the text sent to the model, lowercase hex.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.content.as_bytes());
        hash.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn too_large(size: usize) -> AppError {
    AppError::validation(format!(
        "Minutes too large: {:.1} KB (max {} KB)",
        size as f64 / 1024.0,
        MAX_MINUTES_BYTES / 1024
    ))
}

/// Command-line inputs for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct MinutesRequest {
    pub file: PathBuf,
    /// Explicit project; takes precedence over the extracted name
    pub project_id: Option<String>,
    pub commit_hash: Option<String>,
    pub pushed_by: Option<String>,
}

/// Result of a run: the stored record and its id.
#[derive(Debug, Clone)]
pub struct MinutesOutcome {
    pub record_id: String,
    pub record: PendingMinutes,
    /// Records dropped by the schema check, one message each
    pub dropped: Vec<String>,
}

pub struct MinutesAnalyzer {
    provider: Arc<dyn LlmProvider>,
    projects: ProjectRepository,
    pending: PendingMinutesRepository,
}

impl MinutesAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, store: DocumentStore) -> Self {
        Self {
            provider,
            projects: ProjectRepository::new(store.clone()),
            pending: PendingMinutesRepository::new(store),
        }
    }

    /// Ask the model for the structured extraction.
    ///
    /// A response that does not match the schema is an error; it is not
    /// retried.
    pub async fn extract(&self, source: &MinutesSource) -> AnalysisResult<ExtractedMinutes> {
        let response = self
            .provider
            .send_message(
                vec![Message::user(prompt::user_prompt(
                    &source.display_name(),
                    &source.content,
                ))],
                Some(prompt::system_prompt().to_string()),
                LlmRequestOptions::json(MODEL_TEMPERATURE),
            )
            .await?;

        let content = response
            .content
            .ok_or_else(|| AnalysisError::invalid_response("empty completion"))?;
        Ok(parse_json_response(&content)?)
    }

    /// Project id for the record.
    ///
    /// An explicit id is used as given. Otherwise the extracted name is
    /// matched exactly (after quote folding and trimming) against stored
    /// project names; no match leaves the record unassigned.
    pub fn resolve_project(
        &self,
        explicit_id: Option<&str>,
        extracted_name: Option<&str>,
    ) -> AppResult<Option<String>> {
        if let Some(id) = explicit_id.map(str::trim).filter(|id| !id.is_empty()) {
            tracing::info!("[MinutesAnalyzer] using project {} from the command line", id);
            return Ok(Some(id.to_string()));
        }
        let Some(name) = extracted_name else {
            tracing::info!("[MinutesAnalyzer] minutes name no project; record stays unassigned");
            return Ok(None);
        };
        match self.projects.find_by_name(name)? {
            Some(project) => {
                tracing::info!("[MinutesAnalyzer] project '{}' resolved to {}", name, project.id);
                Ok(Some(project.id))
            }
            None => {
                tracing::warn!(
                    "[MinutesAnalyzer] no project named '{}'; record stays unassigned",
                    name
                );
                Ok(None)
            }
        }
    }

    /// Run the whole analysis and store one pending record.
    pub async fn analyze(&self, request: &MinutesRequest) -> AppResult<MinutesOutcome> {
        let source = MinutesSource::load(&request.file)?;
        tracing::info!(
            "[MinutesAnalyzer] analyzing {} ({}, {} bytes)",
            source.path.display(),
            source.format,
            source.content.len()
        );

        let mut extracted = self.extract(&source).await?;
        let dropped = extracted.sanitize();
        for reason in &dropped {
            tracing::warn!("[MinutesAnalyzer] dropped record: {}", reason);
        }
        if extracted.is_empty() {
            tracing::warn!("[MinutesAnalyzer] no issues or TODOs extracted");
        }

        let project_id = self.resolve_project(
            request.project_id.as_deref(),
            extracted.project_name.as_deref(),
        )?;

        let record = PendingMinutes {
            id: String::new(),
            source_file: request.file.display().to_string(),
            source_format: source.format.as_str().to_string(),
            content_digest: source.digest(),
            project_id,
            project_name: extracted.project_name.clone(),
            extracted,
            status: ApprovalStatus::Pending,
            commit_hash: request.commit_hash.clone(),
            pushed_by: request.pushed_by.clone(),
            model: self.provider.model().to_string(),
            created_at: Utc::now(),
        };

        let record_id = self.pending.insert(&record)?;
        tracing::info!(
            "[MinutesAnalyzer] stored pending minutes {} ({} issue(s), {} TODO(s))",
            record_id,
            record.extracted.issues.len(),
            record.extracted.todos.len()
        );

        Ok(MinutesOutcome {
            record: PendingMinutes {
                id: record_id.clone(),
                ..record
            },
            record_id,
            dropped,
        })
    }
}
