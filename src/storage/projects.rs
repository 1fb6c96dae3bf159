//! Project Repository
//!
//! Read-only lookups on the `projects` collection.

use todo_tracker_core::{normalize_project_name, Project};

use super::database::{Document, DocumentStore, Filter};
use crate::utils::error::AppResult;

/// Collection holding projects
pub const PROJECTS_COLLECTION: &str = "projects";

/// Repository over the `projects` collection
#[derive(Clone)]
pub struct ProjectRepository {
    store: DocumentStore,
}

impl ProjectRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Every stored project; malformed documents are skipped.
    pub fn list(&self) -> AppResult<Vec<Project>> {
        let mut projects = Vec::new();
        for doc in self.store.query(PROJECTS_COLLECTION, &[])? {
            let id = doc.id.clone();
            match decode(doc) {
                Ok(project) => projects.push(project),
                Err(e) => tracing::warn!("[ProjectRepository] skipping malformed project {}: {}", id, e),
            }
        }
        Ok(projects)
    }

    /// Store a project under its own id.
    pub fn put(&self, project: &Project) -> AppResult<()> {
        let data = serde_json::to_value(project)?;
        self.store.set(PROJECTS_COLLECTION, &project.id, &data)
    }

    /// Project linked to `repository` (`owner/name` or bare `name`).
    ///
    /// A project listing the exact string wins; otherwise the first project
    /// whose entry matches case-insensitively or by repository name.
    pub fn find_by_repository(&self, repository: &str) -> AppResult<Option<Project>> {
        let wanted = repository.trim();
        if wanted.is_empty() {
            return Ok(None);
        }

        let exact = self.store.query(
            PROJECTS_COLLECTION,
            &[Filter::array_contains("repositories", wanted)],
        )?;
        if let Some(project) = exact.into_iter().find_map(|doc| decode(doc).ok()) {
            return Ok(Some(project));
        }

        Ok(self
            .list()?
            .into_iter()
            .find(|p| p.links_repository(wanted)))
    }

    /// Project whose normalized name equals the normalized `name`.
    pub fn find_by_name(&self, name: &str) -> AppResult<Option<Project>> {
        let wanted = normalize_project_name(name);
        if wanted.is_empty() {
            return Ok(None);
        }
        Ok(self
            .list()?
            .into_iter()
            .find(|p| normalize_project_name(&p.name) == wanted))
    }
}

fn decode(doc: Document) -> AppResult<Project> {
    let mut project: Project = serde_json::from_value(doc.data)?;
    project.id = doc.id;
    Ok(project)
}
