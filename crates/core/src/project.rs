//! Project records used to scope ticket queries.

use serde::{Deserialize, Serialize};

/// A project and the repositories linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Linked repository names, either `name` or `owner/name`
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl Project {
    /// Whether this project is linked to the given repository.
    ///
    /// `repository` may be `owner/name` or bare `name`; either form of the
    /// stored entry matches.
    pub fn links_repository(&self, repository: &str) -> bool {
        let wanted = repository.trim();
        if wanted.is_empty() {
            return false;
        }
        let wanted_name = repo_basename(wanted);
        self.repositories.iter().any(|linked| {
            let linked = linked.trim();
            linked.eq_ignore_ascii_case(wanted)
                || repo_basename(linked).eq_ignore_ascii_case(wanted_name)
        })
    }
}

fn repo_basename(repository: &str) -> &str {
    repository.rsplit('/').next().unwrap_or(repository)
}

/// Normalize a project name for exact comparison.
///
/// Folds typographic quotes to their ASCII forms and trims surrounding
/// whitespace. Nothing else is changed; comparison stays exact.
pub fn normalize_project_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{FF02}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{FF07}' => '\'',
            other => other,
        })
        .collect()
}
