//! Path Exclusion
//!
//! Deny-list of files that never take part in matching and never leave the
//! process: lockfiles, credentials, binary assets, build output, and
//! VCS/system files.

use std::borrow::Cow;

use glob::Pattern;

use crate::services::git::unquote_path;

/// Filename globs matched against the last path component.
const EXCLUDED_FILE_PATTERNS: &[&str] = &[
    // lockfiles
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "poetry.lock",
    "Pipfile.lock",
    "Gemfile.lock",
    "composer.lock",
    "go.sum",
    // credentials
    ".env",
    ".env.*",
    "*.pem",
    "*.key",
    "*.p12",
    "*.pfx",
    "*.keystore",
    "id_rsa*",
    "id_ed25519*",
    "credentials.json",
    "service-account*.json",
    "*-adminsdk-*.json",
    ".npmrc",
    ".netrc",
    // binary assets
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.webp",
    "*.ico",
    "*.pdf",
    "*.zip",
    "*.gz",
    "*.tar",
    "*.woff",
    "*.woff2",
    "*.ttf",
    "*.otf",
    "*.mp4",
    "*.mp3",
    "*.exe",
    "*.dll",
    "*.so",
    "*.dylib",
    "*.docx",
    "*.xlsx",
    // generated
    "*.min.js",
    "*.min.css",
    "*.map",
    // system files
    ".DS_Store",
    "Thumbs.db",
];

/// Directory names; any path with one of these as a component is excluded.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "out",
    ".next",
    "coverage",
    ".git",
    ".svn",
];

/// Compiled exclusion rules.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    file_patterns: Vec<Pattern>,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionFilter {
    pub fn new() -> Self {
        let file_patterns = EXCLUDED_FILE_PATTERNS
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::error!("[ExclusionFilter] invalid pattern {}: {}", p, e);
                    None
                }
            })
            .collect();
        Self { file_patterns }
    }

    /// Whether `path` is on the deny-list.
    pub fn is_excluded(&self, path: &str) -> bool {
        let normalized = path.trim().replace('\\', "/");
        let mut components = normalized.split('/').filter(|c| !c.is_empty()).peekable();
        let mut file_name = "";
        while let Some(component) = components.next() {
            if components.peek().is_none() {
                file_name = component;
            } else if EXCLUDED_DIRS.contains(&component) {
                return true;
            }
        }
        if file_name.is_empty() {
            return false;
        }
        self.file_patterns.iter().any(|p| p.matches(file_name))
    }

    /// Keep only the paths that are not excluded, in order.
    pub fn filter_paths(&self, paths: &[String]) -> Vec<String> {
        paths
            .iter()
            .filter(|p| !self.is_excluded(p))
            .cloned()
            .collect()
    }

    /// Remove every `diff --git` section whose file is excluded.
    ///
    /// Text before the first section header is kept as-is.
    pub fn strip_excluded_sections(&self, diff: &str) -> String {
        let mut output = String::with_capacity(diff.len());
        let mut keep = true;
        for line in diff.split_inclusive('\n') {
            if let Some(header) = line.strip_prefix("diff --git ") {
                keep = match section_path(header) {
                    Some(path) => !self.is_excluded(&path),
                    None => true,
                };
                if !keep {
                    tracing::debug!("[ExclusionFilter] dropped diff section: {}", header.trim());
                }
            }
            if keep {
                output.push_str(line);
            }
        }
        output
    }
}

/// Path from a `diff --git a/<path> b/<path>` header (the `b/` side).
///
/// Paths git had to quote appear as `"a/<path>" "b/<path>"`.
fn section_path(header: &str) -> Option<Cow<'_, str>> {
    let header = header.trim_end();
    if header.ends_with('"') {
        if let Some(idx) = header.rfind(" \"b/") {
            return match unquote_path(&header[idx + 1..]) {
                Cow::Borrowed(path) => path.strip_prefix("b/").map(Cow::Borrowed),
                Cow::Owned(path) => path.strip_prefix("b/").map(|p| Cow::Owned(p.to_string())),
            };
        }
    }
    header
        .rfind(" b/")
        .map(|idx| &header[idx + 3..])
        .or_else(|| header.strip_prefix("a/"))
        .map(Cow::Borrowed)
}
