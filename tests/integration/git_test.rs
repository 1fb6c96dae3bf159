//! Git Facade Integration Tests
//!
//! Each test skips itself when the git CLI is not available.

use tempfile::TempDir;
use todo_tracker::services::autoclose::pattern_matches;
use todo_tracker::services::{CommitSource, GitService};

use crate::support::{commit_files, git, init_git_repo};

fn repo() -> Option<TempDir> {
    let dir = TempDir::new().unwrap();
    if !init_git_repo(dir.path()) {
        eprintln!("git not available, skipping");
        return None;
    }
    Some(dir)
}

#[test]
fn test_latest_commit_reads_message_files_and_diff() {
    let Some(dir) = repo() else { return };
    assert!(commit_files(dir.path(), &[("README.md", "# billing\n")], "Initial commit"));
    assert!(commit_files(
        dir.path(),
        &[
            ("src/export.ts", "export const csv = true;\n"),
            ("docs/export.md", "CSV export\n"),
        ],
        "Add CSV export\n\nCloses TODO-4",
    ));

    let commit = GitService::new(dir.path()).latest_commit().unwrap();

    assert_eq!(commit.hash.len(), 40);
    assert_eq!(commit.message, "Add CSV export\n\nCloses TODO-4");
    assert_eq!(commit.subject(), "Add CSV export");
    assert_eq!(commit.author, "Test User");
    assert!(commit.timestamp.is_some());

    let mut files = commit.changed_files.clone();
    files.sort();
    assert_eq!(files, vec!["docs/export.md", "src/export.ts"]);

    assert!(commit.diff.contains("+export const csv = true;"));
    assert!(commit.diff.contains("+CSV export"));
    assert!(!commit.diff.contains("# billing"));
}

#[test]
fn test_file_diff_is_limited_to_one_path() {
    let Some(dir) = repo() else { return };
    assert!(commit_files(
        dir.path(),
        &[("a.txt", "alpha\n"), ("b.txt", "beta\n")],
        "Add two files",
    ));

    let service = GitService::new(dir.path());
    let commit = service.latest_commit().unwrap();
    let diff = service.file_diff(&commit, "b.txt").unwrap();

    assert!(diff.contains("+beta"));
    assert!(!diff.contains("alpha"));
}

#[test]
fn test_non_ascii_paths_are_not_quoted() {
    let Some(dir) = repo() else { return };
    assert!(commit_files(
        dir.path(),
        &[("minutes/議事録.md", "# 第1回 定例会議\n"), ("src/a.ts", "a\n")],
        "Add minutes",
    ));

    let service = GitService::new(dir.path());
    let commit = service.latest_commit().unwrap();

    assert!(commit.changed_files.iter().any(|f| f == "minutes/議事録.md"));
    assert!(commit.diff.contains("b/minutes/議事録.md"));
    assert!(pattern_matches("minutes/*.md", "minutes/議事録.md"));

    let diff = service.file_diff(&commit, "minutes/議事録.md").unwrap();
    assert!(diff.contains("+# 第1回 定例会議"));
    assert!(!diff.contains("src/a.ts"));
}

#[test]
fn test_merge_commit_diffs_against_first_parent() {
    let Some(dir) = repo() else { return };
    let path = dir.path();
    assert!(commit_files(path, &[("base.txt", "base\n")], "Base"));
    assert!(git(path, &["checkout", "-q", "-b", "feature"]));
    assert!(commit_files(path, &[("feature.txt", "from feature\n")], "Feature work"));
    assert!(git(path, &["checkout", "-q", "-"]));
    assert!(commit_files(path, &[("main.txt", "from main\n")], "Mainline work"));
    assert!(git(
        path,
        &["merge", "-q", "--no-ff", "-m", "Merge feature\n\nCloses TODO-9", "feature"]
    ));

    let commit = GitService::new(path).latest_commit().unwrap();

    assert!(commit.message.starts_with("Merge feature"));
    assert_eq!(commit.changed_files, vec!["feature.txt"]);
    assert!(commit.diff.contains("+from feature"));
    assert!(!commit.diff.contains("from main"));
}

#[test]
fn test_repository_without_commits_is_error() {
    let Some(dir) = repo() else { return };
    assert!(GitService::new(dir.path()).latest_commit().is_err());
}

#[test]
fn test_non_repository_is_error() {
    let dir = TempDir::new().unwrap();
    assert!(GitService::new(dir.path()).latest_commit().is_err());
}
