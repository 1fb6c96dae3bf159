//! Git Facade
//!
//! Reads the commit under analysis by shelling out to the git CLI.
//! `CommitSource` is the seam the auto-close pipeline depends on, so
//! tests can hand it a prepared commit instead of a repository.

pub mod ops;
pub mod service;

use std::borrow::Cow;

use todo_tracker_core::CommitInfo;

use crate::utils::error::AppResult;

pub use ops::{GitOps, GitResult};
pub use service::GitService;

/// Source of the commit being analyzed.
pub trait CommitSource: Send + Sync {
    /// The latest commit with changed files and full diff.
    /// A repository without commits is a fatal error.
    fn latest_commit(&self) -> AppResult<CommitInfo>;

    /// Diff of `commit` restricted to one path.
    fn file_diff(&self, commit: &CommitInfo, path: &str) -> AppResult<String>;
}

/// Undo git's C-style quoting of a path (`"dir/a\\tb.txt"`).
///
/// Even with `core.quotepath=false`, git still quotes paths that contain
/// quotes, backslashes, or control characters. Unquoted input is returned
/// unchanged.
pub fn unquote_path(raw: &str) -> Cow<'_, str> {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
    else {
        return Cow::Borrowed(raw);
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut rest = inner.bytes().peekable();
    while let Some(b) = rest.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match rest.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match rest.peek() {
                        Some(&o @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(o - b'0');
                            rest.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}
