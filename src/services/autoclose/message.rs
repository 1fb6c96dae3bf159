//! Commit-message parsing.
//!
//! `Closes TODO-12`, `fixes: #ISSUE-3`, `Resolves TODO-1, NEW-ISSUE-2` and
//! the like name tickets the commit completes outright.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn closing_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:closes|fixes|resolves|completes|done)\b\s*:?\s*(#?(?:new-issue|todo|issue)-\d+(?:\s*(?:,|&|\band\b)\s*#?(?:new-issue|todo|issue)-\d+)*)",
        )
        .ok()
    })
    .as_ref()
}

fn id_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(new-issue|todo|issue)-(\d+)\b").ok())
        .as_ref()
}

/// Ticket ids named after a closing keyword, uppercased, de-duplicated,
/// in order of first appearance.
pub fn extract_closing_ids(message: &str) -> Vec<String> {
    let (Some(closing), Some(id_re)) = (closing_regex(), id_regex()) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for caps in closing.captures_iter(message) {
        let Some(list) = caps.get(1) else { continue };
        for id in id_re.captures_iter(list.as_str()) {
            let normalized = format!("{}-{}", id[1].to_ascii_uppercase(), &id[2]);
            if seen.insert(normalized.clone()) {
                ids.push(normalized);
            }
        }
    }
    ids
}
