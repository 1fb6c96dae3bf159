//! Minutes DOCX to Markdown.
//!
//! Meeting minutes are written in a fixed Word template: a metadata header,
//! a `---` rule, then agenda paragraphs interleaved with three kinds of
//! tables (progress updates on existing tickets, new issues, new TODOs).
//! The Markdown produced here is what the minutes analyzer feeds the model,
//! so update records carry the `[既存課題: ID]` / `[既存ToDo: IDを更新]`
//! back-references the extraction prompt keys on.

use std::sync::OnceLock;

use regex::Regex;

use super::docx::{Block, DocxDocument, Table};

/// Metadata is looked for in this many leading paragraphs
const METADATA_PARAGRAPHS: usize = 10;

const DEFAULT_TITLE: &str = "議事録";
const DEFAULT_ISSUE_TITLE: &str = "新規課題";
const DEFAULT_CHANGE: &str = "最新状況";

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn project_label_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"プロジェクト名\s*[：:;；]\s*")
}

fn task_id_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(TODO-\d+|ISSUE-\d+|NEW-ISSUE-\d+)")
}

fn numbered_heading_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^\d+\.\s+")
}

fn assignee_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"担当者?[:：\s]*(\S+)")
}

fn date_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(\d{4}[-/]\d{2}[-/]\d{2})")
}

/// Header fields read from the top of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct MinutesMetadata {
    pub project_name: Option<String>,
    pub title: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub participants: Option<String>,
}

impl Default for MinutesMetadata {
    fn default() -> Self {
        Self {
            project_name: None,
            title: DEFAULT_TITLE.to_string(),
            date: None,
            location: None,
            participants: None,
        }
    }
}

/// Remove `label` and the separator right after it.
fn strip_label(text: &str, label: &str) -> Option<String> {
    let (before, after) = text.split_once(label)?;
    let after = after.trim_start().trim_start_matches([':', '：']);
    let value = format!("{}{}", before.trim(), after.trim());
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn extract_metadata(doc: &DocxDocument) -> MinutesMetadata {
    let mut meta = MinutesMetadata::default();

    for para in doc.paragraphs().take(METADATA_PARAGRAPHS) {
        let text = para.text.trim();
        if text.is_empty() {
            continue;
        }

        if para.is_heading(4) {
            if text.contains("プロジェクト") {
                let name = match project_label_regex() {
                    Some(re) => re.replace_all(text, "").trim().to_string(),
                    None => text.to_string(),
                };
                if !name.is_empty() {
                    meta.project_name = Some(name);
                }
            }
            continue;
        }

        if text.contains("議事録") {
            meta.title = text.to_string();
        }
        if text.contains("日時") {
            meta.date = strip_label(text, "日時");
        }
        if text.contains("場所") {
            meta.location = strip_label(text, "場所");
        }
        if text.contains("参加者") {
            meta.participants = strip_label(text, "参加者");
        }
    }

    meta
}

/// One row of a progress table: a change to an existing ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub task_name: String,
    pub task_id: String,
    /// `最新状況`, `対応方針`, `期限`/`期日`, `完了`, `中止` or free text
    pub change: String,
    pub content: String,
}

/// Rows of a progress table. The header row and rows without a ticket id
/// after the `/` in the first column are skipped.
pub fn parse_progress_table(table: &Table) -> Vec<ProgressUpdate> {
    let Some(id_re) = task_id_regex() else {
        return Vec::new();
    };

    table
        .rows
        .iter()
        .skip(1)
        .filter(|row| row.len() >= 3)
        .filter_map(|row| {
            let first = row[0].display_text();
            let (name, rest) = first.split_once('/')?;
            let task_id = id_re.find(rest)?.as_str().to_string();

            let name = name.trim();
            let task_name = if name.is_empty() {
                format!("タスク {}", task_id)
            } else {
                name.to_string()
            };
            let change = match row[1].display_text() {
                "" => DEFAULT_CHANGE.to_string(),
                other => other.to_string(),
            };

            Some(ProgressUpdate {
                task_name,
                task_id,
                change,
                content: row[2].display_text().to_string(),
            })
        })
        .collect()
}

/// Key-value content of an issue or TODO table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFields {
    pub title: String,
    pub assignee: String,
    pub due_date: String,
    /// TODO body
    pub content: String,
    pub target: String,
    /// Issue body
    pub issue_content: String,
    pub latest_status: String,
    pub strategy: String,
}

/// Read an issue or TODO table laid out as label cells followed by values.
///
/// The value of a labeled row is the second cell, or the third when the
/// second is empty (merged label cells).
pub fn parse_fields_table(table: &Table) -> TableFields {
    let table_text = table.text();
    let is_issue_table = ["課題内容", "対応方針", "最新状況"]
        .iter()
        .any(|k| table_text.contains(k));
    let is_todo_table = table_text.contains("ToDo") && table_text.contains("担当");

    let mut fields = TableFields::default();
    for row in &table.rows {
        if row.len() < 2 {
            continue;
        }
        let texts: Vec<&str> = row.iter().map(|c| c.text.trim()).collect();
        let row_text = texts.join(" ");
        let label = texts[0];
        let value = if !texts[1].is_empty() {
            texts[1]
        } else {
            texts.get(2).copied().unwrap_or_default()
        };

        if label.contains("ToDo") || label.contains("タイトル") {
            fields.title = value.to_string();
        }
        if row_text.contains("担当") {
            if let Some(caps) = assignee_regex().and_then(|re| re.captures(&row_text)) {
                fields.assignee = caps[1].to_string();
            }
        }
        if row_text.contains("期限") || row_text.contains("期日") {
            if let Some(m) = date_regex().and_then(|re| re.find(&row_text)) {
                fields.due_date = m.as_str().to_string();
            }
        }

        if label.contains("課題内容") {
            fields.issue_content = value.to_string();
        } else if label == "内容" {
            if is_issue_table {
                fields.issue_content = value.to_string();
            } else if is_todo_table {
                fields.content = value.to_string();
            }
        }

        if label.contains("最新状況") {
            fields.latest_status = value.to_string();
        }
        if label.contains("対応方針") {
            fields.strategy = value.to_string();
        }
        if label.contains("判定") {
            fields.target = value.to_string();
        }
    }
    fields
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TableKind {
    Progress,
    Issue,
    Todo,
    Other,
}

fn classify(table_text: &str) -> TableKind {
    if table_text.contains("タスク名") && table_text.contains("変更") {
        TableKind::Progress
    } else if table_text.contains("内容")
        && (table_text.contains("最新状況") || table_text.contains("対応方針"))
    {
        TableKind::Issue
    } else if table_text.contains("ToDo") && table_text.contains("担当") {
        TableKind::Todo
    } else {
        TableKind::Other
    }
}

/// Line-oriented Markdown buffer that never stacks blank lines.
#[derive(Default)]
struct MarkdownWriter {
    out: String,
}

impl MarkdownWriter {
    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

struct Converter {
    md: MarkdownWriter,
    /// Title from the last `課題:` paragraph, consumed by the next tables
    current_issue: Option<String>,
}

impl Converter {
    fn header(&mut self, meta: &MinutesMetadata) {
        if let Some(name) = &meta.project_name {
            self.md.line("# プロジェクト情報");
            self.md.line(format!("- プロジェクト名: {}", name));
            self.md.blank();
        }
        self.md.line(format!("# {}", meta.title));
        for (label, value) in [
            ("日時", &meta.date),
            ("場所", &meta.location),
            ("参加者", &meta.participants),
        ] {
            if let Some(value) = value {
                self.md.line(format!("**{}**: {}", label, value));
            }
        }
        self.md.line("---");
    }

    fn paragraph(&mut self, text: &str) {
        if text.contains("課題:") || text.contains("課題：") {
            let title = text
                .replace("課題:", "")
                .replace("課題：", "")
                .replace(['[', ']'], "");
            let title = title.trim();
            // A bare label leaves the title to the issue table
            self.current_issue = (!title.is_empty()).then(|| title.to_string());
            return;
        }

        if numbered_heading_regex().is_some_and(|re| re.is_match(text)) {
            self.md.blank();
            self.md.line(format!("## {}", text));
            self.current_issue = None;
        } else if text.contains("議題") {
            self.md.blank();
            self.md.line(text);
        } else {
            self.md.line(text);
        }
    }

    fn progress_table(&mut self, table: &Table) {
        self.md.blank();
        for update in parse_progress_table(table) {
            if update.task_id.contains("ISSUE") {
                self.md.line(format!(
                    "### 課題: {} [既存課題: {}]",
                    update.task_name, update.task_id
                ));
            } else {
                self.md.line(format!(
                    "**ToDo**: {} [既存ToDo: {}を更新]",
                    update.task_name, update.task_id
                ));
            }

            let content = update.content.trim();
            match update.change.as_str() {
                "完了" => self.md.line("**完了**"),
                "中止" => self.md.line("**中止**"),
                "期限" | "期日" => self.md.line(format!("**期日**: {}", content)),
                other => self.md.line(format!("**{}**: {}", other, content)),
            }
            self.md.blank();
        }
        self.md.line("---");
    }

    fn issue_table(&mut self, table: &Table) {
        let fields = parse_fields_table(table);
        if fields.issue_content.is_empty()
            && fields.latest_status.is_empty()
            && fields.strategy.is_empty()
        {
            return;
        }

        let title = match (&self.current_issue, fields.title.as_str()) {
            (Some(current), _) => current.clone(),
            (None, "") => DEFAULT_ISSUE_TITLE.to_string(),
            (None, title) => title.to_string(),
        };

        self.md.blank();
        self.md.line(format!("### 課題: {}", title));
        for (label, value) in [
            ("課題内容", &fields.issue_content),
            ("最新状況", &fields.latest_status),
            ("対応方針", &fields.strategy),
            ("担当者", &fields.assignee),
            ("期限", &fields.due_date),
        ] {
            if !value.is_empty() {
                self.md.line(format!("**{}**: {}", label, value));
            }
        }
        self.md.blank();
    }

    fn todo_table(&mut self, table: &Table) {
        let fields = parse_fields_table(table);
        if fields.title.is_empty() {
            return;
        }

        if self.current_issue.take().is_none() {
            self.md.blank();
        }
        self.md.line(format!("**ToDo**: {}", fields.title));
        self.md.line(format!("- 担当者: {}", fields.assignee));
        for (label, value) in [
            ("期日", &fields.due_date),
            ("内容", &fields.content),
            ("判定対象", &fields.target),
        ] {
            if !value.is_empty() {
                self.md.line(format!("- {}: {}", label, value));
            }
        }
        self.md.blank();
    }

    fn table(&mut self, table: &Table) {
        match classify(&table.text()) {
            TableKind::Progress => self.progress_table(table),
            TableKind::Issue => self.issue_table(table),
            TableKind::Todo => self.todo_table(table),
            TableKind::Other => {}
        }
    }
}

/// Convert a minutes document to Markdown.
///
/// Everything before the first paragraph containing `---` or `━` is the
/// metadata block and is only used for the header.
pub fn convert(doc: &DocxDocument) -> String {
    let meta = extract_metadata(doc);
    let mut converter = Converter {
        md: MarkdownWriter::default(),
        current_issue: None,
    };
    converter.header(&meta);

    let mut in_header = true;
    for block in &doc.blocks {
        match block {
            Block::Paragraph(p) => {
                let text = p.text.trim();
                if text.is_empty() {
                    continue;
                }
                if in_header {
                    if text.contains("---") || text.contains('━') {
                        in_header = false;
                    }
                    continue;
                }
                converter.paragraph(text);
            }
            Block::Table(t) if !in_header => converter.table(t),
            Block::Table(_) => {}
        }
    }

    converter.md.finish()
}
