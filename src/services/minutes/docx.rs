//! DOCX body reader.
//!
//! Reads `word/document.xml` (and the style names from `word/styles.xml`)
//! out of the zip container and returns the top-level body as a sequence of
//! paragraphs and tables. Only what the minutes converter needs is kept:
//! paragraph text with its style, and table cells with their plain text and
//! any content-control (`w:sdt`) text.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::utils::error::{AppError, AppResult};

/// Maximum size of a `.docx` container accepted for conversion (20MB)
pub const MAX_DOCX_BYTES: u64 = 20 * 1024 * 1024;

/// A top-level paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub style_id: Option<String>,
    /// Display name from `styles.xml`, e.g. `heading 4`
    pub style_name: Option<String>,
    pub text: String,
}

impl Paragraph {
    /// Whether the paragraph uses the built-in heading style of `level`.
    ///
    /// Localized Word versions keep the English style name but may number
    /// the style id (`4` instead of `Heading4`), so both are checked.
    pub fn is_heading(&self, level: u8) -> bool {
        let name_hit = self
            .style_name
            .as_deref()
            .is_some_and(|n| n.trim().eq_ignore_ascii_case(&format!("heading {}", level)));
        let id_hit = self
            .style_id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(&format!("Heading{}", level)));
        name_hit || id_hit
    }
}

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// Text of the cell's own paragraphs, joined with newlines
    pub text: String,
    /// Text of each content control in the cell, runs joined with spaces
    pub controls: Vec<String>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            controls: Vec::new(),
        }
    }

    /// Text of the first non-empty content control, else the plain text.
    ///
    /// Dropdowns and date pickers keep their value inside `w:sdt`, which
    /// the plain text does not include.
    pub fn display_text(&self) -> &str {
        self.controls
            .iter()
            .map(|c| c.trim())
            .find(|c| !c.is_empty())
            .unwrap_or_else(|| self.text.trim())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Plain text of every cell joined with spaces.
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .flatten()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Body of a `.docx` document in reading order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxDocument {
    pub blocks: Vec<Block>,
}

impl DocxDocument {
    /// Read a `.docx` file from disk.
    pub fn open(path: &Path) -> AppResult<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_DOCX_BYTES {
            return Err(AppError::validation(format!(
                "File too large: {:.1} MB (max {:.1} MB)",
                size as f64 / (1024.0 * 1024.0),
                MAX_DOCX_BYTES as f64 / (1024.0 * 1024.0)
            )));
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a `.docx` container from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> AppResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|e| AppError::validation(format!("Failed to read DOCX as ZIP: {}", e)))?;

        let document_xml = read_entry(&mut archive, "word/document.xml")?
            .ok_or_else(|| AppError::validation("Invalid DOCX: missing word/document.xml"))?;
        let styles = match read_entry(&mut archive, "word/styles.xml")? {
            Some(xml) => parse_style_names(&xml)?,
            None => HashMap::new(),
        };

        let blocks = parse_body(&document_xml, &styles)?;
        Ok(Self { blocks })
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }
}

fn read_entry<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> AppResult<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(AppError::validation(format!("Failed to read {}: {}", name, e))),
    };
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Value of the attribute whose local name is `key` (`w:val`, `w:styleId`).
fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Map of style id to style display name.
fn parse_style_names(xml: &str) -> AppResult<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut names = HashMap::new();
    let mut current: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match local_name(e).as_str() {
                "style" => current = attr(e, "styleId"),
                "name" => {
                    if let (Some(id), Some(name)) = (current.as_ref(), attr(e, "val")) {
                        names.insert(id.clone(), name);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"style" => current = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(AppError::validation(format!("styles.xml parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

#[derive(Default)]
struct CellBuilder {
    paragraphs: Vec<String>,
    current: Option<String>,
    controls: Vec<Vec<String>>,
    span: usize,
}

impl CellBuilder {
    fn finish(self) -> Cell {
        Cell {
            text: self.paragraphs.join("\n").trim().to_string(),
            controls: self
                .controls
                .into_iter()
                .map(|runs| runs.join(" ").trim().to_string())
                .collect(),
        }
    }
}

/// Streaming state for `document.xml`.
///
/// Only paragraphs and tables that are direct children of `w:body` become
/// blocks. Tables nested inside cells are skipped.
struct BodyParser<'a> {
    styles: &'a HashMap<String, String>,
    path: Vec<String>,
    blocks: Vec<Block>,
    paragraph: Option<Paragraph>,
    table: Option<Table>,
    row: Option<Vec<Cell>>,
    cell: Option<CellBuilder>,
    nested_tables: usize,
    sdt_depth: usize,
    in_text: bool,
}

impl<'a> BodyParser<'a> {
    fn new(styles: &'a HashMap<String, String>) -> Self {
        Self {
            styles,
            path: Vec::new(),
            blocks: Vec::new(),
            paragraph: None,
            table: None,
            row: None,
            cell: None,
            nested_tables: 0,
            sdt_depth: 0,
            in_text: false,
        }
    }

    fn parent_is_body(&self) -> bool {
        self.path.last().is_some_and(|p| p == "body")
    }

    fn in_run(&self) -> bool {
        self.path.last().is_some_and(|p| p == "r")
    }

    fn start(&mut self, e: &BytesStart<'_>) {
        let name = local_name(e);
        match name.as_str() {
            "p" if self.parent_is_body() => self.paragraph = Some(Paragraph::default()),
            "p" => {
                if let Some(cell) = self.cell.as_mut() {
                    if self.nested_tables == 0 && self.sdt_depth == 0 {
                        cell.current = Some(String::new());
                    }
                }
            }
            "pStyle" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.style_id = attr(e, "val");
                }
            }
            "tbl" if self.table.is_none() && self.parent_is_body() => {
                self.table = Some(Table::default());
            }
            "tbl" if self.table.is_some() => self.nested_tables += 1,
            "tr" if self.table.is_some() && self.nested_tables == 0 => self.row = Some(Vec::new()),
            "tc" if self.row.is_some() && self.nested_tables == 0 => {
                self.cell = Some(CellBuilder {
                    span: 1,
                    ..Default::default()
                });
            }
            "gridSpan" if self.nested_tables == 0 => {
                if let (Some(cell), Some(span)) = (
                    self.cell.as_mut(),
                    attr(e, "val").and_then(|v| v.parse::<usize>().ok()),
                ) {
                    cell.span = span.max(1);
                }
            }
            "sdt" => {
                if self.cell.is_some() && self.nested_tables == 0 {
                    self.sdt_depth += 1;
                    if self.sdt_depth == 1 {
                        if let Some(cell) = self.cell.as_mut() {
                            cell.controls.push(Vec::new());
                        }
                    }
                }
            }
            "t" => self.in_text = true,
            "tab" if self.in_run() => self.push_text("\t", false),
            "br" | "cr" if self.in_run() => self.push_text("\n", false),
            _ => {}
        }
        self.path.push(name);
    }

    fn end(&mut self, name: &str) {
        self.path.pop();
        match name {
            "p" if self.parent_is_body() => {
                if let Some(mut p) = self.paragraph.take() {
                    p.style_name = p
                        .style_id
                        .as_ref()
                        .and_then(|id| self.styles.get(id))
                        .cloned();
                    self.blocks.push(Block::Paragraph(p));
                }
            }
            "p" => {
                if let Some(cell) = self.cell.as_mut() {
                    if let Some(text) = cell.current.take() {
                        cell.paragraphs.push(text);
                    }
                }
            }
            "t" => self.in_text = false,
            "sdt" if self.cell.is_some() && self.nested_tables == 0 && self.sdt_depth > 0 => {
                self.sdt_depth -= 1;
            }
            "tc" if self.nested_tables == 0 => {
                if let (Some(builder), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    let span = builder.span;
                    let cell = builder.finish();
                    // Merged cells repeat, so column positions stay aligned
                    for _ in 1..span {
                        row.push(cell.clone());
                    }
                    row.push(cell);
                }
                self.sdt_depth = 0;
            }
            "tr" if self.nested_tables == 0 => {
                if let (Some(row), Some(table)) = (self.row.take(), self.table.as_mut()) {
                    table.rows.push(row);
                }
            }
            "tbl" if self.nested_tables > 0 => self.nested_tables -= 1,
            "tbl" => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(Block::Table(table));
                }
            }
            _ => {}
        }
    }

    /// Append text to whatever is currently open. `from_run` marks `w:t`
    /// content, which also feeds content controls.
    fn push_text(&mut self, text: &str, from_run: bool) {
        if let Some(p) = self.paragraph.as_mut() {
            p.text.push_str(text);
            return;
        }
        if self.nested_tables > 0 {
            return;
        }
        let Some(cell) = self.cell.as_mut() else {
            return;
        };
        if self.sdt_depth > 0 {
            if from_run {
                if let Some(runs) = cell.controls.last_mut() {
                    runs.push(text.to_string());
                }
            }
        } else if let Some(current) = cell.current.as_mut() {
            current.push_str(text);
        }
    }
}

fn parse_body(xml: &str, styles: &HashMap<String, String>) -> AppResult<Vec<Block>> {
    let mut reader = Reader::from_str(xml);
    let mut parser = BodyParser::new(styles);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => parser.start(e),
            Ok(Event::Empty(ref e)) => {
                parser.start(e);
                parser.end(&local_name(e));
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                parser.end(&name);
            }
            Ok(Event::Text(ref e)) => {
                if parser.in_text {
                    if let Ok(text) = e.unescape() {
                        parser.push_text(&text, true);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AppError::validation(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.blocks)
}
