//! DOCX Minutes Integration Tests

use std::io::{Cursor, Write};

use tempfile::TempDir;
use todo_tracker::services::minutes::{docx_to_markdown, DocxDocument, MinutesSource, SourceFormat};
use zip::write::SimpleFileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

fn write_docx(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        W_NS, body
    );
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:styles xmlns:w="{}"><w:style w:type="paragraph" w:styleId="4"><w:name w:val="heading 4"/></w:style></w:styles>"#,
        W_NS
    );

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        zip.start_file("word/styles.xml", options).unwrap();
        zip.write_all(styles.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    let path = dir.path().join(name);
    std::fs::write(&path, cursor.into_inner()).unwrap();
    path
}

fn p(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
}

fn heading4(text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:pStyle w:val=\"4\"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>",
        text
    )
}

fn cell(text: &str) -> String {
    format!("<w:tc><w:tcPr><w:tcW w:w=\"2000\"/></w:tcPr>{}</w:tc>", p(text))
}

/// Cell whose value sits in a dropdown content control.
fn dropdown_cell(value: &str) -> String {
    format!(
        "<w:tc><w:sdt><w:sdtPr><w:dropDownList/></w:sdtPr><w:sdtContent>{}</w:sdtContent></w:sdt></w:tc>",
        p(value)
    )
}

fn row(cells: &[String]) -> String {
    format!("<w:tr>{}</w:tr>", cells.concat())
}

fn tbl(rows: &[String]) -> String {
    format!("<w:tbl><w:tblPr/>{}</w:tbl>", rows.concat())
}

fn minutes_body() -> String {
    [
        heading4("プロジェクト名：Billing"),
        p("第3回 定例会議 議事録"),
        p("日時：2024/05/01 10:00"),
        p("参加者：山田、佐藤"),
        p("━━━━━━━━━━"),
        p("1. 進捗確認"),
        tbl(&[
            row(&[cell("タスク名/ID"), cell("変更事項"), cell("変更内容")]),
            row(&[cell("CSV出力/TODO-3"), dropdown_cell("完了"), cell("")]),
        ]),
        p("2. 新規議題"),
        p("課題：[請求書の再発行]"),
        tbl(&[
            row(&[cell("内容"), cell("再発行の手順がない")]),
            row(&[cell("対応方針"), cell("API化する")]),
        ]),
        tbl(&[
            row(&[cell("ToDoタイトル"), cell("再発行APIの追加")]),
            row(&[cell("担当者"), cell("佐藤")]),
            row(&[cell("判定対象"), cell("src/invoices/*.ts")]),
        ]),
    ]
    .concat()
}

#[test]
fn test_docx_file_converts_to_markdown() {
    let dir = TempDir::new().unwrap();
    let path = write_docx(&dir, "minutes.docx", &minutes_body());

    let doc = DocxDocument::open(&path).unwrap();
    let markdown = docx_to_markdown(&doc);

    assert!(markdown.starts_with("# プロジェクト情報\n- プロジェクト名: Billing\n"));
    assert!(markdown.contains("# 第3回 定例会議 議事録\n**日時**: 2024/05/01 10:00\n"));
    assert!(markdown.contains("**ToDo**: CSV出力 [既存ToDo: TODO-3を更新]\n**完了**"));
    assert!(markdown.contains("### 課題: 請求書の再発行\n**課題内容**: 再発行の手順がない\n**対応方針**: API化する"));
    assert!(markdown.contains("**ToDo**: 再発行APIの追加\n- 担当者: 佐藤\n- 判定対象: src/invoices/*.ts"));
}

#[test]
fn test_docx_minutes_load_as_markdown() {
    let dir = TempDir::new().unwrap();
    let path = write_docx(&dir, "minutes.DOCX", &minutes_body());

    let source = MinutesSource::load(&path).unwrap();

    assert_eq!(source.format, SourceFormat::Docx);
    assert!(source.content.contains("[既存ToDo: TODO-3を更新]"));
}

#[test]
fn test_document_without_rule_yields_header_only() {
    let dir = TempDir::new().unwrap();
    let path = write_docx(
        &dir,
        "draft.docx",
        &[
            p("週次メモ"),
            tbl(&[row(&[cell("ToDoタイトル"), cell("X")]), row(&[cell("担当者"), cell("山田")])]),
        ]
        .concat(),
    );

    let markdown = docx_to_markdown(&DocxDocument::open(&path).unwrap());
    assert!(markdown.starts_with("# 議事録\n---\n"));
    assert!(!markdown.contains("**ToDo**"));
}

#[test]
fn test_not_a_zip_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.docx");
    std::fs::write(&path, b"plain text, not a package").unwrap();

    assert!(DocxDocument::open(&path).is_err());
    assert!(MinutesSource::load(&path).is_err());
}
