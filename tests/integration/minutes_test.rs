//! Minutes Analyzer Integration Tests

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;
use todo_tracker::services::minutes::{MinutesAnalyzer, MinutesRequest, MAX_MINUTES_BYTES};
use todo_tracker::storage::{
    DocumentStore, PendingMinutesRepository, PENDING_MINUTES_COLLECTION, TODOS_COLLECTION,
};
use todo_tracker_core::{ApprovalStatus, TicketStatus};
use todo_tracker_llm::LlmError;

use crate::support::{seed_project, store, ScriptedProvider};

const MINUTES: &str = "\
# プロジェクト情報
- プロジェクト名: “Project A”

# 第12回 定例会議 議事録
**日時**: 2024/05/01
---

## 1. 進捗確認

### 課題: 検索遅延 [既存課題: ISSUE-7]
**最新状況**: ベンダー回答待ち

**ToDo**: CSV出力 [既存ToDo: TODO-3を更新]
**完了**

---

## 2. 新規議題

### 課題: 請求書の再発行
**課題内容**: 再発行の手順がない
**担当者**: 佐藤

**ToDo**: 再発行APIの追加
- 担当者: 佐藤
- 期日: 2024-06-01
- 判定対象: src/invoices/reissue.ts
";

const EXTRACTION: &str = r#"{
  "projectName": "“Project A”",
  "issues": [
    {"existingId": "ISSUE-7", "latestStatus": "ベンダー回答待ち"},
    {"title": "請求書の再発行", "content": "再発行の手順がない", "assignee": "佐藤"}
  ],
  "todos": [
    {"existingId": "TODO-3", "status": "closed"},
    {"title": "再発行APIの追加", "assignee": "佐藤", "dueDate": "2024-06-01",
     "targetFile": "src/invoices/reissue.ts", "issueTitle": "請求書の再発行"}
  ]
}"#;

fn minutes_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn analyzer(store: &DocumentStore, provider: &Arc<ScriptedProvider>) -> MinutesAnalyzer {
    MinutesAnalyzer::new(provider.clone(), store.clone())
}

fn request(file: &NamedTempFile) -> MinutesRequest {
    MinutesRequest {
        file: file.path().to_path_buf(),
        project_id: None,
        commit_hash: Some("9fceb02".to_string()),
        pushed_by: Some("sato".to_string()),
    }
}

#[tokio::test]
async fn test_extraction_stored_as_pending_record() {
    let store = store();
    seed_project(&store, "p-a", "\"Project A\"", &[]);
    let provider = Arc::new(ScriptedProvider::new().reply(EXTRACTION));
    let file = minutes_file(MINUTES);

    let outcome = analyzer(&store, &provider)
        .analyze(&request(&file))
        .await
        .unwrap();

    assert!(outcome.dropped.is_empty());
    let record = PendingMinutesRepository::new(store.clone())
        .get(&outcome.record_id)
        .unwrap()
        .unwrap();
    assert_eq!(record.status, ApprovalStatus::Pending);
    assert_eq!(record.project_id.as_deref(), Some("p-a"));
    assert_eq!(record.source_format, "markdown");
    assert_eq!(record.commit_hash.as_deref(), Some("9fceb02"));
    assert_eq!(record.pushed_by.as_deref(), Some("sato"));
    assert_eq!(record.model, "scripted-model");
    assert_eq!(record.content_digest.len(), 64);
    assert_eq!(record.extracted.issues.len(), 2);
    assert_eq!(record.extracted.todos[0].status, Some(TicketStatus::Closed));

    // Nothing is written to the tickets themselves
    assert_eq!(store.count(TODOS_COLLECTION).unwrap(), 0);

    // The minutes went to the model inside the data markers
    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].user.contains("[既存課題: ISSUE-7]"));
    assert!(calls[0].user.contains("<<<MINUTES_START>>>"));
    assert!(calls[0].system.as_deref().unwrap_or("").contains("existingId"));
}

#[tokio::test]
async fn test_update_records_keep_only_changed_fields() {
    let store = store();
    let provider = Arc::new(ScriptedProvider::new().reply(
        r#"{"projectName": null,
            "issues": [{"existingId": "ISSUE-7", "latestStatus": "ベンダー回答待ち", "strategy": "", "assignee": null}],
            "todos": []}"#,
    ));
    let file = minutes_file(MINUTES);

    let outcome = analyzer(&store, &provider)
        .analyze(&request(&file))
        .await
        .unwrap();

    let raw = store
        .get(PENDING_MINUTES_COLLECTION, &outcome.record_id)
        .unwrap()
        .unwrap();
    assert_eq!(
        raw["extracted"]["issues"][0],
        serde_json::json!({"existingId": "ISSUE-7", "latestStatus": "ベンダー回答待ち"})
    );
}

#[tokio::test]
async fn test_update_records_drop_titles_from_the_reply() {
    let store = store();
    let provider = Arc::new(ScriptedProvider::new().reply(
        r#"{"projectName": null,
            "issues": [{"existingId": "ISSUE-7", "title": "検索遅延", "latestStatus": "ベンダー回答待ち"}],
            "todos": [
              {"existingId": "TODO-3", "title": "CSV出力", "issueTitle": "検索遅延", "status": "closed"},
              {"title": "再発行APIの追加", "issueTitle": "請求書の再発行"}
            ]}"#,
    ));
    let file = minutes_file(MINUTES);

    let outcome = analyzer(&store, &provider)
        .analyze(&request(&file))
        .await
        .unwrap();

    let raw = store
        .get(PENDING_MINUTES_COLLECTION, &outcome.record_id)
        .unwrap()
        .unwrap();
    assert_eq!(
        raw["extracted"]["issues"][0],
        serde_json::json!({"existingId": "ISSUE-7", "latestStatus": "ベンダー回答待ち"})
    );
    assert_eq!(
        raw["extracted"]["todos"][0],
        serde_json::json!({"existingId": "TODO-3", "status": "closed"})
    );
    assert_eq!(raw["extracted"]["todos"][1]["issueTitle"], "請求書の再発行");
}

#[tokio::test]
async fn test_unresolved_project_stays_unassigned() {
    let store = store();
    seed_project(&store, "p-b", "Project B", &[]);
    let provider = Arc::new(ScriptedProvider::new().reply(EXTRACTION));
    let file = minutes_file(MINUTES);

    let outcome = analyzer(&store, &provider)
        .analyze(&request(&file))
        .await
        .unwrap();

    assert_eq!(outcome.record.project_id, None);
    assert_eq!(outcome.record.project_name.as_deref(), Some("“Project A”"));
}

#[tokio::test]
async fn test_explicit_project_id_wins() {
    let store = store();
    seed_project(&store, "p-a", "\"Project A\"", &[]);
    let provider = Arc::new(ScriptedProvider::new().reply(EXTRACTION));
    let file = minutes_file(MINUTES);
    let request = MinutesRequest {
        project_id: Some("p-manual".to_string()),
        ..request(&file)
    };

    let outcome = analyzer(&store, &provider).analyze(&request).await.unwrap();
    assert_eq!(outcome.record.project_id.as_deref(), Some("p-manual"));
}

#[tokio::test]
async fn test_malformed_records_are_dropped() {
    let store = store();
    let provider = Arc::new(ScriptedProvider::new().reply(
        r#"{"issues": [{"content": "no title"}], "todos": [{"existingId": "TASK 4", "status": "closed"}]}"#,
    ));
    let file = minutes_file(MINUTES);

    let outcome = analyzer(&store, &provider)
        .analyze(&request(&file))
        .await
        .unwrap();

    assert_eq!(outcome.dropped.len(), 2);
    assert!(outcome.record.extracted.is_empty());
    assert_eq!(store.count(PENDING_MINUTES_COLLECTION).unwrap(), 1);
}

#[tokio::test]
async fn test_schema_violation_writes_nothing() {
    let store = store();
    let provider = Arc::new(ScriptedProvider::new().reply(r#"{"items": []}"#));
    let file = minutes_file(MINUTES);

    let result = analyzer(&store, &provider).analyze(&request(&file)).await;

    assert!(result.is_err());
    assert_eq!(provider.calls().len(), 1);
    assert_eq!(store.count(PENDING_MINUTES_COLLECTION).unwrap(), 0);
}

#[tokio::test]
async fn test_model_failure_writes_nothing() {
    let store = store();
    let provider = Arc::new(ScriptedProvider::new().fail(LlmError::AuthenticationFailed {
        message: "openai: Invalid API key".to_string(),
    }));
    let file = minutes_file(MINUTES);

    assert!(analyzer(&store, &provider)
        .analyze(&request(&file))
        .await
        .is_err());
    assert_eq!(store.count(PENDING_MINUTES_COLLECTION).unwrap(), 0);
}

#[tokio::test]
async fn test_oversized_file_rejected_before_model_call() {
    let store = store();
    let provider = Arc::new(ScriptedProvider::new().reply(EXTRACTION));
    let file = minutes_file(&"あ".repeat(MAX_MINUTES_BYTES / 3 + 1));

    assert!(analyzer(&store, &provider)
        .analyze(&request(&file))
        .await
        .is_err());
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_missing_file_is_error() {
    let store = store();
    let provider = Arc::new(ScriptedProvider::new().reply(EXTRACTION));
    let request = MinutesRequest {
        file: "/nonexistent/minutes.md".into(),
        ..Default::default()
    };

    assert!(analyzer(&store, &provider).analyze(&request).await.is_err());
    assert!(provider.calls().is_empty());
}
