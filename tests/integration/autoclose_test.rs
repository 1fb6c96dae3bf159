//! Auto-Close Integration Tests
//!
//! Full pipeline runs: commit -> phases -> merge -> persisted tickets.

use std::sync::Arc;

use todo_tracker::services::autoclose::{AutoCloseConfig, AutoClosePipeline};
use todo_tracker::services::CommitSource;
use todo_tracker::storage::{DocumentStore, TicketRepository, TODOS_COLLECTION};
use todo_tracker_core::{CommitInfo, MatchPhase, Ticket, TicketStatus};
use todo_tracker_llm::{LlmError, LlmProvider};

use crate::support::{
    file_section, seed_project, seed_tickets, store, ScriptedProvider, StaticCommitSource,
};

// ============================================================================
// Helpers
// ============================================================================

fn config() -> AutoCloseConfig {
    AutoCloseConfig {
        ai_analysis_enabled: true,
        phase2_ai_enabled: true,
        ai_confidence_threshold: 0.7,
        phase2_confidence_threshold: 0.5,
        github_repository: None,
    }
}

fn tickets() -> Vec<Ticket> {
    vec![
        Ticket::new("TODO-1", "Fix login redirect"),
        Ticket::new("TODO-2", "CSV export").with_target_file("src/export/*.ts"),
        Ticket::new("TODO-3", "Retry failed webhooks")
            .with_description("Webhook deliveries should retry with backoff"),
        Ticket::new("TODO-4", "Dark mode"),
    ]
}

fn commit(message: &str, diff: String, files: &[&str]) -> CommitInfo {
    CommitInfo {
        hash: "4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string(),
        message: message.to_string(),
        author: "Dev".to_string(),
        timestamp: None,
        changed_files: files.iter().map(|f| f.to_string()).collect(),
        diff,
    }
}

fn standard_commit() -> (CommitInfo, String) {
    let csv = file_section("src/export/csv.ts", &["export function toCsv(rows) {}"]);
    let webhook = file_section(
        "src/webhooks/deliver.ts",
        &["for (let attempt = 0; attempt < 5; attempt++) { await backoff(attempt); }"],
    );
    let diff = format!("{}{}", csv, webhook);
    (
        commit(
            "Export and webhook work\n\nCloses TODO-1",
            diff,
            &["src/export/csv.ts", "src/webhooks/deliver.ts"],
        ),
        csv,
    )
}

fn pipeline(
    config: AutoCloseConfig,
    store: &DocumentStore,
    source: StaticCommitSource,
    provider: Option<Arc<ScriptedProvider>>,
) -> AutoClosePipeline {
    let source: Arc<dyn CommitSource> = Arc::new(source);
    let provider = provider.map(|p| p as Arc<dyn LlmProvider>);
    AutoClosePipeline::new(config, store.clone(), source, provider)
}

fn ticket(store: &DocumentStore, id: &str) -> Ticket {
    TicketRepository::new(store.clone()).get(id).unwrap().unwrap()
}

// ============================================================================
// Phase precedence
// ============================================================================

#[tokio::test]
async fn test_three_phases_merge_and_persist() {
    let store = store();
    seed_tickets(&store, &tickets());
    let (commit, csv) = standard_commit();
    let source = StaticCommitSource::new(commit).with_file_diff("src/export/csv.ts", &csv);
    let provider = Arc::new(
        ScriptedProvider::new()
            .reply(r#"{"confidence": 0.85, "reasoning": "Adds the CSV serializer"}"#)
            .reply(
                r#"{"matches": [{"todoId": "TODO-3", "confidence": 0.9, "reasoning": "Adds retry with backoff"}]}"#,
            ),
    );

    let summary = pipeline(config(), &store, source, Some(provider.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.outcomes.len(), 3);

    let t1 = ticket(&store, "TODO-1");
    assert_eq!(t1.status, TicketStatus::Closed);
    assert!(t1.close_candidate);
    assert!(t1.closed_at.is_some());
    assert_eq!(t1.history.len(), 1);
    assert_eq!(t1.history[0].phase, MatchPhase::CommitMessage);
    assert_eq!(t1.history[0].action, "auto_closed");

    let t2 = ticket(&store, "TODO-2");
    assert_eq!(t2.status, TicketStatus::ReviewPending);
    assert_eq!(t2.history[0].phase, MatchPhase::FileName);
    assert_eq!(t2.ai_analysis.as_ref().map(|a| a.confidence), Some(0.85));
    assert!(t2.closed_at.is_none());

    let t3 = ticket(&store, "TODO-3");
    assert_eq!(t3.status, TicketStatus::ReviewPending);
    assert_eq!(t3.history[0].phase, MatchPhase::DiffAnalysis);
    assert_eq!(t3.history[0].commit_message, "Export and webhook work\n\nCloses TODO-1");

    let t4 = ticket(&store, "TODO-4");
    assert_eq!(t4.status, TicketStatus::Open);
    assert!(!t4.close_candidate);
    assert!(t4.history.is_empty());

    // The diff call only saw tickets without a result
    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].user.contains("TODO-3"));
    assert!(calls[1].user.contains("TODO-4"));
    assert!(!calls[1].user.contains("ID: TODO-1"));
    assert!(!calls[1].user.contains("ID: TODO-2"));
}

#[tokio::test]
async fn test_message_match_is_never_reprocessed() {
    let store = store();
    seed_tickets(
        &store,
        &[Ticket::new("TODO-2", "CSV export").with_target_file("src/export/*.ts")],
    );
    let csv = file_section("src/export/csv.ts", &["export function toCsv() {}"]);
    let source = StaticCommitSource::new(commit("Fixes TODO-2", csv.clone(), &["src/export/csv.ts"]))
        .with_file_diff("src/export/csv.ts", &csv);
    let provider = Arc::new(ScriptedProvider::new());

    let summary = pipeline(config(), &store, source, Some(provider.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.outcomes[0].result.phase, MatchPhase::CommitMessage);
    assert!(provider.calls().is_empty());
    assert_eq!(ticket(&store, "TODO-2").history.len(), 1);
}

#[tokio::test]
async fn test_no_provider_accepts_filename_matches_and_skips_diff() {
    let store = store();
    seed_tickets(&store, &tickets());
    let (commit, _) = standard_commit();

    let summary = pipeline(config(), &store, StaticCommitSource::new(commit), None)
        .run()
        .await
        .unwrap();

    let ids: Vec<&str> = summary
        .outcomes
        .iter()
        .map(|o| o.result.ticket_id.as_str())
        .collect();
    assert_eq!(ids, vec!["TODO-1", "TODO-2"]);
    assert!(ticket(&store, "TODO-2").ai_analysis.is_none());
    assert_eq!(ticket(&store, "TODO-3").status, TicketStatus::Open);
}

#[tokio::test]
async fn test_phase2_gate_disabled_accepts_without_model() {
    let store = store();
    seed_tickets(&store, &tickets());
    let (commit, _) = standard_commit();
    let provider = Arc::new(ScriptedProvider::new().reply(r#"{"matches": []}"#));
    let config = AutoCloseConfig {
        phase2_ai_enabled: false,
        ..config()
    };

    let summary = pipeline(config, &store, StaticCommitSource::new(commit), Some(provider.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    // Only the diff analysis consulted the model
    assert_eq!(provider.calls().len(), 1);
    assert!(provider.calls()[0].user.contains("TODO-3"));
}

#[tokio::test]
async fn test_phase2_rejection_leaves_ticket_for_diff_analysis() {
    let store = store();
    seed_tickets(&store, &tickets());
    let (commit, csv) = standard_commit();
    let source = StaticCommitSource::new(commit).with_file_diff("src/export/csv.ts", &csv);
    let provider = Arc::new(
        ScriptedProvider::new()
            .fail(LlmError::NetworkError {
                message: "timed out".to_string(),
            })
            .reply(
                r#"{"matches": [{"todoId": "TODO-2", "confidence": 0.75, "reasoning": "CSV writer added"}]}"#,
            ),
    );

    let summary = pipeline(config(), &store, source, Some(provider))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.exit_code(), 0);
    let t2 = ticket(&store, "TODO-2");
    assert_eq!(t2.history.len(), 1);
    assert_eq!(t2.history[0].phase, MatchPhase::DiffAnalysis);
}

// ============================================================================
// Guardrails and degradation
// ============================================================================

#[tokio::test]
async fn test_secret_aborts_diff_analysis_but_keeps_earlier_phases() {
    let store = store();
    seed_tickets(&store, &tickets());
    let leaked = file_section(
        "src/webhooks/client.ts",
        &["const token = \"sk-proj-abcdefghijklmnopqrstuvwxyz012345\";"],
    );
    let source = StaticCommitSource::new(commit(
        "Closes TODO-1",
        leaked,
        &["src/webhooks/client.ts"],
    ));
    let provider = Arc::new(ScriptedProvider::new().reply(r#"{"matches": []}"#));

    let summary = pipeline(config(), &store, source, Some(provider.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(ticket(&store, "TODO-1").status, TicketStatus::Closed);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_secret_in_commit_message_aborts_diff_analysis() {
    let store = store();
    seed_tickets(&store, &tickets());
    let (clean, _) = standard_commit();
    let source = StaticCommitSource::new(CommitInfo {
        message: "Closes TODO-1\n\nrotated key sk-proj-abcdefghijklmnopqrstuvwxyz012345".to_string(),
        ..clean
    });
    let provider = Arc::new(ScriptedProvider::new().reply(
        r#"{"matches": [{"todoId": "TODO-3", "confidence": 0.9, "reasoning": "retries"}]}"#,
    ));
    let config = AutoCloseConfig {
        phase2_ai_enabled: false,
        ..config()
    };

    let summary = pipeline(config, &store, source, Some(provider.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.exit_code(), 0);
    assert!(provider.calls().is_empty());
    assert_eq!(ticket(&store, "TODO-1").status, TicketStatus::Closed);
    assert_eq!(ticket(&store, "TODO-2").status, TicketStatus::ReviewPending);
    assert_eq!(ticket(&store, "TODO-3").status, TicketStatus::Open);
}

#[tokio::test]
async fn test_oversized_diff_is_truncated_before_sending() {
    let store = store();
    seed_tickets(&store, &[Ticket::new("TODO-3", "Retry failed webhooks")]);
    let long_line = "x".repeat(200);
    let lines: Vec<&str> = std::iter::repeat(long_line.as_str()).take(400).collect();
    let diff = file_section("src/webhooks/deliver.ts", &lines);
    assert!(diff.chars().count() > 30_000);
    let provider = Arc::new(ScriptedProvider::new().reply(r#"{"matches": []}"#));

    pipeline(
        config(),
        &store,
        StaticCommitSource::new(commit("Webhook work", diff, &["src/webhooks/deliver.ts"])),
        Some(provider.clone()),
    )
    .run()
    .await
    .unwrap();

    let prompt = &provider.calls()[0].user;
    let sent_x = prompt.matches('x').count();
    assert!(sent_x < 30_000);
    assert!(sent_x > 29_000);
}

#[tokio::test]
async fn test_diff_analysis_disabled_makes_no_call() {
    let store = store();
    seed_tickets(&store, &tickets());
    let (commit, _) = standard_commit();
    let provider = Arc::new(ScriptedProvider::new());
    let config = AutoCloseConfig {
        ai_analysis_enabled: false,
        phase2_ai_enabled: false,
        ..config()
    };

    let summary = pipeline(config, &store, StaticCommitSource::new(commit), Some(provider.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert!(provider.calls().is_empty());
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_missing_ticket_fails_only_that_ticket() {
    let store = store();
    seed_tickets(&store, &tickets());
    let source = StaticCommitSource::new(commit(
        "Closes TODO-1, TODO-77",
        String::new(),
        &[],
    ));

    let summary = pipeline(config(), &store, source, None).run().await.unwrap();

    assert_eq!(summary.exit_code(), 1);
    assert_eq!(summary.persisted_count(), 1);
    let failed: Vec<_> = summary.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].result.ticket_id, "TODO-77");
    assert_eq!(ticket(&store, "TODO-1").status, TicketStatus::Closed);
    assert!(summary.render().contains("FAILED"));
}

#[tokio::test]
async fn test_marking_twice_appends_history() {
    let store = store();
    seed_tickets(&store, &tickets());
    let make_source = || StaticCommitSource::new(commit("Done TODO-1", String::new(), &[]));

    pipeline(config(), &store, make_source(), None).run().await.unwrap();
    pipeline(config(), &store, make_source(), None).run().await.unwrap();

    assert_eq!(store.count(TODOS_COLLECTION).unwrap(), 4);
    let t1 = ticket(&store, "TODO-1");
    assert!(t1.close_candidate);
    assert_eq!(t1.history.len(), 2);
    assert!(t1.history[0].timestamp <= t1.history[1].timestamp);
}

#[tokio::test]
async fn test_unrelated_stored_fields_survive() {
    let store = store();
    store
        .set(
            TODOS_COLLECTION,
            "TODO-1",
            &serde_json::json!({
                "title": "Fix login redirect",
                "status": "open",
                "assignee": "sato",
                "labels": ["auth"]
            }),
        )
        .unwrap();

    pipeline(
        config(),
        &store,
        StaticCommitSource::new(commit("Resolves TODO-1", String::new(), &[])),
        None,
    )
    .run()
    .await
    .unwrap();

    let data = store.get(TODOS_COLLECTION, "TODO-1").unwrap().unwrap();
    assert_eq!(data["assignee"], "sato");
    assert_eq!(data["labels"][0], "auth");
    assert_eq!(data["status"], "closed");
    assert_eq!(data["closeCandidate"], true);
}

#[tokio::test]
async fn test_stored_fields_outside_ticket_schema_do_not_fail_the_write() {
    let store = store();
    store
        .set(
            TODOS_COLLECTION,
            "TODO-1",
            &serde_json::json!({
                "title": "Fix login redirect",
                "status": "open",
                "description": null
            }),
        )
        .unwrap();

    let summary = pipeline(
        config(),
        &store,
        StaticCommitSource::new(commit("Closes TODO-1", String::new(), &[])),
        None,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.persisted_count(), 1);
    let data = store.get(TODOS_COLLECTION, "TODO-1").unwrap().unwrap();
    assert_eq!(data["status"], "closed");
    assert_eq!(data["history"].as_array().unwrap().len(), 1);
    assert!(data["description"].is_null());
}

// ============================================================================
// Scoping and setup
// ============================================================================

#[tokio::test]
async fn test_repository_scopes_candidates_to_project() {
    let store = store();
    seed_project(&store, "p-billing", "Billing", &["acme/billing-api"]);
    seed_tickets(
        &store,
        &[
            Ticket::new("TODO-10", "CSV export")
                .with_target_file("src/export/*.ts")
                .with_project("p-billing"),
            Ticket::new("TODO-11", "CSV export elsewhere")
                .with_target_file("src/export/*.ts")
                .with_project("p-other"),
        ],
    );
    let config = AutoCloseConfig {
        github_repository: Some("acme/billing-api".to_string()),
        ..config()
    };
    let source = StaticCommitSource::new(commit(
        "Export",
        file_section("src/export/csv.ts", &["x"]),
        &["src/export/csv.ts"],
    ));

    let summary = pipeline(config, &store, source, None).run().await.unwrap();

    assert_eq!(summary.candidate_count, 1);
    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.outcomes[0].result.ticket_id, "TODO-10");
}

#[tokio::test]
async fn test_unlinked_repository_has_no_candidates() {
    let store = store();
    seed_project(&store, "p-billing", "Billing", &["acme/billing-api"]);
    seed_tickets(&store, &tickets());
    let config = AutoCloseConfig {
        github_repository: Some("acme/unknown".to_string()),
        ..config()
    };
    let (commit, _) = standard_commit();

    let summary = pipeline(config, &store, StaticCommitSource::new(commit), None)
        .run()
        .await
        .unwrap();

    // The commit message still closes its ticket
    assert_eq!(summary.candidate_count, 0);
    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.outcomes[0].result.ticket_id, "TODO-1");
}

#[tokio::test]
async fn test_missing_commit_is_fatal() {
    let store = store();
    let result = pipeline(config(), &store, StaticCommitSource::empty(), None)
        .run()
        .await;
    assert!(result.is_err());
}
