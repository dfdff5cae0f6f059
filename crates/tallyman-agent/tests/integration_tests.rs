//! End-to-end coordinator tests over real (file-backed) collaborators

use chrono::NaiveDate;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tallyman_agent::{Coordinator, JsonMailbox, StoredMessage, StoredThread};
use tallyman_domain::traits::{Notifier, RecordStore};
use tallyman_domain::{MailboxQuery, RunSummary, TransactionRecord};
use tallyman_extractor::{CategoryRules, ExtractorConfig, RecordExtractor};
use tallyman_llm::MockProvider;
use tallyman_pipeline::{IngestionPipeline, PipelineConfig};
use tallyman_store::CsvStore;

const SHELL_JSON: &str = r#"{"date":"2024-01-05","merchant":"SHELL","amount":32.10,"category":"Gas","description":"fuel"}"#;

/// Notifier double that records every delivered summary
#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<RunSummary>>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<RunSummary> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    type Error = std::convert::Infallible;

    fn notify(&self, summary: &RunSummary) -> Result<(), Self::Error> {
        self.sent.lock().unwrap().push(*summary);
        Ok(())
    }
}

fn message(id: &str, subject: &str) -> StoredMessage {
    StoredMessage {
        id: id.to_string(),
        from: "alerts@capitalone.com".to_string(),
        subject: subject.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        body: format!("purchase notification {}", id),
    }
}

fn thread(id: &str, messages: Vec<StoredMessage>) -> StoredThread {
    StoredThread {
        id: id.to_string(),
        labels: Default::default(),
        messages,
    }
}

fn write_mailbox(path: &Path, threads: Vec<StoredThread>) {
    let snapshot = JsonMailbox::new(threads);
    std::fs::write(path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
}

fn query() -> MailboxQuery {
    MailboxQuery {
        from: "capitalone".to_string(),
        subject_any: vec![
            "transaction".to_string(),
            "withdrawal notice".to_string(),
            "You sent money with Zelle".to_string(),
        ],
        exclude_text: Some("CAPITAL ONE has initiated".to_string()),
        without_label: "processed".to_string(),
        limit: 15,
    }
}

fn coordinator(
    mailbox: JsonMailbox,
    store: CsvStore,
    provider: MockProvider,
    notifier: RecordingNotifier,
) -> Coordinator<JsonMailbox, CsvStore, MockProvider, RecordingNotifier> {
    let extractor = RecordExtractor::new(
        provider,
        CategoryRules::default(),
        ExtractorConfig::default(),
    );
    Coordinator::new(
        mailbox,
        store,
        extractor,
        notifier,
        IngestionPipeline::new(PipelineConfig { throttle_secs: 0 }),
        query(),
        "processed",
    )
}

#[test]
fn test_end_to_end_new_and_duplicate_threads() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox_path = dir.path().join("mailbox.json");

    // Thread A carries a new message; thread B's only message is already
    // persisted from an earlier run
    write_mailbox(
        &mailbox_path,
        vec![
            thread("ta", vec![message("m-new", "transaction alert")]),
            thread("tb", vec![message("m-old", "transaction alert")]),
        ],
    );

    let mut store = CsvStore::open(dir.path(), "Expenses").unwrap();
    store
        .append(&TransactionRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            merchant: "TARGET".to_string(),
            category: "General Shopping".to_string(),
            amount: 20.0,
            description: "earlier run".to_string(),
            source_message_id: "m-old".to_string(),
        })
        .unwrap();

    let provider = MockProvider::new(SHELL_JSON);
    let probe = provider.clone();
    let notifier = RecordingNotifier::default();
    let notifier_probe = notifier.clone();

    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();
    let summary = coordinator(mailbox, store, provider, notifier)
        .execute()
        .unwrap();

    // Exactly one extraction, exactly one append
    assert_eq!(summary.processed_count, 1);
    assert_eq!(summary.failed_threads, 0);
    assert_eq!(probe.call_count(), 1);

    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    let ids = store.existing_source_ids().unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"m-new".to_string()));

    // Thread B is fully ingested too: its only message was a no-op skip
    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();
    assert!(mailbox.thread_has_label("ta", "processed"));
    assert!(mailbox.thread_has_label("tb", "processed"));

    assert_eq!(notifier_probe.sent().len(), 1);
    assert_eq!(notifier_probe.sent()[0].processed_count, 1);
}

#[test]
fn test_partial_failure_leaves_thread_retryable() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox_path = dir.path().join("mailbox.json");

    write_mailbox(
        &mailbox_path,
        vec![thread(
            "t1",
            vec![
                message("m1", "transaction alert"),
                message("m2", "transaction alert"),
                message("m3", "transaction alert"),
            ],
        )],
    );

    let provider = MockProvider::new(SHELL_JSON);
    let probe = provider.clone();
    provider.push_response(SHELL_JSON);
    provider.push_transport_error("HTTP 500");

    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    let notifier = RecordingNotifier::default();
    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();

    let summary = coordinator(mailbox, store, provider, notifier)
        .execute()
        .unwrap();

    // m1 persisted, m2 failed, m3 never attempted
    assert_eq!(summary.processed_count, 1);
    assert_eq!(summary.failed_threads, 1);
    assert_eq!(probe.call_count(), 2);

    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    assert_eq!(store.existing_source_ids().unwrap(), vec!["m1"]);

    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();
    assert!(!mailbox.thread_has_label("t1", "processed"));
}

#[test]
fn test_retry_run_ingests_only_the_remainder() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox_path = dir.path().join("mailbox.json");

    write_mailbox(
        &mailbox_path,
        vec![thread(
            "t1",
            vec![
                message("m1", "transaction alert"),
                message("m2", "transaction alert"),
            ],
        )],
    );

    // First run: m1 succeeds, m2 fails; thread stays a candidate
    let provider = MockProvider::new(SHELL_JSON);
    provider.push_response(SHELL_JSON);
    provider.push_transport_error("HTTP 500");
    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();
    coordinator(mailbox, store, provider, RecordingNotifier::default())
        .execute()
        .unwrap();

    // Second run: the ledger (reloaded from the table) excludes m1, so
    // only m2 is extracted - no re-extraction, no duplication
    let provider = MockProvider::new(SHELL_JSON);
    let probe = provider.clone();
    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();
    let summary = coordinator(mailbox, store, provider, RecordingNotifier::default())
        .execute()
        .unwrap();

    assert_eq!(summary.processed_count, 1);
    assert_eq!(probe.call_count(), 1);

    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    let mut ids = store.existing_source_ids().unwrap();
    ids.sort();
    assert_eq!(ids, vec!["m1", "m2"]);

    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();
    assert!(mailbox.thread_has_label("t1", "processed"));
}

#[test]
fn test_labeled_threads_stop_being_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox_path = dir.path().join("mailbox.json");

    write_mailbox(
        &mailbox_path,
        vec![thread("t1", vec![message("m1", "transaction alert")])],
    );

    let run = |provider: MockProvider| {
        let store = CsvStore::open(dir.path(), "Expenses").unwrap();
        let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();
        coordinator(mailbox, store, provider, RecordingNotifier::default())
            .execute()
            .unwrap()
    };

    let first = run(MockProvider::new(SHELL_JSON));
    assert_eq!(first.processed_count, 1);

    // The label filter now hides the thread entirely
    let provider = MockProvider::new(SHELL_JSON);
    let probe = provider.clone();
    let second = run(provider);
    assert_eq!(second.processed_count, 0);
    assert_eq!(probe.call_count(), 0);

    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    assert_eq!(store.existing_source_ids().unwrap().len(), 1);
}

#[test]
fn test_empty_mailbox_is_silent_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox_path = dir.path().join("mailbox.json");
    write_mailbox(&mailbox_path, vec![]);

    let notifier = RecordingNotifier::default();
    let notifier_probe = notifier.clone();
    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();

    let summary = coordinator(mailbox, store, MockProvider::new(SHELL_JSON), notifier)
        .execute()
        .unwrap();

    assert_eq!(summary, RunSummary::default());
    assert!(notifier_probe.sent().is_empty());
    assert!(!dir.path().join("Expenses.csv").exists());
}

#[test]
fn test_persisted_table_ends_up_date_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox_path = dir.path().join("mailbox.json");

    write_mailbox(
        &mailbox_path,
        vec![thread(
            "t1",
            vec![
                message("m1", "transaction alert"),
                message("m2", "transaction alert"),
            ],
        )],
    );

    let provider = MockProvider::default();
    provider.push_response(
        r#"{"date":"2024-05-20","merchant":"TARGET","amount":5.0,"category":"General Shopping","description":"late"}"#,
    );
    provider.push_response(
        r#"{"date":"2024-02-02","merchant":"SHELL","amount":7.0,"category":"Gas","description":"early"}"#,
    );

    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    let mailbox = JsonMailbox::from_file(&mailbox_path).unwrap();
    coordinator(mailbox, store, provider, RecordingNotifier::default())
        .execute()
        .unwrap();

    let store = CsvStore::open(dir.path(), "Expenses").unwrap();
    let dates: Vec<NaiveDate> = store.read_all().unwrap().iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
        ]
    );
}
