//! File-mediated pipeline properties: the poller and notifier sharing
//! nothing but the order log and its cursor.

use std::sync::Arc;

use monitor::testing::{AcceptAll, ContainsFilter, MockMessenger, MockPage, PlainExtractor, PlainFormatter};
use monitor::{
    Cursor, DedupStore, Notifier, NotifierConfig, OrderLog, Poller, PollerConfig, RawListing,
    Record,
};

fn listing(id: &str, title: &str) -> RawListing {
    RawListing::new().with_attr("id", id).with_text("title", title)
}

fn notifier(
    dir: &tempfile::TempDir,
    messenger: MockMessenger,
) -> Notifier<MockMessenger, PlainFormatter> {
    Notifier::new(
        OrderLog::new(dir.path().join("orders.jsonl")),
        Cursor::new(dir.path().join("notify_state.json")),
        messenger,
        PlainFormatter,
        NotifierConfig::default(),
    )
}

/// Two cycles presenting A(id=1, matching), B(id=2, plain), C(id=1 again)
/// yield one log entry for id 1, no memory of id 2, and no extra writes for
/// the repeat.
#[tokio::test]
async fn scrape_filter_dedup_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new()
        .with_batch(vec![
            listing("1", "chat-bot helper"),
            listing("2", "plain job"),
        ])
        .with_batch(vec![listing("1", "chat-bot helper")]);

    let dedup = DedupStore::load(dir.path().join("seen_ids.json")).unwrap();
    let log = OrderLog::new(dir.path().join("orders.jsonl"));
    let mut poller = Poller::new(
        page,
        PlainExtractor,
        ContainsFilter::new("bot"),
        dedup,
        log.clone(),
        PollerConfig::new("https://board.example/orders", "a.card"),
    );

    poller.cycle().await.unwrap();
    poller.cycle().await.unwrap();

    let (records, _) = log.read_from(0).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "1");

    let seen = DedupStore::load(dir.path().join("seen_ids.json")).unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen.contains("1"));
    assert!(!seen.contains("2"));
}

#[tokio::test]
async fn cursor_resumes_where_the_last_run_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let log = OrderLog::new(dir.path().join("orders.jsonl"));

    log.append(&[
        Record::new("1").with_title("one"),
        Record::new("2").with_title("two"),
    ])
    .unwrap();

    let first = MockMessenger::new();
    notifier(&dir, first.clone()).tick().await.unwrap();
    assert_eq!(first.sent(), ["1: one", "2: two"]);

    log.append(&[
        Record::new("3").with_title("three"),
        Record::new("4").with_title("four"),
    ])
    .unwrap();

    // A fresh notifier picks up from the persisted cursor: only the new
    // suffix, no duplicates, and the cursor lands at end of file.
    let second = MockMessenger::new();
    let forwarded = notifier(&dir, second.clone()).tick().await.unwrap();
    assert_eq!(forwarded, 2);
    assert_eq!(second.sent(), ["3: three", "4: four"]);
    assert_eq!(
        Cursor::new(dir.path().join("notify_state.json")).load(),
        log.size().unwrap()
    );
}

#[tokio::test]
async fn truncated_log_resets_the_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let log = OrderLog::new(dir.path().join("orders.jsonl"));

    log.append(&[
        Record::new("1").with_title("one"),
        Record::new("2").with_title("two"),
    ])
    .unwrap();

    let first = MockMessenger::new();
    notifier(&dir, first.clone()).tick().await.unwrap();

    // The log is replaced with a smaller file, as an external rotation
    // would.
    std::fs::write(
        dir.path().join("orders.jsonl"),
        "{\"id\":\"9\",\"title\":\"nine\"}\n",
    )
    .unwrap();

    let second = MockMessenger::new();
    let forwarded = notifier(&dir, second.clone()).tick().await.unwrap();
    assert_eq!(forwarded, 1);
    assert_eq!(second.sent(), ["9: nine"]);
}

#[tokio::test]
async fn malformed_line_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("orders.jsonl"),
        "{\"id\":\"1\",\"title\":\"one\"}\ngarbage line\n{\"id\":\"2\",\"title\":\"two\"}\n",
    )
    .unwrap();

    let messenger = MockMessenger::new();
    let forwarded = notifier(&dir, messenger.clone()).tick().await.unwrap();
    assert_eq!(forwarded, 2);
    assert_eq!(messenger.sent(), ["1: one", "2: two"]);
}

/// Decided policy: a failed send is logged, the pass continues, and the
/// cursor still advances - a completed pass never retries.
#[tokio::test]
async fn failed_send_does_not_stall_the_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let log = OrderLog::new(dir.path().join("orders.jsonl"));

    log.append(&[
        Record::new("1").with_title("one"),
        Record::new("2").with_title("two"),
        Record::new("3").with_title("three"),
    ])
    .unwrap();

    let messenger = MockMessenger::new().with_failure_on("two");
    let notifier = notifier(&dir, messenger.clone());

    assert_eq!(notifier.tick().await.unwrap(), 2);
    assert_eq!(messenger.sent(), ["1: one", "3: three"]);
    assert_eq!(messenger.attempts(), 3);

    // The next pass starts past the failure.
    assert_eq!(notifier.tick().await.unwrap(), 0);
    assert_eq!(messenger.attempts(), 3);
}

#[tokio::test]
async fn delivery_filter_gates_logged_records() {
    let dir = tempfile::tempdir().unwrap();
    let log = OrderLog::new(dir.path().join("orders.jsonl"));

    log.append(&[
        Record::new("1").with_title("chat-bot helper"),
        Record::new("2").with_title("plain job"),
    ])
    .unwrap();

    let messenger = MockMessenger::new();
    let notifier =
        notifier(&dir, messenger.clone()).with_filter(Arc::new(ContainsFilter::new("bot")));

    assert_eq!(notifier.tick().await.unwrap(), 1);
    assert_eq!(messenger.sent(), ["1: chat-bot helper"]);
    // The skipped record is behind the cursor now, like the delivered one.
    assert_eq!(notifier.tick().await.unwrap(), 0);
}

/// The poller and notifier observe each other only through the files, in
/// write order.
#[tokio::test]
async fn poller_output_reaches_the_messenger_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new().with_batch(vec![
        listing("10", "bot one"),
        listing("11", "bot two"),
        listing("12", "bot three"),
    ]);

    let dedup = DedupStore::load(dir.path().join("seen_ids.json")).unwrap();
    let log = OrderLog::new(dir.path().join("orders.jsonl"));
    let mut poller = Poller::new(
        page,
        PlainExtractor,
        AcceptAll,
        dedup,
        log,
        PollerConfig::new("https://board.example/orders", "a.card"),
    );
    poller.cycle().await.unwrap();

    let messenger = MockMessenger::new();
    notifier(&dir, messenger.clone()).tick().await.unwrap();
    assert_eq!(
        messenger.sent(),
        ["10: bot one", "11: bot two", "12: bot three"]
    );
}
