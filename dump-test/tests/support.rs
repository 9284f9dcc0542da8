use std::time::Duration;

use dump_data::{MetricsSink, Operation, Outcome};
use dump_test::{LogCapture, RecordingMetrics, TestDb};

#[tokio::test]
async fn test_db_is_isolated_and_persistent() {
    let first = TestDb::new().await;
    first
        .execute("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t (id) VALUES (1);")
        .await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
        .fetch_one(first.db().pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    let second = TestDb::new().await;
    let missing = sqlx::query("SELECT * FROM t").fetch_all(second.db().pool()).await;
    assert!(missing.is_err());
}

#[test]
fn test_recording_metrics() {
    let metrics = RecordingMetrics::default();
    metrics.record("Goods", Operation::Find, Outcome::NotFound, Duration::ZERO);
    metrics.record("Goods", Operation::Save, Outcome::Success, Duration::ZERO);

    assert_eq!(metrics.count(Operation::Find, Outcome::NotFound), 1);
    metrics.assert_last("Goods", Operation::Save, Outcome::Success);

    metrics.clear();
    assert!(metrics.records().is_empty());
}

#[test]
fn test_log_capture() {
    let logs = LogCapture::new();
    {
        let _guard = logs.install();
        tracing::info!(model = "Goods", "loaded");
        tracing::error!(method = "save", "orm error");
    }
    tracing::error!("not captured");

    assert!(logs.contains("loaded"));
    let errors = logs.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("method=\"save\"") || errors[0].contains("method=save"));
}
