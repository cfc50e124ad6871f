use std::fs;

use chrono::{TimeZone, Utc};
use home_app::app::{load_batch, process, AppConfig};
use home_core::notifications::NotificationKind;
use tempfile::tempdir;

const BATCH: &str = r#"{
  "now": "2025-01-31T09:00:00Z",
  "pantry": [
    {"id": "milk", "name": "Milk", "quantity": 1, "expiry_date": "2025-02-02"},
    {"id": "rice", "name": "Rice", "quantity": 4},
    {"id": "bread", "name": "Bread", "quantity": 0,
     "last_low_stock_notification_at": "2025-01-31T08:00:00Z"}
  ],
  "tasks": [
    {"id": "rent", "due": "2025-01-31T09:00:00Z", "pattern": "MONTHLY"},
    {"id": "bins", "due": "2025-01-20T18:00:00Z", "pattern": "WEEKLY", "interval": 1},
    {"id": "filter", "due": "2025-03-01T00:00:00Z", "pattern": "DAILY", "interval": 30}
  ]
}"#;

#[test]
fn batch_file_round_trip() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("batch.json");
    fs::write(&path, BATCH).expect("write fixture");

    let batch = load_batch(path.to_str()).expect("load batch");
    assert_eq!(batch.pantry.len(), 3);
    assert_eq!(batch.tasks.len(), 3);

    let output = process(&AppConfig::default(), &batch).expect("process batch");
    assert_eq!(output.now, Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap());

    assert_eq!(output.pantry.low_stock_alerts, 1);
    assert_eq!(output.pantry.expiry_alerts, 1);
    let kinds: Vec<_> = output
        .notifications
        .iter()
        .map(|request| (request.item_id.as_str(), request.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("milk", NotificationKind::LowStock),
            ("milk", NotificationKind::NearExpiry)
        ]
    );

    assert_eq!(output.tasks.len(), 2);
    assert_eq!(output.tasks[0].task_id, "rent");
    assert_eq!(
        output.tasks[0].next_due,
        Utc.with_ymd_and_hms(2025, 2, 28, 9, 0, 0).unwrap()
    );
    assert_eq!(output.tasks[1].task_id, "bins");
    assert_eq!(
        output.tasks[1].next_due,
        Utc.with_ymd_and_hms(2025, 2, 3, 18, 0, 0).unwrap()
    );
    assert_eq!(output.tasks[1].skipped_occurrences, 1);

    let json = serde_json::to_value(&output).expect("serialize output");
    assert_eq!(json["pantry"]["outcomes"][0]["decision"]["should_notify_low_stock"], true);
}

#[test]
fn configured_clock_overrides_batch_clock() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("batch.json");
    fs::write(&path, BATCH).expect("write fixture");
    let batch = load_batch(path.to_str()).expect("load batch");

    let config = AppConfig {
        now: Some(Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap()),
        ..AppConfig::default()
    };
    let output = process(&config, &batch).expect("process batch");
    assert_eq!(output.now, config.now.unwrap());
    assert!(output.tasks.is_empty());
    assert_eq!(output.pantry.expiry_alerts, 0);
}

#[test]
fn missing_file_and_bad_json_are_reported() {
    let temp = tempdir().expect("tempdir");
    let missing = temp.path().join("nope.json");
    let err = load_batch(missing.to_str()).unwrap_err();
    assert!(err.to_string().contains("unable to read"));

    let broken = temp.path().join("broken.json");
    fs::write(&broken, "{ not json").expect("write fixture");
    assert!(load_batch(broken.to_str()).is_err());
}

#[test]
fn invalid_item_aborts_the_batch() {
    let batch = serde_json::from_str(
        r#"{"now": "2025-01-31T09:00:00Z", "pantry": [{"id": "ghost", "quantity": -1}]}"#,
    )
    .expect("parse batch");
    let err = process(&AppConfig::default(), &batch).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("ghost"), "{chain}");
}
