use chrono::{NaiveDate, NaiveDateTime};
use ovucycle::records::{
    FileRecordStore, Observation, ObservationKind, RecordLog, RecordStore, RemoteConfig,
    StoreConfig, StoreError, Trend,
};
use std::fs;
use tempfile::TempDir;

fn ts(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn lh(timestamp: NaiveDateTime, value: f64, label: &str) -> Observation {
    Observation::new(timestamp, ObservationKind::LhReading, value, label, "Full Upload")
}

fn store_in(dir: &TempDir) -> FileRecordStore {
    FileRecordStore::new(dir.path().join("records.json"))
}

#[test]
fn test_missing_file_reads_empty() {
    let dir = TempDir::new().unwrap();
    assert!(store_in(&dir).read_all().unwrap().is_empty());
}

#[test]
fn test_append_then_read_all() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let first = lh(ts(1, 8, 0), 0.42, "Low");
    let second = Observation::intimacy(ts(1, 22, 30));
    store.append(&first).unwrap();
    let before = store.read_all().unwrap();
    store.append(&second).unwrap();

    let all = store.read_all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], before[0], "prior entries must not change");
    assert_eq!(all[0], first);
    assert_eq!(all[1], second);
    assert_eq!(all[1].label, "Logged");
    assert_eq!(all[1].value, 1.0);
}

#[test]
fn test_all_five_columns_are_written() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.append(&lh(ts(2, 9, 15), 1.1, "Peak")).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    let row = &raw[0];
    assert_eq!(row["date"], "2024-03-02 09:15:00");
    assert_eq!(row["type"], "lh");
    assert_eq!(row["value"], 1.1);
    assert_eq!(row["status"], "Peak");
    assert_eq!(row["note"], "Full Upload");
}

#[test]
fn test_read_all_orders_by_timestamp_then_insertion() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store.append(&lh(ts(3, 9, 0), 0.3, "Low")).unwrap();
    store.append(&lh(ts(1, 9, 0), 0.1, "Negative")).unwrap();
    store.append(&lh(ts(3, 9, 0), 0.7, "High")).unwrap();

    let values: Vec<f64> = store.read_all().unwrap().iter().map(|o| o.value).collect();
    assert_eq!(values, vec![0.1, 0.3, 0.7]);
}

#[test]
fn test_repeated_reads_are_identical() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.append(&lh(ts(4, 7, 0), 0.65, "High")).unwrap();
    store.append(&Observation::intimacy(ts(4, 23, 0))).unwrap();

    assert_eq!(store.read_all().unwrap(), store.read_all().unwrap());
}

#[test]
fn test_legacy_rows_are_backfilled() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(
        store.path(),
        r#"[
            {"date": "2024-03-01 08:00", "type": "lh", "value": 0.9},
            {"date": "2024-03-01 21:00", "type": "intimacy"},
            {"type": "lh", "value": "", "status": "Negative"}
        ]"#,
    )
    .unwrap();

    let all = store.read_all().unwrap();
    assert_eq!(all.len(), 3);
    // undated row sorts first
    assert_eq!(all[0].timestamp, NaiveDateTime::default());
    assert_eq!(all[0].value, 0.0);
    assert_eq!(all[1].label, "");
    assert_eq!(all[1].note, "");
    assert_eq!(all[2].kind, ObservationKind::Intimacy);
}

#[test]
fn test_unknown_kinds_and_columns_survive_append() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(
        store.path(),
        r#"[{"date":"2024-03-01 08:00:00","type":"discharge","value":2.0,"status":"Creamy","note":"","mood":"calm"}]"#,
    )
    .unwrap();

    store.append(&lh(ts(2, 8, 0), 0.2, "Negative")).unwrap();

    let all = store.read_all().unwrap();
    assert_eq!(all[0].kind, ObservationKind::Other("discharge".to_string()));
    assert_eq!(all[0].label, "Creamy");

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw[0]["type"], "discharge");
    assert_eq!(raw[0]["mood"], "calm");
}

#[test]
fn test_failed_append_leaves_log_intact() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(store.path(), "[{\"date\": ").unwrap();

    let err = store.append(&lh(ts(5, 8, 0), 0.5, "Low")).unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "[{\"date\": ");

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_append_leaves_only_the_log() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.append(&lh(ts(5, 8, 0), 0.5, "Low")).unwrap();
    store.append(&lh(ts(5, 20, 0), 0.6, "High")).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["records.json".to_string()]);
    assert_eq!(store.read_all().unwrap().len(), 2);
}

#[test]
fn test_append_creates_parent_directory() {
    let dir = TempDir::new().unwrap();
    let store = FileRecordStore::new(dir.path().join("nested").join("log.json"));
    store.append(&Observation::intimacy(ts(6, 20, 0))).unwrap();
    assert_eq!(store.read_all().unwrap().len(), 1);
}

fn unreachable_remote(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        local_path: dir.path().join("records.json"),
        remote: Some(RemoteConfig {
            // Discard port; nothing listens here.
            base_url: "http://127.0.0.1:9".to_string(),
            worksheet: "Sheet1".to_string(),
            timeout_secs: 2,
        }),
    }
}

#[test]
fn test_synced_log_falls_back_to_local() {
    let dir = TempDir::new().unwrap();
    let log = RecordLog::from_config(&unreachable_remote(&dir)).unwrap();
    assert!(matches!(log, RecordLog::Synced { .. }));

    let obs = lh(ts(7, 8, 0), 0.85, "High");
    log.append(&obs).unwrap();
    assert_eq!(log.read_all().unwrap(), vec![obs.clone()]);

    // the local file received the write
    assert_eq!(store_in(&dir).read_all().unwrap(), vec![obs]);
}

#[test]
fn test_unreachable_remote_falls_back_on_every_call() {
    let dir = TempDir::new().unwrap();
    let log = RecordLog::from_config(&unreachable_remote(&dir)).unwrap();

    log.append(&lh(ts(8, 8, 0), 0.2, "Negative")).unwrap();
    log.append(&lh(ts(8, 20, 0), 0.4, "Low")).unwrap();
    assert_eq!(log.read_all().unwrap().len(), 2);
    assert_eq!(log.pending().unwrap().len(), 2);
}

#[test]
fn test_local_log_from_default_config() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        local_path: dir.path().join("records.json"),
        ..StoreConfig::default()
    };
    let log = RecordLog::from_config(&config).unwrap();
    assert!(matches!(log, RecordLog::Local(_)));
}

#[test]
fn test_trend_splits_series() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.append(&lh(ts(10, 20, 0), 1.2, "Peak")).unwrap();
    store.append(&Observation::intimacy(ts(10, 22, 0))).unwrap();
    store.append(&lh(ts(10, 8, 0), 0.5, "Low")).unwrap();
    store
        .append(&Observation::new(ts(10, 9, 0), ObservationKind::Other("bbt".into()), 36.6, "", ""))
        .unwrap();

    let trend = Trend::from_history(&store.read_all().unwrap());
    let ratios: Vec<f64> = trend.lh.iter().map(|p| p.ratio).collect();
    assert_eq!(ratios, vec![0.5, 1.2]);
    assert_eq!(trend.intimacy, vec![ts(10, 22, 0)]);
    assert_eq!(trend.peak().map(|p| p.timestamp), Some(ts(10, 20, 0)));
}
