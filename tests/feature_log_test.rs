// Feature log: batching, ordering and on-disk layout

mod common;

use common::extractor;
use malicious_url_detector::{
    services::{FeatureLogEntry, FeatureLogWriter},
    FeatureLog, Label, FEATURE_NAMES,
};

fn entry(url: &str, label: Label) -> FeatureLogEntry {
    FeatureLogEntry::new(url, extractor().extract(url).unwrap(), label)
}

#[tokio::test]
async fn test_entries_survive_flush_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("url_features.csv");
    let log = FeatureLog::new(&path);

    let urls: Vec<String> = (0..250).map(|i| format!("https://host{i}.example.com/p")).collect();
    for url in &urls {
        log.append(entry(url, Label::Benign));
    }
    log.flush().await;

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let logged: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[0].to_string())
        .collect();
    assert_eq!(logged, urls);
}

#[tokio::test]
async fn test_clones_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("url_features.csv");
    let log = FeatureLog::new(&path);
    let clone = log.clone();

    log.append(entry("https://a.example.com", Label::Benign));
    clone.append(entry("http://b.example.tk/login", Label::Malicious));
    clone.flush().await;

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.starts_with("url,label,timestamp,url_length"));
}

#[test]
fn test_row_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("url_features.csv");
    let writer = FeatureLogWriter::new(&path);
    let entry = entry("http://malware.example.tk/login/secure/bank/verify", Label::Malicious);

    writer.append_batch(std::slice::from_ref(&entry)).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    let row = reader.records().next().unwrap().unwrap();

    assert_eq!(headers.len(), 3 + FEATURE_NAMES.len());
    assert_eq!(headers.iter().skip(3).collect::<Vec<_>>(), FEATURE_NAMES);
    assert_eq!(&row[1], "1");
    assert_eq!(
        chrono::DateTime::parse_from_rfc3339(&row[2])
            .unwrap()
            .timestamp_millis(),
        entry.timestamp.timestamp_millis()
    );

    let values: Vec<f64> = row.iter().skip(3).map(|v| v.parse().unwrap()).collect();
    assert_eq!(values, entry.features.to_array().to_vec());
}

#[test]
fn test_existing_log_is_appended_to() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("url_features.csv");

    FeatureLog::synchronous(&path).append(entry("https://one.example.com", Label::Benign));
    FeatureLog::synchronous(&path).append(entry("https://two.example.com", Label::Benign));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.records().count(), 2);
}
