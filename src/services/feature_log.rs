// Feature log: append-only CSV record of every classified URL
// Rows are batched through a background task when a Tokio runtime is available

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::models::{FeatureVector, Label, FEATURE_NAMES};

const BATCH_SIZE: usize = 100;
const FLUSH_INTERVAL: tokio::time::Duration = tokio::time::Duration::from_secs(2);

// =============================================================================
// ENTRY
// =============================================================================

/// One classified URL, as it will be written to the log
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLogEntry {
    pub url: String,
    pub features: FeatureVector,
    pub label: Label,
    pub timestamp: DateTime<Utc>,
}

impl FeatureLogEntry {
    pub fn new(url: impl Into<String>, features: FeatureVector, label: Label) -> Self {
        Self {
            url: url.into(),
            features,
            label,
            timestamp: Utc::now(),
        }
    }

    /// CSV columns: url, label (0/1), timestamp, then features in canonical order
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(3 + FEATURE_NAMES.len());
        record.push(self.url.clone());
        record.push(self.label.index().to_string());
        record.push(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
        record.extend(self.features.to_array().iter().map(|v| v.to_string()));
        record
    }
}

#[derive(Error, Debug)]
pub enum FeatureLogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// WRITER
// =============================================================================

/// Synchronous CSV appender
#[derive(Debug)]
pub struct FeatureLogWriter {
    path: PathBuf,
}

impl FeatureLogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header() -> Vec<&'static str> {
        let mut header = vec!["url", "label", "timestamp"];
        header.extend(FEATURE_NAMES);
        header
    }

    /// Append `entries`, writing the header first if the file is new or empty
    pub fn append_batch(&self, entries: &[FeatureLogEntry]) -> Result<(), FeatureLogError> {
        if entries.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let needs_header = std::fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(Self::header())?;
        }
        for entry in entries {
            writer.write_record(entry.to_record())?;
        }
        writer.flush()?;

        Ok(())
    }
}

// =============================================================================
// FEATURE LOG SERVICE
// =============================================================================

enum LogCommand {
    Append(FeatureLogEntry),
    Flush(oneshot::Sender<()>),
}

/// Best-effort, fire-and-forget feature log
#[derive(Clone)]
pub struct FeatureLog {
    writer: Arc<FeatureLogWriter>,
    // None when created outside a runtime; appends are then written inline
    tx: Option<mpsc::UnboundedSender<LogCommand>>,
}

impl FeatureLog {
    /// Create a log at `path`. Inside a Tokio runtime a background batch
    /// writer is spawned; otherwise every append is written synchronously.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let writer = Arc::new(FeatureLogWriter::new(path));

        let tx = match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let (tx, rx) = mpsc::unbounded_channel::<LogCommand>();
                handle.spawn(Self::run(Arc::clone(&writer), rx));
                Some(tx)
            },
            Err(_) => None,
        };

        Self { writer, tx }
    }

    /// Create a log that always writes inline
    pub fn synchronous(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(FeatureLogWriter::new(path)),
            tx: None,
        }
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    pub fn is_batched(&self) -> bool {
        self.tx.is_some()
    }

    /// Record an entry. Never fails; write errors are logged.
    pub fn append(&self, entry: FeatureLogEntry) {
        let Some(tx) = &self.tx else {
            self.write_now(&[entry]);
            return;
        };

        if let Err(mpsc::error::SendError(command)) = tx.send(LogCommand::Append(entry)) {
            warn!("Feature log writer is gone, writing entry directly");
            if let LogCommand::Append(entry) = command {
                self.write_now(&[entry]);
            }
        }
    }

    /// Wait until every entry queued so far has been written
    pub async fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };

        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(LogCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    fn write_now(&self, entries: &[FeatureLogEntry]) {
        if let Err(e) = self.writer.append_batch(entries) {
            error!(
                "Failed to write {} feature log entries to {}: {}",
                entries.len(),
                self.writer.path().display(),
                e
            );
        }
    }

    async fn run(writer: Arc<FeatureLogWriter>, mut rx: mpsc::UnboundedReceiver<LogCommand>) {
        let mut batch = Vec::with_capacity(BATCH_SIZE);
        let mut interval = tokio::time::interval(FLUSH_INTERVAL);

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(LogCommand::Append(entry)) => {
                        batch.push(entry);
                        if batch.len() >= BATCH_SIZE {
                            Self::write_batch(&writer, &mut batch).await;
                        }
                    }
                    Some(LogCommand::Flush(done)) => {
                        Self::write_batch(&writer, &mut batch).await;
                        let _ = done.send(());
                    }
                    None => {
                        Self::write_batch(&writer, &mut batch).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    if !batch.is_empty() {
                        Self::write_batch(&writer, &mut batch).await;
                    }
                }
            }
        }
    }

    async fn write_batch(writer: &Arc<FeatureLogWriter>, batch: &mut Vec<FeatureLogEntry>) {
        if batch.is_empty() {
            return;
        }

        let entries = std::mem::take(batch);
        let count = entries.len();
        let writer = Arc::clone(writer);
        let path = writer.path().display().to_string();

        match tokio::task::spawn_blocking(move || writer.append_batch(&entries)).await {
            Ok(Ok(())) => debug!("Wrote {} feature log entries to {}", count, path),
            Ok(Err(e)) => error!("Failed to write {} feature log entries to {}: {}", count, path, e),
            Err(e) => error!("Feature log write task failed: {}", e),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
