use qualex_core::{ResponseRecord, ResponseSink, StoreError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Opens `path` for appending and writes `bytes` in a single call, so a
/// batch either lands whole or the write fails.
fn append_bytes(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_data()?;
    Ok(())
}

fn is_empty_or_missing(path: &Path) -> Result<bool, StoreError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Appends rows to a CSV file, writing the header only into a new file.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResponseSink for CsvFileSink {
    fn append(&mut self, rows: &[ResponseRecord]) -> Result<(), StoreError> {
        let header = is_empty_or_missing(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(header)
            .from_writer(Vec::new());
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| StoreError::Serialize(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        append_bytes(&self.path, &bytes)?;
        debug!(path = %self.path.display(), rows = rows.len(), header, "csv rows appended");
        Ok(())
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Appends one JSON object per row.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResponseSink for JsonLinesSink {
    fn append(&mut self, rows: &[ResponseRecord]) -> Result<(), StoreError> {
        let mut bytes = Vec::new();
        for row in rows {
            serde_json::to_writer(&mut bytes, row)
                .map_err(|e| StoreError::Serialize(e.to_string()))?;
            bytes.push(b'\n');
        }
        append_bytes(&self.path, &bytes)?;
        debug!(path = %self.path.display(), rows = rows.len(), "json lines appended");
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Keeps every appended batch in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<Vec<ResponseRecord>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<ResponseRecord>> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

impl ResponseSink for MemorySink {
    fn append(&mut self, rows: &[ResponseRecord]) -> Result<(), StoreError> {
        self.batches
            .lock()
            .map_err(|_| StoreError::Unavailable("memory sink poisoned".to_string()))?
            .push(rows.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
