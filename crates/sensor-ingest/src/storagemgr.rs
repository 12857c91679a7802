use crate::record::Record;
use sbuf::{Consumer, Sbuf};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, trace};

/// Persists every observed record to an append-only, checksummed log file.
///
/// This stands in for "persistence to a relational store" — the real
/// database connection and insert statements are out of scope. The framing
/// discipline (CRC32 + length-prefixed, bincode-encoded payload) mirrors
/// the write-ahead-log idiom used elsewhere in this codebase's lineage,
/// scaled down to a single append-only file since no replay/recovery path
/// is required here.
pub struct StorageLog {
    writer: BufWriter<File>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to open storage log: {0}")]
    Open(#[source] io::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] bincode::Error),
    #[error("failed to write storage log: {0}")]
    Write(#[source] io::Error),
}

impl StorageLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(StorageError::Open)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Appends one record as `[u32 crc32][u32 len][bincode payload]`.
    pub fn append(&mut self, record: &Record) -> Result<(), StorageError> {
        let payload = bincode::serialize(record)?;
        let crc = crc32fast::hash(&payload);

        self.writer
            .write_all(&crc.to_le_bytes())
            .map_err(StorageError::Write)?;
        self.writer
            .write_all(&(payload.len() as u32).to_le_bytes())
            .map_err(StorageError::Write)?;
        self.writer.write_all(&payload).map_err(StorageError::Write)?;
        self.writer.flush().map_err(StorageError::Write)?;
        Ok(())
    }
}

/// Storage manager consumer loop: persists every record it observes, in
/// the order the storage manager's own cursor delivers them, then exits
/// once the buffer is drained and closed.
pub fn run(buf: Arc<Sbuf<Record>>, log_path: impl AsRef<Path>) {
    let mut log = match StorageLog::open(log_path) {
        Ok(log) => log,
        Err(e) => {
            error!(error = %e, "storage manager failed to open log, exiting");
            return;
        }
    };

    let mut processed: u64 = 0;
    loop {
        let record = match buf.remove(Consumer::Storage) {
            Ok(record) => record,
            Err(_terminated) => break,
        };

        if let Err(e) = log.append(&record) {
            error!(error = %e, sensor_id = record.sensor_id, "failed to persist record");
            continue;
        }
        processed += 1;
        trace!(sensor_id = record.sensor_id, "persisted reading");
    }

    info!(processed, "storage manager drained and exiting");
}
