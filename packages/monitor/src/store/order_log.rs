//! Append-only order log: one JSON record per line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::types::record::Record;

/// Durable sequence of accepted records, physically ordered by discovery
/// time. Entries are never rewritten or deleted; the file is created lazily
/// on the first append.
#[derive(Debug, Clone)]
pub struct OrderLog {
    path: PathBuf,
}

impl OrderLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size in bytes; 0 when the log does not exist yet.
    pub fn size(&self) -> StoreResult<u64> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(self.io_err(e)),
        }
    }

    /// Append records, one serialized line each. Never truncates.
    pub fn append(&self, records: &[Record]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut body = String::new();
        for record in records {
            let line = serde_json::to_string(record).map_err(|e| StoreError::Encode {
                path: self.path.display().to_string(),
                source: e,
            })?;
            body.push_str(&line);
            body.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.write_all(body.as_bytes()).map_err(|e| self.io_err(e))
    }

    /// Read records after `offset`, returning them together with the byte
    /// position reached.
    ///
    /// Malformed lines are skipped with a warning and never abort the pass.
    /// A trailing line without a newline is left alone - the writer appends
    /// whole lines, so an incomplete tail means an append is in flight and
    /// will be picked up next pass.
    pub fn read_from(&self, offset: u64) -> StoreResult<(Vec<Record>, u64)> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(e) => return Err(self.io_err(e)),
        };

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| self.io_err(e))?;

        let mut records = Vec::new();
        let mut pos = offset;
        let mut line = String::new();
        loop {
            line.clear();
            let n = reader.read_line(&mut line).map_err(|e| self.io_err(e))?;
            if n == 0 || !line.ends_with('\n') {
                break;
            }
            pos += n as u64;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "skipping malformed order log line")
                }
            }
        }

        Ok((records, pos))
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_returns_all_records() {
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("orders.jsonl"));

        log.append(&[Record::new("1").with_title("first"), Record::new("2")])
            .unwrap();
        log.append(&[Record::new("3")]).unwrap();

        let (records, pos) = log.read_from(0).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[2].id, "3");
        assert_eq!(pos, log.size().unwrap());
    }

    #[test]
    fn read_resumes_from_offset() {
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("orders.jsonl"));

        log.append(&[Record::new("1")]).unwrap();
        let (_, mid) = log.read_from(0).unwrap();
        log.append(&[Record::new("2"), Record::new("3")]).unwrap();

        let (records, _) = log.read_from(mid).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "2");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.jsonl");
        std::fs::write(
            &path,
            "{\"id\":\"1\"}\nnot json\n{\"id\":\"2\"}\n",
        )
        .unwrap();

        let log = OrderLog::new(&path);
        let (records, pos) = log.read_from(0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[1].id, "2");
        assert_eq!(pos, log.size().unwrap());
    }

    #[test]
    fn incomplete_tail_line_is_not_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.jsonl");
        std::fs::write(&path, "{\"id\":\"1\"}\n{\"id\":\"2\"").unwrap();

        let log = OrderLog::new(&path);
        let (records, pos) = log.read_from(0).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(pos, "{\"id\":\"1\"}\n".len() as u64);
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("orders.jsonl"));
        let (records, pos) = log.read_from(0).unwrap();
        assert!(records.is_empty());
        assert_eq!(pos, 0);
        assert_eq!(log.size().unwrap(), 0);
    }
}
