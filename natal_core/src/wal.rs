//! Write-Ahead Log (WAL) for assessment persistence.
//!
//! Completed assessments are appended to a JSONL (JSON Lines) file with
//! file locking to ensure safe concurrent access.

use crate::{AssessmentRecord, Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Assessment sink trait for persisting records
pub trait AssessmentSink {
    fn append(&mut self, record: &AssessmentRecord) -> Result<()>;
}

/// JSONL-based assessment sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl AssessmentSink for JsonlSink {
    fn append(&mut self, record: &AssessmentRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        // Open file for appending
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Acquire exclusive lock
        file.lock_exclusive()?;

        // Write record as JSON line
        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        // Lock is automatically released when file is dropped
        file.unlock()?;

        tracing::debug!("Appended assessment {} to WAL", record.id);
        Ok(())
    }
}

/// Read all assessment records from a WAL file
pub fn read_records(path: &Path) -> Result<Vec<AssessmentRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<AssessmentRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse assessment at line {}: {}", line_num + 1, e);
                // Continue reading, don't fail completely
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} assessments from WAL", records.len());
    Ok(records)
}

/// Mark the assessment with the given id as resolved, rewriting the WAL
///
/// The rewrite is atomic: records are written to a temp file in the same
/// directory and renamed over the original. Returns `false` if no record
/// with that id is in the WAL.
pub fn mark_resolved_in_wal(path: &Path, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    let mut records = read_records(path)?;

    let mut found = false;
    for record in records.iter_mut() {
        if record.id == id {
            record.resolved = true;
            record.resolved_at = Some(at);
            found = true;
            break;
        }
    }
    if !found {
        return Ok(false);
    }

    let parent = path.parent().ok_or_else(|| {
        Error::Other(format!("WAL path {:?} has no parent directory", path))
    })?;
    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        for record in &records {
            let line = serde_json::to_string(record)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Marked assessment {} resolved in WAL", id);
    Ok(true)
}
