//! CSV rollup functionality for archiving WAL assessments, plus CSV
//! export of a contraction session's log.
//!
//! Rollup is atomic with proper error handling to prevent data loss.

use crate::{AssessmentRecord, ContractionSession, Error, Result};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Serialize a serde `snake_case` enum value to its bare string form
fn enum_str<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

/// A row in the assessment CSV archive
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    reported_at: String,
    category: String,
    trimester: String,
    duration: String,
    frequency: String,
    pain_scale: Option<u8>,
    affecting_daily_life: bool,
    associated_symptoms: String,
    urgency: String,
    action: String,
    resolved: bool,
    resolved_at: Option<String>,
}

impl From<&AssessmentRecord> for CsvRow {
    fn from(record: &AssessmentRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            reported_at: record.reported_at.to_rfc3339(),
            category: enum_str(&record.report.category),
            trimester: enum_str(&record.report.trimester),
            duration: enum_str(&record.report.duration),
            frequency: enum_str(&record.report.frequency),
            pain_scale: record.report.pain_scale,
            affecting_daily_life: record.report.affecting_daily_life,
            associated_symptoms: record.report.associated_symptoms.join(";"),
            urgency: enum_str(&record.recommendation.urgency),
            action: enum_str(&record.recommendation.action),
            resolved: record.resolved,
            resolved_at: record.resolved_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Roll up WAL assessments into CSV and archive the WAL atomically
///
/// This function:
/// 1. Reads all records from the WAL
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to .processed
/// 5. Returns the number of records processed
///
/// # Safety
/// - CSV is fsynced before WAL is renamed
/// - WAL is renamed (not deleted) to allow manual recovery if needed
/// - Processed WAL files can be cleaned up manually
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    // Read all records from WAL
    let records = crate::wal::read_records(wal_path)?;

    if records.is_empty() {
        tracing::info!("No assessments in WAL to roll up");
        return Ok(0);
    }

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Open CSV file for appending
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Determine if we need to write headers by checking file size after opening
    let needs_headers = file.metadata()?.len() == 0;

    // For appending, we need to skip headers manually if file already has content
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    // Write all records to CSV
    for record in &records {
        let row = CsvRow::from(record);
        writer.serialize(row)?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} assessments to CSV", records.len());

    // Atomically archive the WAL by renaming it
    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(records.len())
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed WAL: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}

/// Mark the assessment with the given id as resolved in the CSV archive
///
/// Rows are rewritten verbatim apart from the target's `resolved` and
/// `resolved_at` columns, via a temp file renamed over the original.
/// Returns `false` if the file doesn't exist or holds no such id.
pub fn mark_resolved_in_csv(csv_path: &Path, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    if !csv_path.exists() {
        return Ok(false);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(csv_path)?;
    let headers = reader.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::Other(format!("CSV archive missing '{}' column", name)))
    };
    let id_idx = column("id")?;
    let resolved_idx = column("resolved")?;
    let resolved_at_idx = column("resolved_at")?;

    let id_str = id.to_string();
    let mut rows = Vec::new();
    let mut found = false;
    for result in reader.records() {
        let row = result?;
        if row.get(id_idx) == Some(id_str.as_str()) {
            let mut fields: Vec<String> = row.iter().map(String::from).collect();
            fields[resolved_idx] = "true".into();
            fields[resolved_at_idx] = at.to_rfc3339();
            rows.push(csv::StringRecord::from(fields));
            found = true;
        } else {
            rows.push(row);
        }
    }
    if !found {
        return Ok(false);
    }

    let parent = csv_path.parent().ok_or_else(|| {
        Error::Other(format!("CSV path {:?} has no parent directory", csv_path))
    })?;
    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file());
        writer.write_record(&headers)?;
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Marked assessment {} resolved in CSV archive", id);
    Ok(true)
}

/// A row in the contraction-log CSV export
#[derive(Debug, serde::Serialize)]
struct ContractionCsvRow {
    started_at: String,
    ended_at: Option<String>,
    duration_secs: Option<i64>,
    interval_secs: Option<i64>,
    intensity: Option<String>,
}

/// Export a session's completed contraction log as CSV
///
/// Returns the number of contractions written. The in-progress
/// contraction, if any, is not exported.
pub fn session_to_csv(session: &ContractionSession, csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(csv_path)?;

    for (index, contraction) in session.contractions.iter().enumerate() {
        let row = ContractionCsvRow {
            started_at: contraction.started_at.to_rfc3339(),
            ended_at: contraction.ended_at.map(|t| t.to_rfc3339()),
            duration_secs: contraction.duration().map(|d| d.num_seconds()),
            interval_secs: session.interval_before(index).map(|i| i.num_seconds()),
            intensity: contraction.intensity.as_ref().map(enum_str),
        };
        writer.serialize(row)?;
    }

    writer.flush()?;
    tracing::info!(
        "Exported {} contractions to {:?}",
        session.contractions.len(),
        csv_path
    );

    Ok(session.contractions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::AssessmentSink;
    use crate::{
        assess, build_default_catalog, SymptomCategory, SymptomDuration, SymptomFrequency,
        SymptomReport, Trimester,
    };
    use chrono::{Duration, Utc};
    use std::fs::File;

    fn create_test_record(category: SymptomCategory) -> AssessmentRecord {
        let report = SymptomReport {
            category,
            duration: SymptomDuration::Hours,
            frequency: SymptomFrequency::Once,
            pain_scale: None,
            affecting_daily_life: false,
            associated_symptoms: vec!["cramping".into(), "back ache".into()],
            trimester: Trimester::Second,
        };
        let recommendation = assess(&build_default_catalog(), &report).unwrap();
        AssessmentRecord::new(Utc::now(), report, recommendation)
    }

    #[test]
    fn test_wal_to_csv_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("assessments.wal");
        let csv_path = temp_dir.path().join("assessments.csv");

        // Write records to WAL
        let mut sink = crate::wal::JsonlSink::new(&wal_path);
        for category in [
            SymptomCategory::Pain,
            SymptomCategory::Digestive,
            SymptomCategory::Skin,
        ] {
            sink.append(&create_test_record(category)).unwrap();
        }

        // Roll up to CSV
        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 3);

        // Verify CSV exists
        assert!(csv_path.exists());

        // Verify WAL was archived
        assert!(!wal_path.exists());
        assert!(wal_path.with_extension("wal.processed").exists());
    }

    #[test]
    fn test_wal_to_csv_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("assessments.wal");
        let csv_path = temp_dir.path().join("assessments.csv");

        // First rollup
        let mut sink = crate::wal::JsonlSink::new(&wal_path);
        sink.append(&create_test_record(SymptomCategory::Pain))
            .unwrap();
        let count1 = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count1, 1);

        // Second rollup (appends)
        let mut sink = crate::wal::JsonlSink::new(&wal_path);
        sink.append(&create_test_record(SymptomCategory::Urinary))
            .unwrap();
        let count2 = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count2, 1);

        // Verify CSV has both entries
        let reader = csv::Reader::from_path(&csv_path).unwrap();
        let record_count = reader.into_records().count();
        assert_eq!(record_count, 2);
    }

    #[test]
    fn test_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("empty.wal");
        let csv_path = temp_dir.path().join("assessments.csv");

        // Create empty WAL
        File::create(&wal_path).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();

        // Create some processed WAL files
        File::create(temp_dir.path().join("a1.wal.processed")).unwrap();
        File::create(temp_dir.path().join("a2.wal.processed")).unwrap();
        File::create(temp_dir.path().join("keep.wal")).unwrap();

        let count = cleanup_processed_wals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);

        // Verify only .processed files were removed
        assert!(!temp_dir.path().join("a1.wal.processed").exists());
        assert!(!temp_dir.path().join("a2.wal.processed").exists());
        assert!(temp_dir.path().join("keep.wal").exists());
    }

    #[test]
    fn test_mark_resolved_in_csv_archive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("assessments.wal");
        let csv_path = temp_dir.path().join("assessments.csv");

        let target = create_test_record(SymptomCategory::Urinary);
        let other = create_test_record(SymptomCategory::Skin);
        let mut sink = crate::wal::JsonlSink::new(&wal_path);
        sink.append(&target).unwrap();
        sink.append(&other).unwrap();
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        assert!(mark_resolved_in_csv(&csv_path, target.id, Utc::now()).unwrap());
        // Unknown ids and missing files report false, not an error
        assert!(!mark_resolved_in_csv(&csv_path, uuid::Uuid::new_v4(), Utc::now()).unwrap());
        assert!(!mark_resolved_in_csv(
            &temp_dir.path().join("missing.csv"),
            target.id,
            Utc::now()
        )
        .unwrap());

        let records = crate::history::load_recent_records(&wal_path, &csv_path, 7).unwrap();
        let resolved = records.iter().find(|r| r.id == target.id).unwrap();
        assert!(resolved.resolved);
        assert!(resolved.resolved_at.is_some());
        let untouched = records.iter().find(|r| r.id == other.id).unwrap();
        assert!(!untouched.resolved);
    }

    #[test]
    fn test_session_export() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("contractions.csv");

        let t0 = Utc::now();
        let mut session = ContractionSession::new(t0);
        for i in 0..3 {
            let start = t0 + Duration::seconds(i * 300);
            session.start_contraction(start).unwrap();
            session
                .stop_contraction(start + Duration::seconds(60), None)
                .unwrap();
        }
        // An in-progress contraction is not exported
        session
            .start_contraction(t0 + Duration::seconds(1200))
            .unwrap();

        let count = session_to_csv(&session, &csv_path).unwrap();
        assert_eq!(count, 3);

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 3);
    }
}
