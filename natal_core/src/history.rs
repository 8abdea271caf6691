//! Assessment history loading with a recent-days window.
//!
//! This module loads recent assessment history from both WAL and CSV
//! files so callers can show what was reported and what the engine
//! recommended.

use crate::{
    AssessmentRecommendation, AssessmentRecord, Error, Result, SymptomCategory, SymptomReport,
};
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// CSV row format for reading archived assessments
#[derive(Debug, Deserialize)]
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

/// Parse a serde `snake_case` enum value from its bare string form
fn parse_enum<T: serde::de::DeserializeOwned>(value: &str, what: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|e| Error::Other(format!("Invalid {} '{}': {}", what, value, e)))
}

impl TryFrom<CsvRow> for AssessmentRecord {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let reported_at = DateTime::parse_from_rfc3339(&row.reported_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let resolved_at = row
            .resolved_at
            .as_ref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let associated_symptoms = if row.associated_symptoms.is_empty() {
            Vec::new()
        } else {
            row.associated_symptoms
                .split(';')
                .map(String::from)
                .collect()
        };

        let report = SymptomReport {
            category: parse_enum(&row.category, "category")?,
            duration: parse_enum(&row.duration, "duration")?,
            frequency: parse_enum(&row.frequency, "frequency")?,
            pain_scale: row.pain_scale,
            affecting_daily_life: row.affecting_daily_life,
            associated_symptoms,
            trimester: parse_enum(&row.trimester, "trimester")?,
        };

        let recommendation = AssessmentRecommendation {
            urgency: parse_enum(&row.urgency, "urgency")?,
            action: parse_enum(&row.action, "action")?,
            // Guidance lists are not archived in CSV
            recommendations: vec![],
            emergency_reasons: vec![],
            call_provider_reasons: vec![],
            self_care_instructions: vec![],
            warning_signs: vec![],
        };

        Ok(AssessmentRecord {
            id,
            reported_at,
            report,
            recommendation,
            resolved: row.resolved,
            resolved_at,
        })
    }
}

/// Load assessments from the last N days from both WAL and CSV
///
/// Returns records sorted by reported_at (newest first).
/// Automatically deduplicates records that appear in both WAL and CSV.
pub fn load_recent_records(
    wal_path: &Path,
    csv_path: &Path,
    days: i64,
) -> Result<Vec<AssessmentRecord>> {
    let cutoff = Utc::now() - Duration::days(days);
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    // Load from WAL first (most recent)
    if wal_path.exists() {
        let wal_records = crate::wal::read_records(wal_path)?;
        for record in wal_records {
            if record.reported_at >= cutoff {
                seen_ids.insert(record.id);
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} assessments from WAL", records.len());
    }

    // Load from CSV (archived)
    if csv_path.exists() {
        let csv_records = load_records_from_csv(csv_path)?;
        let mut csv_count = 0;
        for record in csv_records {
            if record.reported_at >= cutoff && !seen_ids.contains(&record.id) {
                seen_ids.insert(record.id);
                records.push(record);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} assessments from CSV", csv_count);
    }

    // Sort by reported_at, newest first
    records.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));

    tracing::info!(
        "Loaded {} total assessments from last {} days",
        records.len(),
        days
    );

    Ok(records)
}

/// Load all assessments from a CSV file
fn load_records_from_csv(path: &Path) -> Result<Vec<AssessmentRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match AssessmentRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                    // Continue processing other rows
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(records)
}

/// Mark an assessment as resolved wherever it currently lives
///
/// Records still in the WAL are rewritten there; records already rolled
/// up are updated in the CSV archive. Errors if neither store holds the
/// id.
pub fn mark_resolved(wal_path: &Path, csv_path: &Path, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    if crate::wal::mark_resolved_in_wal(wal_path, id, at)? {
        return Ok(());
    }
    if crate::csv_rollup::mark_resolved_in_csv(csv_path, id, at)? {
        return Ok(());
    }
    Err(Error::Other(format!("No assessment found with id {}", id)))
}

/// Find the most recent assessment for a given category
pub fn find_last_by_category(
    records: &[AssessmentRecord],
    category: SymptomCategory,
) -> Option<&AssessmentRecord> {
    // Records should already be sorted newest first
    records.iter().find(|r| r.report.category == category)
}
