//! Core domain types for the Natal triage system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Symptom reports and their classification axes
//! - Triage outputs (urgency, action, recommendation)
//! - Contractions and labor patterns
//! - Persisted assessment records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Symptom Report Types
// ============================================================================

/// Body-system category of a reported symptom
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SymptomCategory {
    Pain,
    Digestive,
    Bleeding,
    Respiratory,
    Neurological,
    Skin,
    Urinary,
    Emotional,
    Movement,
    Other,
}

impl SymptomCategory {
    /// All categories, for catalog completeness checks
    pub const ALL: [SymptomCategory; 10] = [
        SymptomCategory::Pain,
        SymptomCategory::Digestive,
        SymptomCategory::Bleeding,
        SymptomCategory::Respiratory,
        SymptomCategory::Neurological,
        SymptomCategory::Skin,
        SymptomCategory::Urinary,
        SymptomCategory::Emotional,
        SymptomCategory::Movement,
        SymptomCategory::Other,
    ];
}

/// How long the symptom has been present
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SymptomDuration {
    JustStarted,
    Hours,
    Days,
    WeekPlus,
}

/// How often the symptom occurs
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SymptomFrequency {
    Once,
    Intermittent,
    Constant,
}

/// Pregnancy trimester, used to contextualize symptom risk
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Trimester {
    First,
    Second,
    Third,
}

/// A structured symptom report, immutable once submitted
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymptomReport {
    pub category: SymptomCategory,
    pub duration: SymptomDuration,
    pub frequency: SymptomFrequency,
    /// 1-10, only meaningful (and only accepted) for the pain category
    pub pain_scale: Option<u8>,
    pub affecting_daily_life: bool,
    /// Free-form labels, matched against the emergency-indicator table
    pub associated_symptoms: Vec<String>,
    pub trimester: Trimester,
}

// ============================================================================
// Triage Output Types
// ============================================================================

/// Ordered triage severity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl UrgencyLevel {
    /// Escalate to at least the given level
    pub fn at_least(self, floor: UrgencyLevel) -> UrgencyLevel {
        self.max(floor)
    }

    /// Escalate one step, saturating at Critical
    pub fn step_up(self) -> UrgencyLevel {
        match self {
            UrgencyLevel::Low => UrgencyLevel::Moderate,
            UrgencyLevel::Moderate => UrgencyLevel::High,
            UrgencyLevel::High | UrgencyLevel::Critical => UrgencyLevel::Critical,
        }
    }
}

/// Recommended course of action.
///
/// Deliberately not `Ord`: action is a policy decision, not a severity
/// scale, and is not strictly monotonic with urgency (see the emergency
/// short-circuit in the engine).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentAction {
    SelfCare,
    Monitoring,
    CallProvider,
    VisitProvider,
    Emergency,
}

/// The result of a triage assessment, produced fresh per call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssessmentRecommendation {
    pub urgency: UrgencyLevel,
    pub action: AssessmentAction,
    /// General guidance lines for the chosen action
    pub recommendations: Vec<String>,
    /// Matched emergency indicators; empty unless the short-circuit fired
    pub emergency_reasons: Vec<String>,
    /// Reasons the provider should be contacted
    pub call_provider_reasons: Vec<String>,
    /// Populated only when the final action is self-care
    pub self_care_instructions: Vec<String>,
    /// Always populated from the category table, independent of urgency
    pub warning_signs: Vec<String>,
}

/// A persisted assessment: the report plus the recommendation it produced
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: Uuid,
    pub reported_at: DateTime<Utc>,
    pub report: SymptomReport,
    pub recommendation: AssessmentRecommendation,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AssessmentRecord {
    /// Wrap a report and its recommendation into a new unresolved record
    pub fn new(
        reported_at: DateTime<Utc>,
        report: SymptomReport,
        recommendation: AssessmentRecommendation,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reported_at,
            report,
            recommendation,
            resolved: false,
            resolved_at: None,
        }
    }
}

// ============================================================================
// Contraction Types
// ============================================================================

/// Subjective strength of a contraction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContractionIntensity {
    Mild,
    Moderate,
    Strong,
    VeryStrong,
}

/// A single timed contraction.
///
/// Duration and interval-from-previous are derived on read from the
/// session log; they are never stored separately.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contraction {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    /// None while the contraction is still in progress
    pub ended_at: Option<DateTime<Utc>>,
    pub intensity: Option<ContractionIntensity>,
}

impl Contraction {
    /// Open a new contraction at the given instant
    pub fn begin(at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: at,
            ended_at: None,
            intensity: None,
        }
    }

    /// Duration (end - start), undefined while the contraction is open
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// Labor-pattern classification derived from the recent contraction log.
///
/// Ordered from least to most advanced; `TimeToGo` means the 5-1-1 rule
/// (contractions 5 minutes apart, lasting 1 minute, for 1 hour) is met.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LaborPattern {
    Irregular,
    Establishing,
    Active,
    TimeToGo,
}

impl LaborPattern {
    /// Human-readable summary for display surfaces
    pub fn description(&self) -> &'static str {
        match self {
            LaborPattern::Irregular => "Contractions are irregular",
            LaborPattern::Establishing => "Pattern establishing",
            LaborPattern::Active => "Active pattern developing",
            LaborPattern::TimeToGo => "Time to call provider - 5-1-1 rule met",
        }
    }
}
