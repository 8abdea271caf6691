//! Default catalog of clinical triage rule tables.
//!
//! The emergency-indicator list, the category x trimester baseline
//! urgencies, and the per-category instruction/warning lists are modeled
//! as immutable data rather than branching conditionals, so the clinical
//! policy is explicit and independently auditable.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<TriageCatalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
///
/// This function returns a reference to the pre-built catalog, avoiding
/// the overhead of rebuilding the rule tables on every assessment.
pub fn get_default_catalog() -> &'static TriageCatalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog with the built-in clinical rule tables
///
/// **Note**: For production use, prefer `get_default_catalog()` which
/// returns a cached reference. This function is retained for testing and
/// custom catalog creation.
pub fn build_default_catalog() -> TriageCatalog {
    build_default_catalog_internal()
}

/// The complete set of triage rule tables
#[derive(Clone, Debug)]
pub struct TriageCatalog {
    /// Normalized (lowercase) associated-symptom labels that force an
    /// emergency response regardless of every other field
    pub emergency_indicators: Vec<String>,
    /// Baseline urgency overrides keyed by (category, trimester); cells
    /// absent from the table default to Low
    pub baseline_urgency: HashMap<(SymptomCategory, Trimester), UrgencyLevel>,
    /// Self-care instructions keyed by category
    pub self_care: HashMap<SymptomCategory, Vec<String>>,
    /// Warning signs to watch, keyed by category
    pub warning_signs: HashMap<SymptomCategory, Vec<String>>,
    /// General guidance lines keyed by recommended action
    pub action_guidance: HashMap<AssessmentAction, Vec<String>>,
}

impl TriageCatalog {
    /// Baseline urgency for a (category, trimester) cell; Low if absent
    pub fn baseline(&self, category: SymptomCategory, trimester: Trimester) -> UrgencyLevel {
        self.baseline_urgency
            .get(&(category, trimester))
            .copied()
            .unwrap_or(UrgencyLevel::Low)
    }

    /// Check a free-form associated-symptom label against the emergency
    /// indicator table. Matching is case- and whitespace-insensitive.
    pub fn matches_emergency_indicator(&self, label: &str) -> Option<&str> {
        let normalized = label.trim().to_lowercase();
        self.emergency_indicators
            .iter()
            .find(|ind| **ind == normalized)
            .map(String::as_str)
    }

    /// Validate the catalog's internal consistency, returning any problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.emergency_indicators.is_empty() {
            errors.push("Catalog has no emergency indicators".to_string());
        }
        for ind in &self.emergency_indicators {
            if ind.trim().is_empty() {
                errors.push("Catalog has an empty emergency indicator".to_string());
            }
            if *ind != ind.trim().to_lowercase() {
                errors.push(format!("Emergency indicator '{}' is not normalized", ind));
            }
        }

        for category in SymptomCategory::ALL {
            match self.self_care.get(&category) {
                Some(lines) if !lines.is_empty() => {}
                _ => errors.push(format!(
                    "Category {:?} has no self-care instructions",
                    category
                )),
            }
            match self.warning_signs.get(&category) {
                Some(lines) if !lines.is_empty() => {}
                _ => errors.push(format!("Category {:?} has no warning signs", category)),
            }
        }

        for action in [
            AssessmentAction::SelfCare,
            AssessmentAction::Monitoring,
            AssessmentAction::CallProvider,
            AssessmentAction::VisitProvider,
            AssessmentAction::Emergency,
        ] {
            match self.action_guidance.get(&action) {
                Some(lines) if !lines.is_empty() => {}
                _ => errors.push(format!("Action {:?} has no guidance lines", action)),
            }
        }

        // Bleeding must never start below High in any trimester
        for trimester in [Trimester::First, Trimester::Second, Trimester::Third] {
            if self.baseline(SymptomCategory::Bleeding, trimester) < UrgencyLevel::High {
                errors.push(format!(
                    "Bleeding baseline in {:?} trimester is below High",
                    trimester
                ));
            }
        }

        errors
    }
}

/// Internal function that actually builds the catalog
fn build_default_catalog_internal() -> TriageCatalog {
    let emergency_indicators = vec![
        "heavy bleeding".into(),
        "severe pain".into(),
        "fever".into(),
        "vision changes".into(),
        "chest pain".into(),
        "difficulty breathing".into(),
        "severe headache".into(),
        "fainting".into(),
    ];

    // ========================================================================
    // Baseline urgency by (category, trimester)
    // ========================================================================

    let mut baseline_urgency = HashMap::new();

    // Bleeding is inherently more urgent than other categories at equal
    // severity, and rises further late in pregnancy.
    baseline_urgency.insert(
        (SymptomCategory::Bleeding, Trimester::First),
        UrgencyLevel::High,
    );
    baseline_urgency.insert(
        (SymptomCategory::Bleeding, Trimester::Second),
        UrgencyLevel::High,
    );
    baseline_urgency.insert(
        (SymptomCategory::Bleeding, Trimester::Third),
        UrgencyLevel::Critical,
    );

    // Decreased fetal movement only becomes assessable once movement is
    // established.
    baseline_urgency.insert(
        (SymptomCategory::Movement, Trimester::First),
        UrgencyLevel::Moderate,
    );
    baseline_urgency.insert(
        (SymptomCategory::Movement, Trimester::Second),
        UrgencyLevel::High,
    );
    baseline_urgency.insert(
        (SymptomCategory::Movement, Trimester::Third),
        UrgencyLevel::High,
    );

    // Breathing/heart complaints warrant monitoring in every trimester.
    for trimester in [Trimester::First, Trimester::Second, Trimester::Third] {
        baseline_urgency.insert(
            (SymptomCategory::Respiratory, trimester),
            UrgencyLevel::Moderate,
        );
    }

    // Headache/vision complaints in the preeclampsia window.
    baseline_urgency.insert(
        (SymptomCategory::Neurological, Trimester::Third),
        UrgencyLevel::Moderate,
    );

    // ========================================================================
    // Self-care instructions by category
    // ========================================================================

    let mut self_care = HashMap::new();

    self_care.insert(
        SymptomCategory::Pain,
        vec![
            "Move slowly when changing positions".into(),
            "Apply a warm compress to the affected area".into(),
            "Rest in a comfortable position".into(),
            "Try gentle prenatal stretching".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Digestive,
        vec![
            "Eat small, frequent meals".into(),
            "Stay hydrated with small sips".into(),
            "Avoid trigger foods and smells".into(),
            "Don't lie down right after eating".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Bleeding,
        vec![
            "Wear a panty liner and track amount and color".into(),
            "Rest and avoid strenuous activity".into(),
            "Stay hydrated".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Respiratory,
        vec![
            "Sit or stand up straight".into(),
            "Sleep propped up on pillows".into(),
            "Take breaks during activities".into(),
            "Practice slow breathing exercises".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Neurological,
        vec![
            "Rest in a dark, quiet room".into(),
            "Apply a cold compress".into(),
            "Stay hydrated".into(),
            "Check blood pressure if possible".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Skin,
        vec![
            "Moisturize regularly".into(),
            "Use fragrance-free products".into(),
            "Wear loose, breathable clothing".into(),
            "Avoid hot showers".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Urinary,
        vec![
            "Drink plenty of water".into(),
            "Urinate frequently, don't hold it".into(),
            "Wear cotton underwear".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Emotional,
        vec![
            "Talk to your support system".into(),
            "Prioritize adequate sleep".into(),
            "Practice relaxation techniques".into(),
            "Limit stressors where possible".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Movement,
        vec![
            "Lie on your left side".into(),
            "Drink cold water or juice".into(),
            "Eat a snack".into(),
            "Do kick counts in a quiet environment".into(),
        ],
    );
    self_care.insert(
        SymptomCategory::Other,
        vec![
            "Rest and monitor the symptom".into(),
            "Keep notes on timing and triggers".into(),
            "Stay hydrated".into(),
        ],
    );

    // ========================================================================
    // Warning signs by category
    // ========================================================================

    let mut warning_signs = HashMap::new();

    warning_signs.insert(
        SymptomCategory::Pain,
        vec![
            "Severe or constant pain".into(),
            "Pain with bleeding".into(),
            "Pain with fever".into(),
            "Pain with regular contractions".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Digestive,
        vec![
            "Can't keep fluids down".into(),
            "Weight loss".into(),
            "Dark urine or dizziness".into(),
            "Blood in vomit".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Bleeding,
        vec![
            "Soaking a pad in an hour".into(),
            "Bright red blood or large clots".into(),
            "Bleeding with cramping".into(),
            "Dizziness or fainting".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Respiratory,
        vec![
            "Sudden onset shortness of breath".into(),
            "Chest pain".into(),
            "Rapid heartbeat".into(),
            "Blue lips or fingers".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Neurological,
        vec![
            "Vision changes".into(),
            "Sudden severe headache".into(),
            "Swelling of face or hands".into(),
            "Upper abdominal pain".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Skin,
        vec![
            "Intense itching, especially palms and soles".into(),
            "Yellowing of skin or eyes".into(),
            "Rash with fever".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Urinary,
        vec![
            "Fever or chills".into(),
            "Back pain".into(),
            "Blood in urine".into(),
            "Burning with urination".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Emotional,
        vec![
            "Thoughts of self-harm".into(),
            "Panic attacks".into(),
            "Unable to function day to day".into(),
            "Persistent sadness beyond two weeks".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Movement,
        vec![
            "No movement for 2 hours".into(),
            "Significant change in movement pattern".into(),
            "No response to stimulation".into(),
        ],
    );
    warning_signs.insert(
        SymptomCategory::Other,
        vec![
            "Symptom rapidly worsening".into(),
            "Fever over 100.4F".into(),
            "Symptom combined with bleeding or severe pain".into(),
        ],
    );

    // ========================================================================
    // Guidance lines by action
    // ========================================================================

    let mut action_guidance = HashMap::new();

    action_guidance.insert(
        AssessmentAction::SelfCare,
        vec![
            "Try the self-care measures below".into(),
            "Call your provider if symptoms worsen".into(),
        ],
    );
    action_guidance.insert(
        AssessmentAction::Monitoring,
        vec![
            "Monitor symptoms closely".into(),
            "Try self-care measures".into(),
            "Call your provider if symptoms worsen".into(),
        ],
    );
    action_guidance.insert(
        AssessmentAction::CallProvider,
        vec![
            "Call your provider's office".into(),
            "Discuss symptoms with the nurse line".into(),
            "Follow their guidance".into(),
        ],
    );
    action_guidance.insert(
        AssessmentAction::VisitProvider,
        vec![
            "Contact your provider today".into(),
            "Request an urgent appointment".into(),
            "Monitor symptoms closely in the meantime".into(),
        ],
    );
    action_guidance.insert(
        AssessmentAction::Emergency,
        vec![
            "Seek immediate medical attention".into(),
            "Call 911 or go to the emergency room".into(),
            "Do not wait or drive yourself if severe".into(),
        ],
    );

    TriageCatalog {
        emergency_indicators,
        baseline_urgency,
        self_care,
        warning_signs,
        action_guidance,
    }
}
