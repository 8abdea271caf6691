//! Triage engine mapping symptom reports to assessment recommendations.
//!
//! `assess` is a pure function: no side effects, no stored state, and
//! deterministic given identical input. Rules, in precedence order:
//! - Emergency-indicator short-circuit (overrides everything below)
//! - Baseline urgency from the (category, trimester) table
//! - Pain-scale thresholds (pain category only)
//! - Persistence escalation for constant, sustained symptoms
//! - Fixed monotonic urgency -> action mapping

use crate::{
    AssessmentAction, AssessmentRecommendation, Error, Result, SymptomCategory, SymptomDuration,
    SymptomFrequency, SymptomReport, TriageCatalog, UrgencyLevel,
};

/// Assess a symptom report against the catalog's rule tables
///
/// Returns `Error::Validation` for reports with an invalid shape (pain
/// scale outside 1-10, or a pain scale supplied for a non-pain category).
/// Invalid shape is rejected rather than ignored: clinical input that
/// contradicts itself should fail fast, not be silently dropped.
pub fn assess(catalog: &TriageCatalog, report: &SymptomReport) -> Result<AssessmentRecommendation> {
    validate_report(report)?;

    let mut call_provider_reasons: Vec<String> = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();

    let warning_signs = catalog
        .warning_signs
        .get(&report.category)
        .cloned()
        .unwrap_or_default();

    // Emergency short-circuit: any associated symptom matching the
    // indicator table forces critical/emergency regardless of every other
    // field. This intentionally bypasses the urgency -> action mapping
    // below; do not fold it into that mapping.
    let emergency_reasons: Vec<String> = report
        .associated_symptoms
        .iter()
        .filter_map(|label| catalog.matches_emergency_indicator(label))
        .map(String::from)
        .collect();

    if !emergency_reasons.is_empty() {
        tracing::warn!(
            reasons = ?emergency_reasons,
            "Emergency indicators present, short-circuiting to emergency"
        );
        return Ok(AssessmentRecommendation {
            urgency: UrgencyLevel::Critical,
            action: AssessmentAction::Emergency,
            recommendations: catalog
                .action_guidance
                .get(&AssessmentAction::Emergency)
                .cloned()
                .unwrap_or_default(),
            emergency_reasons,
            call_provider_reasons,
            self_care_instructions: Vec::new(),
            warning_signs,
        });
    }

    // Baseline from the (category, trimester) table
    let mut urgency = catalog.baseline(report.category, report.trimester);
    tracing::debug!(
        category = ?report.category,
        trimester = ?report.trimester,
        baseline = ?urgency,
        "Baseline urgency"
    );

    // Pain-scale thresholds (validation guarantees pain category here)
    if let Some(scale) = report.pain_scale {
        if scale >= 8 {
            urgency = urgency.at_least(UrgencyLevel::High);
            call_provider_reasons.push(format!("Severe pain level ({}/10)", scale));
        } else if scale >= 5 {
            urgency = urgency.at_least(UrgencyLevel::Moderate);
        }
    }

    // Persistence escalation: a constant symptom sustained for hours or
    // longer escalates one step beyond what the tables produced.
    if report.frequency == SymptomFrequency::Constant && report.duration >= SymptomDuration::Hours {
        urgency = urgency.step_up();
        tracing::debug!(escalated = ?urgency, "Constant sustained symptom, escalating one step");
    }

    // Daily-life impact adds a reason and a recommendation line but never
    // changes urgency on its own.
    if report.affecting_daily_life {
        call_provider_reasons.push("Significantly affecting daily activities".into());
        recommendations.push("Note how the symptom limits daily activities".into());
    }

    let action = action_for_urgency(urgency);

    if let Some(guidance) = catalog.action_guidance.get(&action) {
        recommendations.extend(guidance.iter().cloned());
    }

    let self_care_instructions = if action == AssessmentAction::SelfCare {
        catalog
            .self_care
            .get(&report.category)
            .cloned()
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    tracing::info!(urgency = ?urgency, action = ?action, "Assessment complete");

    Ok(AssessmentRecommendation {
        urgency,
        action,
        recommendations,
        emergency_reasons,
        call_provider_reasons,
        self_care_instructions,
        warning_signs,
    })
}

/// Fixed monotonic mapping from final urgency to recommended action.
///
/// The emergency short-circuit in `assess` is the one place this mapping
/// is bypassed.
fn action_for_urgency(urgency: UrgencyLevel) -> AssessmentAction {
    match urgency {
        UrgencyLevel::Low => AssessmentAction::SelfCare,
        UrgencyLevel::Moderate => AssessmentAction::Monitoring,
        UrgencyLevel::High => AssessmentAction::CallProvider,
        UrgencyLevel::Critical => AssessmentAction::Emergency,
    }
}

fn validate_report(report: &SymptomReport) -> Result<()> {
    match report.pain_scale {
        Some(scale) if report.category != SymptomCategory::Pain => Err(Error::Validation(format!(
            "pain scale {} supplied for non-pain category {:?}",
            scale, report.category
        ))),
        Some(scale) if !(1..=10).contains(&scale) => Err(Error::Validation(format!(
            "pain scale {} outside 1-10",
            scale
        ))),
        _ => Ok(()),
    }
}
