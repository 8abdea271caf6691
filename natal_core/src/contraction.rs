//! Contraction session tracking and labor-pattern classification.
//!
//! A session holds an append-only chronological log of completed
//! contractions plus at most one in-progress contraction. Averages and
//! the 5-1-1 classification are derived from the log on read; nothing is
//! separately mutated.
//!
//! Intervals are start-to-start per standard obstetric convention.

use crate::{Contraction, ContractionIntensity, Error, LaborPattern, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trailing window used for pattern classification, in seconds
pub const PATTERN_WINDOW_SECS: i64 = 3600;

/// Trailing window used for pattern classification
pub fn pattern_window() -> Duration {
    Duration::seconds(PATTERN_WINDOW_SECS)
}

/// Minimum completed contractions in the window before any pattern is
/// reported
const MIN_PATTERN_SAMPLE: usize = 3;

// 5-1-1 thresholds and the looser buckets below them, in seconds
const TIME_TO_GO_INTERVAL_SECS: i64 = 300;
const TIME_TO_GO_DURATION_SECS: i64 = 60;
const ACTIVE_INTERVAL_SECS: i64 = 420;
const ESTABLISHING_INTERVAL_SECS: i64 = 600;

/// An ordered log of timed contractions plus at most one open contraction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractionSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Completed contractions, insertion order = chronological order
    pub contractions: Vec<Contraction>,
    /// The in-progress contraction, if one is being timed
    pub current: Option<Contraction>,
}

impl Default for ContractionSession {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl ContractionSession {
    /// Start a fresh session at the given instant
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: at,
            contractions: Vec::new(),
            current: None,
        }
    }

    /// Whether a contraction is currently being timed
    pub fn is_timing(&self) -> bool {
        self.current.is_some()
    }

    /// Open a new contraction.
    ///
    /// Errors if one is already open: auto-closing would fabricate an end
    /// time the user never marked, so a double start must surface instead.
    pub fn start_contraction(&mut self, at: DateTime<Utc>) -> Result<&Contraction> {
        if self.current.is_some() {
            return Err(Error::Session(
                "a contraction is already in progress".into(),
            ));
        }
        tracing::debug!(%at, "Starting contraction");
        self.current = Some(Contraction::begin(at));
        Ok(self.current.as_ref().unwrap())
    }

    /// Close the open contraction and append it to the log.
    ///
    /// Errors if no contraction is open or if `at` precedes its start.
    pub fn stop_contraction(
        &mut self,
        at: DateTime<Utc>,
        intensity: Option<ContractionIntensity>,
    ) -> Result<&Contraction> {
        let mut contraction = self
            .current
            .take()
            .ok_or_else(|| Error::Session("no contraction in progress".into()))?;

        if at < contraction.started_at {
            // Put the open contraction back so the session stays valid
            let started_at = contraction.started_at;
            self.current = Some(contraction);
            return Err(Error::Session(format!(
                "stop time {} precedes start time {}",
                at, started_at
            )));
        }

        contraction.ended_at = Some(at);
        contraction.intensity = intensity;
        tracing::debug!(
            duration_secs = (at - contraction.started_at).num_seconds(),
            "Stopped contraction"
        );
        self.contractions.push(contraction);
        Ok(self.contractions.last().unwrap())
    }

    /// Remove a logged contraction by id, returning whether it existed
    pub fn remove_contraction(&mut self, id: Uuid) -> bool {
        let before = self.contractions.len();
        self.contractions.retain(|c| c.id != id);
        before != self.contractions.len()
    }

    /// Clear the log and any in-progress contraction
    pub fn reset(&mut self) {
        self.contractions.clear();
        self.current = None;
    }

    /// Elapsed time of the in-progress contraction, if any
    pub fn elapsed_in_progress(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.current.as_ref().map(|c| now - c.started_at)
    }

    /// Start-to-start interval preceding the contraction at `index`.
    ///
    /// `None` for the first contraction, which has no predecessor.
    pub fn interval_before(&self, index: usize) -> Option<Duration> {
        if index == 0 || index >= self.contractions.len() {
            return None;
        }
        Some(self.contractions[index].started_at - self.contractions[index - 1].started_at)
    }

    /// All start-to-start intervals between consecutive logged contractions
    pub fn intervals(&self) -> Vec<Duration> {
        self.contractions
            .windows(2)
            .map(|pair| pair[1].started_at - pair[0].started_at)
            .collect()
    }

    /// Mean duration over the full log; `None` with an empty log
    pub fn average_duration_all(&self) -> Option<Duration> {
        mean(self.contractions.iter().filter_map(Contraction::duration))
    }

    /// Mean start-to-start interval over the full log; `None` with fewer
    /// than two contractions
    pub fn average_interval_all(&self) -> Option<Duration> {
        mean(self.intervals().into_iter())
    }

    /// Mean duration over contractions started within `window` of `now`
    pub fn average_duration_recent(&self, now: DateTime<Utc>, window: Duration) -> Option<Duration> {
        let cutoff = now - window;
        mean(
            self.contractions
                .iter()
                .filter(|c| c.started_at >= cutoff)
                .filter_map(Contraction::duration),
        )
    }

    /// Mean start-to-start interval over pairs whose later contraction
    /// started within `window` of `now`
    pub fn average_interval_recent(&self, now: DateTime<Utc>, window: Duration) -> Option<Duration> {
        let cutoff = now - window;
        mean(
            self.contractions
                .windows(2)
                .filter(|pair| pair[1].started_at >= cutoff)
                .map(|pair| pair[1].started_at - pair[0].started_at),
        )
    }

    /// Time from the earliest logged contraction to `now`; zero with an
    /// empty log
    pub fn observed_span(&self, now: DateTime<Utc>) -> Duration {
        self.contractions
            .first()
            .map(|c| now - c.started_at)
            .unwrap_or_else(Duration::zero)
    }

    /// Classify the labor pattern from the trailing one-hour window.
    ///
    /// Averages come from the trailing window only, so stale data never
    /// counts. The "for 1 hour" leg of the 5-1-1 rule additionally
    /// requires the log to span at least the window: a tight pattern
    /// observed for only a few minutes caps at `Active` until a full
    /// hour has been watched. Tightening the average interval never
    /// downgrades the bucket.
    pub fn classify_pattern(&self, now: DateTime<Utc>) -> LaborPattern {
        let cutoff = now - pattern_window();
        let recent: Vec<&Contraction> = self
            .contractions
            .iter()
            .filter(|c| c.started_at >= cutoff && c.ended_at.is_some())
            .collect();

        if recent.len() < MIN_PATTERN_SAMPLE {
            return LaborPattern::Irregular;
        }

        let avg_duration = match mean(recent.iter().filter_map(|c| c.duration())) {
            Some(d) => d,
            None => return LaborPattern::Irregular,
        };
        let avg_interval = match self.average_interval_recent(now, pattern_window()) {
            Some(i) => i,
            None => return LaborPattern::Irregular,
        };

        tracing::debug!(
            avg_duration_secs = avg_duration.num_seconds(),
            avg_interval_secs = avg_interval.num_seconds(),
            sample = recent.len(),
            "Classifying contraction pattern"
        );

        if avg_interval.num_seconds() <= TIME_TO_GO_INTERVAL_SECS
            && avg_duration.num_seconds() >= TIME_TO_GO_DURATION_SECS
            && self.observed_span(now) >= pattern_window()
        {
            LaborPattern::TimeToGo
        } else if avg_interval.num_seconds() <= ACTIVE_INTERVAL_SECS {
            LaborPattern::Active
        } else if avg_interval.num_seconds() <= ESTABLISHING_INTERVAL_SECS {
            LaborPattern::Establishing
        } else {
            LaborPattern::Irregular
        }
    }
}

fn mean(durations: impl Iterator<Item = Duration>) -> Option<Duration> {
    let mut total_ms: i64 = 0;
    let mut count: i64 = 0;
    for d in durations {
        total_ms += d.num_milliseconds();
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(Duration::milliseconds(total_ms / count))
    }
}
