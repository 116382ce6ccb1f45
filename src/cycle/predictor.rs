use crate::cycle::calendar::CycleEstimate;
use crate::records::history;
use crate::records::Observation;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// What the caller should act on. Measured LH evidence always wins over
/// the calendar estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Advisory {
    /// A surge was measured within the lookback window.
    PeakSignal,
    /// No surge measured, but today is near the estimated ovulation date.
    CalendarFertile,
    LowFertility,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Advisory::PeakSignal => "peak-signal",
            Advisory::CalendarFertile => "calendar-fertile",
            Advisory::LowFertility => "low-fertility",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub lookback_hours: i64,
    /// Ratio at or above which a reading counts as a surge.
    pub surge_value: f64,
    /// Case-insensitive substrings of a stored label that count as a surge.
    pub surge_labels: Vec<String>,
    /// Days either side of estimated ovulation treated as fertile.
    pub fertile_half_width_days: i64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 48,
            surge_value: 0.8,
            surge_labels: vec!["peak".to_string(), "high".to_string()],
            fertile_half_width_days: 2,
        }
    }
}

impl PredictorConfig {
    fn is_surge(&self, observation: &Observation) -> bool {
        if observation.value >= self.surge_value {
            return true;
        }
        let label = observation.label.to_lowercase();
        self.surge_labels
            .iter()
            .any(|marker| label.contains(&marker.to_lowercase()))
    }
}

pub fn predict(
    config: &PredictorConfig,
    estimate: &CycleEstimate,
    observations: &[Observation],
    now: NaiveDateTime,
) -> Advisory {
    let recent = history::recent_lh(observations, now, Duration::hours(config.lookback_hours));
    if recent.iter().any(|o| config.is_surge(o)) {
        debug!(recent = recent.len(), "LH surge within lookback");
        return Advisory::PeakSignal;
    }

    let days_from_ovulation = (now.date() - estimate.estimated_ovulation).num_days();
    if days_from_ovulation.abs() <= config.fertile_half_width_days {
        debug!(days_from_ovulation, "Inside calendar fertile window");
        Advisory::CalendarFertile
    } else {
        Advisory::LowFertility
    }
}
