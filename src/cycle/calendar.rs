use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_CYCLE_LENGTH: u32 = 21;
pub const MAX_CYCLE_LENGTH: u32 = 40;

/// Luteal phase length assumed by the calendar method.
pub const LUTEAL_PHASE_DAYS: i64 = 14;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("cycle length {0} days is outside 21..=40")]
    CycleLengthOutOfRange(u32),
}

/// Caller-owned cycle configuration. The core never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCycleSettings")]
pub struct CycleSettings {
    last_period_start: NaiveDate,
    cycle_length_days: u32,
}

#[derive(Deserialize)]
struct RawCycleSettings {
    last_period_start: NaiveDate,
    cycle_length_days: u32,
}

impl TryFrom<RawCycleSettings> for CycleSettings {
    type Error = SettingsError;

    fn try_from(raw: RawCycleSettings) -> Result<Self, Self::Error> {
        CycleSettings::new(raw.last_period_start, raw.cycle_length_days)
    }
}

impl CycleSettings {
    pub fn new(last_period_start: NaiveDate, cycle_length_days: u32) -> Result<Self, SettingsError> {
        if !(MIN_CYCLE_LENGTH..=MAX_CYCLE_LENGTH).contains(&cycle_length_days) {
            return Err(SettingsError::CycleLengthOutOfRange(cycle_length_days));
        }
        Ok(Self {
            last_period_start,
            cycle_length_days,
        })
    }

    pub fn last_period_start(&self) -> NaiveDate {
        self.last_period_start
    }

    pub fn cycle_length_days(&self) -> u32 {
        self.cycle_length_days
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleEstimate {
    /// Day 1 is the period start itself. Stale settings can push this
    /// below 1 or past the cycle length.
    pub cycle_day: i64,
    pub estimated_ovulation: NaiveDate,
}

pub fn estimate(settings: &CycleSettings, today: NaiveDate) -> CycleEstimate {
    let lmp = settings.last_period_start;
    CycleEstimate {
        cycle_day: (today - lmp).num_days() + 1,
        estimated_ovulation: lmp
            + Duration::days(settings.cycle_length_days as i64 - LUTEAL_PHASE_DAYS),
    }
}
