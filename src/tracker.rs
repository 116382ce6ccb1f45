use crate::config::TrackerConfig;
use crate::cycle::{self, Advisory, CycleEstimate, CycleSettings, PredictorConfig};
use crate::records::{history, Observation, RecordLog, RecordStore, StoreError, Trend};
use crate::strip::{StripError, StripReader, StripReading};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Strip(#[from] StripError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the cycle stands right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStatus {
    pub estimate: CycleEstimate,
    pub advisory: Advisory,
}

/// Entry point for the UI: reads strips, keeps the log, answers
/// "what now". Holds no cycle settings of its own.
pub struct Tracker<S> {
    reader: StripReader,
    predictor: PredictorConfig,
    store: S,
}

impl Tracker<RecordLog> {
    pub fn from_config(config: &TrackerConfig) -> Result<Self, StoreError> {
        Ok(Self::new(
            StripReader::new(config.strip.clone()),
            config.predictor.clone(),
            RecordLog::from_config(&config.store)?,
        ))
    }
}

impl<S: RecordStore> Tracker<S> {
    pub fn new(reader: StripReader, predictor: PredictorConfig, store: S) -> Self {
        Self {
            reader,
            predictor,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn predictor_config(&self) -> &PredictorConfig {
        &self.predictor
    }

    /// Analyze without logging, for previews the user may discard.
    pub fn analyze(&self, image_bytes: &[u8]) -> Result<StripReading, StripError> {
        self.reader.analyze(image_bytes)
    }

    pub fn log_reading(
        &self,
        reading: &StripReading,
        now: NaiveDateTime,
        note: &str,
    ) -> Result<Observation, StoreError> {
        let observation = Observation::lh_reading(now, reading, note);
        self.store.append(&observation)?;
        Ok(observation)
    }

    pub fn analyze_and_log(
        &self,
        image_bytes: &[u8],
        now: NaiveDateTime,
        note: &str,
    ) -> Result<StripReading, TrackerError> {
        let reading = self.reader.analyze(image_bytes)?;
        self.log_reading(&reading, now, note)?;
        info!(ratio = reading.ratio, level = %reading.level, note, "Logged strip reading");
        Ok(reading)
    }

    /// At most one intimacy entry per calendar day. Returns whether one was written.
    pub fn log_intimacy(&self, now: NaiveDateTime) -> Result<bool, StoreError> {
        let observations = self.store.read_all()?;
        if history::has_intimacy_on(&observations, now.date()) {
            info!(date = %now.date(), "Intimacy already logged today");
            return Ok(false);
        }
        self.store.append(&Observation::intimacy(now))?;
        Ok(true)
    }

    pub fn status(&self, settings: &CycleSettings, now: NaiveDateTime) -> Result<CycleStatus, StoreError> {
        let observations = self.store.read_all()?;
        let estimate = cycle::estimate(settings, now.date());
        let advisory = cycle::predict(&self.predictor, &estimate, &observations, now);
        info!(cycle_day = estimate.cycle_day, advisory = %advisory, "Computed cycle status");
        Ok(CycleStatus { estimate, advisory })
    }

    pub fn trend(&self) -> Result<Trend, StoreError> {
        Ok(Trend::from_history(&self.store.read_all()?))
    }

    /// Whether a fresh reading is high enough to re-test every few hours.
    pub fn suggests_retest(&self, reading: &StripReading) -> bool {
        reading.suggests_retest(self.predictor.surge_value)
    }
}
