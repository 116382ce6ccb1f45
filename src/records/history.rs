use crate::records::types::{Observation, ObservationKind};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Stable sort, so equal timestamps keep insertion order.
pub fn sort_chronological(observations: &mut [Observation]) {
    observations.sort_by_key(|o| o.timestamp);
}

/// LH readings taken in `(now - lookback, now]`.
pub fn recent_lh(observations: &[Observation], now: NaiveDateTime, lookback: Duration) -> Vec<&Observation> {
    let since = now - lookback;
    observations
        .iter()
        .filter(|o| o.is_lh() && o.timestamp > since && o.timestamp <= now)
        .collect()
}

pub fn has_intimacy_on(observations: &[Observation], date: NaiveDate) -> bool {
    observations
        .iter()
        .any(|o| o.kind == ObservationKind::Intimacy && o.date() == date)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub ratio: f64,
}

/// The LH curve and the intimacy markers drawn over it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trend {
    pub lh: Vec<TrendPoint>,
    pub intimacy: Vec<NaiveDateTime>,
}

impl Trend {
    pub fn from_history(observations: &[Observation]) -> Self {
        let mut ordered: Vec<&Observation> = observations.iter().collect();
        ordered.sort_by_key(|o| o.timestamp);

        let mut trend = Trend::default();
        for o in ordered {
            match o.kind {
                ObservationKind::LhReading => trend.lh.push(TrendPoint {
                    timestamp: o.timestamp,
                    ratio: o.value,
                }),
                ObservationKind::Intimacy => trend.intimacy.push(o.timestamp),
                ObservationKind::Other(_) => {}
            }
        }
        trend
    }

    pub fn is_empty(&self) -> bool {
        self.lh.is_empty() && self.intimacy.is_empty()
    }

    pub fn peak(&self) -> Option<TrendPoint> {
        self.lh
            .iter()
            .copied()
            .filter(|p| !p.ratio.is_nan())
            .fold(None, |best: Option<TrendPoint>, p| match best {
                Some(b) if b.ratio >= p.ratio => Some(b),
                _ => Some(p),
            })
    }
}
