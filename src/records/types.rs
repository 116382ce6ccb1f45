use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::strip::StripReading;

/// Format dates are written in.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Older logs were written at minute precision, or by hand.
const LEGACY_DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

pub const INTIMACY_LABEL: &str = "Logged";

/// What an observation records. Kinds written by newer versions
/// survive a read/write cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObservationKind {
    LhReading,
    Intimacy,
    Other(String),
}

impl ObservationKind {
    pub fn as_str(&self) -> &str {
        match self {
            ObservationKind::LhReading => "lh",
            ObservationKind::Intimacy => "intimacy",
            ObservationKind::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "lh" => ObservationKind::LhReading,
            "intimacy" => ObservationKind::Intimacy,
            other => ObservationKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ObservationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObservationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ObservationKind::parse(&raw))
    }
}

/// One logged event. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub kind: ObservationKind,
    pub value: f64,
    /// Classification captured at creation; never recomputed.
    pub label: String,
    pub note: String,
}

impl Observation {
    /// Timestamps are kept at second precision, the resolution of the log.
    pub fn new(
        timestamp: NaiveDateTime,
        kind: ObservationKind,
        value: f64,
        label: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(0),
            kind,
            value,
            label: label.into(),
            note: note.into(),
        }
    }

    pub fn lh_reading(timestamp: NaiveDateTime, reading: &StripReading, note: impl Into<String>) -> Self {
        Self::new(
            timestamp,
            ObservationKind::LhReading,
            reading.ratio,
            reading.label(),
            note,
        )
    }

    pub fn intimacy(timestamp: NaiveDateTime) -> Self {
        Self::new(timestamp, ObservationKind::Intimacy, 1.0, INTIMACY_LABEL, "")
    }

    pub fn is_lh(&self) -> bool {
        self.kind == ObservationKind::LhReading
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn to_row(&self) -> RecordRow {
        RecordRow {
            date: self.timestamp.format(DATE_FORMAT).to_string(),
            kind: self.kind.to_string(),
            value: self.value,
            status: self.label.clone(),
            note: self.note.clone(),
            extra: serde_json::Map::new(),
        }
    }

    /// Rows with a missing or unparseable date fall back to the Unix epoch
    /// (`NaiveDateTime::default()`),
    /// which orders them first and keeps them out of every lookback window.
    pub fn from_row(row: &RecordRow) -> Self {
        let timestamp = parse_timestamp(&row.date).unwrap_or_else(|| {
            tracing::warn!(date = %row.date, "Record has no usable date, using epoch");
            NaiveDateTime::default()
        });
        Self {
            timestamp,
            kind: ObservationKind::parse(&row.kind),
            value: row.value,
            label: row.status.clone(),
            note: row.note.clone(),
        }
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, DATE_FORMAT) {
        return Some(ts);
    }
    for format in LEGACY_DATE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Persisted row layout shared by every backend. Every column defaults when
/// absent so legacy rows still load; unknown columns are carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub note: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// Spreadsheets hand back nulls for blank cells and numbers for numeric-looking text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or_default(),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or_default(),
        serde_json::Value::Bool(b) => f64::from(u8::from(b)),
        _ => 0.0,
    })
}
