use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hormone level read off a strip, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LhLevel {
    Peak,
    High,
    Low,
    Negative,
}

impl LhLevel {
    /// The label stored alongside a reading in the record log.
    pub fn as_str(&self) -> &'static str {
        match self {
            LhLevel::Peak => "Peak",
            LhLevel::High => "High",
            LhLevel::Low => "Low",
            LhLevel::Negative => "Negative",
        }
    }
}

impl fmt::Display for LhLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower bounds of each band. Evaluated high to low, first match wins.
/// Strip brands calibrate differently, so these are tunable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripThresholds {
    pub peak: f64,
    pub high: f64,
    pub low: f64,
}

impl Default for StripThresholds {
    fn default() -> Self {
        Self {
            peak: 1.0,
            high: 0.6,
            low: 0.3,
        }
    }
}

impl StripThresholds {
    pub fn classify(&self, ratio: f64) -> LhLevel {
        if ratio >= self.peak {
            LhLevel::Peak
        } else if ratio >= self.high {
            LhLevel::High
        } else if ratio >= self.low {
            LhLevel::Low
        } else {
            LhLevel::Negative
        }
    }
}

/// Tunables for the strip reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripReaderConfig {
    /// Fraction of the image width trimmed on both sides of each half.
    pub margin_fraction: f64,
    /// Control peaks below this (0-255 scale) count as no visible C line.
    pub control_floor: f64,
    /// Denominator used when the control line is unreadable.
    pub control_fallback: f64,
    pub thresholds: StripThresholds,
}

impl Default for StripReaderConfig {
    fn default() -> Self {
        Self {
            margin_fraction: 0.05,
            control_floor: 30.0,
            control_fallback: 255.0,
            thresholds: StripThresholds::default(),
        }
    }
}

/// Whether the control line was strong enough to divide by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlLine {
    Detected,
    /// Peak fell under the floor; the ratio was computed against the
    /// fallback denominator and is biased low.
    Unreadable,
}

/// Column window of the inverted luminance grid, with its per-column means.
/// Lives only for the duration of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct StripRegion {
    pub start: u32,
    pub end: u32,
    pub profile: Vec<f64>,
}

impl StripRegion {
    /// Highest column mean. An empty window has no ink, so 0.
    pub fn peak(&self) -> f64 {
        self.profile.iter().copied().fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripReading {
    pub ratio: f64,
    pub level: LhLevel,
    pub control: ControlLine,
    pub test_peak: f64,
    pub control_peak: f64,
}

impl StripReading {
    pub fn label(&self) -> &'static str {
        self.level.as_str()
    }

    /// A surging reading is worth re-testing every few hours to catch the peak.
    pub fn suggests_retest(&self, surge_value: f64) -> bool {
        self.ratio >= surge_value
    }
}

#[derive(Debug, Error)]
pub enum StripError {
    #[error("could not decode strip image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unsupported image format {0:?}, expected JPEG or PNG")]
    UnsupportedFormat(image::ImageFormat),
    #[error("strip image has no area ({width}x{height})")]
    DegenerateImage { width: u32, height: u32 },
}

impl StripError {
    /// Both malformed bytes and non-raster formats are decode failures to the caller.
    pub fn is_decode(&self) -> bool {
        matches!(self, StripError::Decode(_) | StripError::UnsupportedFormat(_))
    }
}
