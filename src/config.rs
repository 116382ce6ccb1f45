use crate::cycle::PredictorConfig;
use crate::records::StoreConfig;
use crate::strip::StripReaderConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything the tracker needs, as one JSON document. Omitted sections
/// take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub strip: StripReaderConfig,
    pub predictor: PredictorConfig,
    pub store: StoreConfig,
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}
