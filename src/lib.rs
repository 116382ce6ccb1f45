pub mod config;
pub mod cycle;
pub mod records;
pub mod strip;
pub mod tracker;

// Re-export specific items for convenient access
pub use config::TrackerConfig;
pub use tracker::{CycleStatus, Tracker, TrackerError};
