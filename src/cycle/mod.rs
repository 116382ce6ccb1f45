pub mod calendar;
pub mod predictor;

pub use calendar::*;
pub use predictor::*;
