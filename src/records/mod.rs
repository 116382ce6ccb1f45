pub mod types;
pub mod store;
pub mod history;

pub use types::*;
pub use store::*;
pub use history::{Trend, TrendPoint};
