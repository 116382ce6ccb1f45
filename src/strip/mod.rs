pub mod types;
pub mod reader;

pub use types::*;
pub use reader::*;
