//! 地点自动补全模块

pub mod models;
pub mod search;

pub use models::{LocationData, NominatimAddress, NominatimResult};
pub use search::{LocationSearch, SearchOutcome};
