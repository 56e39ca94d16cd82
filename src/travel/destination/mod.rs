//! 目的地推荐与行程收藏

pub mod api;
pub mod models;
pub mod service;

pub use api::{DestinationApi, DestinationBackend};
pub use models::{
    CategoryFilter, Destination, GroupAnalysis, RecommendedDestination, SaveOutcome,
    SavedDestination,
};
pub use service::SavedDestinations;
