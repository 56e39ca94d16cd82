//! 旅行偏好与兴趣标签

pub mod api;
pub mod models;
pub mod service;

pub use api::{PreferenceApi, PreferenceBackend};
pub use models::{
    BudgetRange, Interest, InterestId, Preferences, PreferencesPayload, TravelStyle, TripDuration,
};
pub use service::PreferenceStore;
