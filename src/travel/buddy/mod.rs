//! 搭子模块
//!
//! 匹配列表、搭子请求的发送/撤回/接受/拒绝，以及解除关系

pub mod api;
pub mod listener;
pub mod models;
pub mod service;
pub mod status;

pub use api::{BuddyApi, BuddyBackend};
pub use listener::{BuddyListener, EmptyBuddyListener};
pub use models::{filter_buddies, Buddy, BuddyMatch, BuddyRequest, RequestRecordStatus, RequestStatus};
pub use service::{BuddyManager, MatchQuery};
pub use status::derive_status;
