//! 通知收件箱

pub mod api;
pub mod listener;
pub mod models;
pub mod service;

pub use api::{NotificationApi, NotificationBackend};
pub use listener::{EmptyNotificationListener, NotificationListener};
pub use models::{Notification, NotificationMetadata, NotificationType, Severity};
pub use service::NotificationCenter;
