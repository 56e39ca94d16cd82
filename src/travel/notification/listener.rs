//! 通知监听器回调接口

use crate::travel::notification::models::Notification;
use async_trait::async_trait;

#[async_trait]
pub trait NotificationListener: Send + Sync {
    /// 通知列表变更，附带未读数
    async fn on_notifications_changed(&self, notifications: Vec<Notification>, unread: usize);
}

/// 默认空实现（无操作）
pub struct EmptyNotificationListener;

#[async_trait]
impl NotificationListener for EmptyNotificationListener {
    async fn on_notifications_changed(&self, _notifications: Vec<Notification>, _unread: usize) {}
}
