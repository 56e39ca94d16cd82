//! 通知中心
//!
//! 本地列表只在后端确认后更新：全部已读成功才把本地条目置为已读，清空成功才清空。

use crate::travel::error::ApiResult;
use crate::travel::notification::api::NotificationBackend;
use crate::travel::notification::listener::{EmptyNotificationListener, NotificationListener};
use crate::travel::notification::models::Notification;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

pub struct NotificationCenter {
    backend: Arc<dyn NotificationBackend>,
    listener: Arc<dyn NotificationListener>,
    items: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        Self::with_listener(backend, Arc::new(EmptyNotificationListener))
    }

    pub fn with_listener(
        backend: Arc<dyn NotificationBackend>,
        listener: Arc<dyn NotificationListener>,
    ) -> Self {
        Self {
            backend,
            listener,
            items: Mutex::new(Vec::new()),
        }
    }

    pub async fn items(&self) -> Vec<Notification> {
        self.items.lock().await.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.items.lock().await.iter().filter(|n| !n.is_read).count()
    }

    pub async fn refresh(&self) -> ApiResult<Vec<Notification>> {
        let list = self.backend.list().await.map_err(|e| {
            error!("[Notify] ❌ 拉取通知失败: {}", e);
            e
        })?;
        *self.items.lock().await = list.clone();
        info!("[Notify] ✅ 通知 {} 条", list.len());
        self.publish().await;
        Ok(list)
    }

    pub async fn mark_all_read(&self) -> ApiResult<()> {
        self.backend.mark_all_read().await.map_err(|e| {
            error!("[Notify] ❌ 全部已读失败: {}", e);
            e
        })?;
        for n in self.items.lock().await.iter_mut() {
            n.is_read = true;
        }
        self.publish().await;
        Ok(())
    }

    pub async fn clear_all(&self) -> ApiResult<()> {
        self.backend.clear_all().await.map_err(|e| {
            error!("[Notify] ❌ 清空通知失败: {}", e);
            e
        })?;
        self.items.lock().await.clear();
        self.publish().await;
        Ok(())
    }

    async fn publish(&self) {
        let items = self.items().await;
        let unread = items.iter().filter(|n| !n.is_read).count();
        self.listener.on_notifications_changed(items, unread).await;
    }
}
