//! 通知 HTTP API 客户端

use crate::travel::error::ApiResult;
use crate::travel::http::HttpClient;
use crate::travel::notification::models::Notification;
use crate::travel::types::ListResponse;
use async_trait::async_trait;
use tracing::info;

/// 通知后端接口
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn list(&self) -> ApiResult<Vec<Notification>>;

    async fn mark_all_read(&self) -> ApiResult<()>;

    async fn clear_all(&self) -> ApiResult<()>;
}

#[derive(Clone)]
pub struct NotificationApi {
    http: HttpClient,
}

impl NotificationApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NotificationBackend for NotificationApi {
    async fn list(&self) -> ApiResult<Vec<Notification>> {
        let list: ListResponse<Notification> =
            self.http.get("/notifications/", &[], "通知列表").await?;
        let list = list.into_vec();
        info!("[NotifyAPI] ✅ 通知列表响应，条目数: {}", list.len());
        Ok(list)
    }

    async fn mark_all_read(&self) -> ApiResult<()> {
        self.http
            .post_ack::<()>("/notifications/mark-all-read/", None, "全部已读")
            .await
    }

    async fn clear_all(&self) -> ApiResult<()> {
        self.http
            .delete_ack("/notifications/clear-all/", "清空通知")
            .await
    }
}
