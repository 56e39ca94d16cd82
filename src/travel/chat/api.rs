//! 聊天 HTTP API（历史消息 + REST 发送兜底）

use crate::travel::chat::models::{ChatHistory, ChatMessage};
use crate::travel::error::ApiResult;
use crate::travel::http::HttpClient;
use crate::travel::types::TripId;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn history(&self, trip_id: TripId) -> ApiResult<ChatHistory>;

    async fn send(&self, trip_id: TripId, content: &str) -> ApiResult<ChatMessage>;
}

#[derive(Clone)]
pub struct ChatApi {
    http: HttpClient,
}

impl ChatApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatBackend for ChatApi {
    async fn history(&self, trip_id: TripId) -> ApiResult<ChatHistory> {
        let history: ChatHistory = self
            .http
            .get(
                &format!("/trips/{}/chat/messages/", trip_id),
                &[],
                "聊天历史",
            )
            .await?;
        info!(
            "[ChatAPI] ✅ 行程 {} 历史消息 {} 条",
            trip_id,
            history.messages.len()
        );
        Ok(history)
    }

    async fn send(&self, trip_id: TripId, content: &str) -> ApiResult<ChatMessage> {
        self.http
            .post(
                &format!("/trips/{}/chat/messages/", trip_id),
                Some(&serde_json::json!({ "content": content })),
                "发送聊天消息",
            )
            .await
    }
}
