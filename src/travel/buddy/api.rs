//! 搭子 HTTP API 客户端
//!
//! 负责所有 `/buddies/` 相关的 HTTP 请求

use crate::travel::buddy::models::{Buddy, BuddyMatch, BuddyRequest};
use crate::travel::error::ApiResult;
use crate::travel::http::HttpClient;
use crate::travel::types::{Paginated, RequestId, UserId};
use async_trait::async_trait;
use tracing::info;

/// 搭子后端接口（`BuddyManager` 只依赖这个 trait）
#[async_trait]
pub trait BuddyBackend: Send + Sync {
    async fn list_matches(&self, limit: u32, min_score: f64) -> ApiResult<Paginated<BuddyMatch>>;

    async fn list_requests(&self) -> ApiResult<Paginated<BuddyRequest>>;

    async fn send_request(&self, receiver_id: UserId) -> ApiResult<BuddyRequest>;

    async fn cancel_request(&self, request_id: RequestId) -> ApiResult<()>;

    async fn accept_request(&self, request_id: RequestId) -> ApiResult<BuddyRequest>;

    async fn reject_request(&self, request_id: RequestId) -> ApiResult<BuddyRequest>;

    async fn disconnect(&self, user_id: UserId) -> ApiResult<()>;

    async fn accepted_buddies(&self) -> ApiResult<Vec<Buddy>>;
}

/// 搭子相关的 HTTP API 客户端
#[derive(Clone)]
pub struct BuddyApi {
    http: HttpClient,
}

impl BuddyApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BuddyBackend for BuddyApi {
    async fn list_matches(&self, limit: u32, min_score: f64) -> ApiResult<Paginated<BuddyMatch>> {
        info!("[BuddyAPI] 📡 请求匹配列表 limit={}, min_score={}", limit, min_score);
        let page: Paginated<BuddyMatch> = self
            .http
            .get(
                "/buddies/matches/",
                &[
                    ("limit", limit.to_string()),
                    ("min_score", min_score.to_string()),
                ],
                "匹配列表",
            )
            .await?;
        info!("[BuddyAPI] ✅ 匹配列表响应，条目数: {}", page.results.len());
        Ok(page)
    }

    async fn list_requests(&self) -> ApiResult<Paginated<BuddyRequest>> {
        self.http.get("/buddies/requests/", &[], "搭子请求列表").await
    }

    async fn send_request(&self, receiver_id: UserId) -> ApiResult<BuddyRequest> {
        info!("[BuddyAPI] 📤 发送搭子请求 -> {}", receiver_id);
        self.http
            .post(
                "/buddies/requests/",
                Some(&serde_json::json!({ "receiver_id": receiver_id })),
                "发送搭子请求",
            )
            .await
    }

    async fn cancel_request(&self, request_id: RequestId) -> ApiResult<()> {
        info!("[BuddyAPI] 🗑️ 撤回搭子请求 {}", request_id);
        self.http
            .delete_ack(
                &format!("/buddies/requests/{}/cancel/", request_id),
                "撤回搭子请求",
            )
            .await
    }

    async fn accept_request(&self, request_id: RequestId) -> ApiResult<BuddyRequest> {
        self.http
            .post::<(), _>(
                &format!("/buddies/requests/{}/accept/", request_id),
                None,
                "接受搭子请求",
            )
            .await
    }

    async fn reject_request(&self, request_id: RequestId) -> ApiResult<BuddyRequest> {
        self.http
            .post::<(), _>(
                &format!("/buddies/requests/{}/reject/", request_id),
                None,
                "拒绝搭子请求",
            )
            .await
    }

    async fn disconnect(&self, user_id: UserId) -> ApiResult<()> {
        info!("[BuddyAPI] ✂️ 解除搭子关系 {}", user_id);
        self.http
            .post_ack::<()>(
                &format!("/buddies/disconnect/{}/", user_id),
                None,
                "解除搭子关系",
            )
            .await
    }

    async fn accepted_buddies(&self) -> ApiResult<Vec<Buddy>> {
        let page: Paginated<Buddy> = self
            .http
            .get("/buddies/accepted/", &[], "已建立关系的搭子")
            .await?;
        Ok(page.into_results())
    }
}
