//! 偏好 HTTP API 客户端

use crate::travel::error::{ApiError, ApiResult};
use crate::travel::http::HttpClient;
use crate::travel::preference::models::{Interest, Preferences, PreferencesPayload};
use crate::travel::types::ListResponse;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

/// 偏好后端接口
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    async fn interests(&self) -> ApiResult<Vec<Interest>>;

    async fn create_interest(&self, name: &str) -> ApiResult<Interest>;

    /// 当前用户的偏好，尚未设置时为 None
    async fn my_preferences(&self) -> ApiResult<Option<Preferences>>;

    async fn create(&self, payload: &PreferencesPayload) -> ApiResult<()>;

    async fn update(&self, payload: &PreferencesPayload) -> ApiResult<()>;
}

#[derive(Clone)]
pub struct PreferenceApi {
    http: HttpClient,
}

impl PreferenceApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PreferenceBackend for PreferenceApi {
    async fn interests(&self) -> ApiResult<Vec<Interest>> {
        let list: ListResponse<Interest> = self
            .http
            .get("/preferences/interests/", &[], "兴趣列表")
            .await?;
        Ok(list.into_vec())
    }

    async fn create_interest(&self, name: &str) -> ApiResult<Interest> {
        info!("[PrefAPI] ➕ 新增兴趣: {}", name);
        self.http
            .post(
                "/preferences/interests/",
                Some(&serde_json::json!({ "name": name, "is_active": true })),
                "新增兴趣",
            )
            .await
    }

    async fn my_preferences(&self) -> ApiResult<Option<Preferences>> {
        let value: Value = match self.http.get("/preferences/me/", &[], "我的偏好").await {
            Ok(v) => v,
            Err(ApiError::Rejected { status: 404, .. }) => {
                info!("[PrefAPI] 尚未设置偏好");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match &value {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            _ => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    async fn create(&self, payload: &PreferencesPayload) -> ApiResult<()> {
        self.http
            .post_ack("/preferences/", Some(payload), "创建偏好")
            .await
    }

    async fn update(&self, payload: &PreferencesPayload) -> ApiResult<()> {
        self.http
            .put_ack("/preferences/", payload, "更新偏好")
            .await
    }
}
