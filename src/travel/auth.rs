//! 账号认证
//!
//! 注册 / 邮箱登录 / Google 登录都返回 `AuthResponse`，成功后写入 `Session`。
//! 登出只清除本地凭证，不请求后端。

use crate::travel::error::ApiResult;
use crate::travel::http::HttpClient;
use crate::travel::session::{Tokens, User};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub tokens: Tokens,
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// 认证 API
#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        info!("[Auth] 📝 注册: {}", request.email);
        self.authenticate("/auth/register/", request, "注册").await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        info!("[Auth] 🔐 正在登录: {}", email);
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.authenticate("/auth/login/", &request, "登录").await
    }

    pub async fn google_login(&self, access_token: &str) -> ApiResult<AuthResponse> {
        info!("[Auth] 🔐 Google 登录");
        self.authenticate(
            "/auth/google/",
            &serde_json::json!({ "access_token": access_token }),
            "Google 登录",
        )
        .await
    }

    /// 清除本地凭证
    pub fn logout(&self) {
        self.http.session().clear();
    }

    async fn authenticate<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        operation_name: &str,
    ) -> ApiResult<AuthResponse> {
        let response: AuthResponse = self
            .http
            .post(path, Some(body), operation_name)
            .await
            .map_err(|e| {
                error!("[Auth] ❌ {}失败: {}", operation_name, e);
                e
            })?;
        self.http
            .session()
            .establish(response.tokens.clone(), response.user.clone());
        info!(
            "[Auth] ✅ {}成功，用户: {} ({})",
            operation_name, response.user.full_name, response.user.id
        );
        Ok(response)
    }
}
