//! HTTP 客户端
//!
//! 所有 REST 请求都经过 `HttpClient`：
//! - 发请求前从 `Session` 取快照，带上 `Authorization: Bearer <access>`
//! - 每个请求带一个 `operationID`，方便和后端日志对齐
//! - 401 时按快照的 generation 使会话失效，其余非 2xx 保留后端 `detail` 原文

use crate::travel::error::{ApiError, ApiResult};
use crate::travel::session::Session;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 带会话的 REST 客户端（克隆后共享连接池与会话）
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    api_base_url: String,
    session: Session,
}

impl HttpClient {
    /// 创建 HTTP 客户端
    pub fn new(api_base_url: impl Into<String>, session: Session) -> ApiResult<Self> {
        let client = reqwest::ClientBuilder::new().build()?;
        Ok(Self::with_client(client, api_base_url, session))
    }

    /// 使用外部配置好的 reqwest 客户端
    pub fn with_client(
        client: reqwest::Client,
        api_base_url: impl Into<String>,
        session: Session,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation_name: &str,
    ) -> ApiResult<T> {
        let body = self
            .execute(Method::GET, path, query, None, operation_name)
            .await?;
        decode(&body, operation_name)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        payload: Option<&B>,
        operation_name: &str,
    ) -> ApiResult<T> {
        let payload = payload.map(serde_json::to_value).transpose()?;
        let body = self
            .execute(Method::POST, path, &[], payload, operation_name)
            .await?;
        decode(&body, operation_name)
    }

    /// POST 且忽略响应体
    pub async fn post_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: Option<&B>,
        operation_name: &str,
    ) -> ApiResult<()> {
        let payload = payload.map(serde_json::to_value).transpose()?;
        self.execute(Method::POST, path, &[], payload, operation_name)
            .await?;
        Ok(())
    }

    /// PUT 且忽略响应体
    pub async fn put_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &B,
        operation_name: &str,
    ) -> ApiResult<()> {
        let payload = serde_json::to_value(payload)?;
        self.execute(Method::PUT, path, &[], Some(payload), operation_name)
            .await?;
        Ok(())
    }

    /// DELETE 且忽略响应体
    pub async fn delete_ack(&self, path: &str, operation_name: &str) -> ApiResult<()> {
        self.execute(Method::DELETE, path, &[], None, operation_name)
            .await?;
        Ok(())
    }

    /// 发送请求并返回 body（仅 2xx）
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Option<serde_json::Value>,
        operation_name: &str,
    ) -> ApiResult<Vec<u8>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.url(path);
        let snapshot = self.session.snapshot();

        info!("[HTTP] 📡 {} {} ({})", method, path, operation_name);
        debug!("[HTTP]   请求URL: {}, 操作ID: {}", url, operation_id);

        let mut builder = self
            .client
            .request(method, &url)
            .header("Accept", "application/json")
            .header("operationID", &operation_id);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = &snapshot.access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(payload) = &payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await.map_err(|e| {
            error!("[HTTP] {}请求失败: {}", operation_name, e);
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            error!("[HTTP] {}读取响应 body 失败: {}", operation_name, e);
            ApiError::Transport(e)
        })?;
        let body_str = String::from_utf8_lossy(&body);
        debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("[HTTP] {}返回 401，清除本地凭证", operation_name);
            self.session.invalidate(snapshot.generation);
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let detail = extract_detail(&body_str)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("请求失败").to_string());
            error!(
                "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
                operation_name, status, body_str
            );
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);
        Ok(body.to_vec())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8], operation_name: &str) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name,
            e,
            String::from_utf8_lossy(body)
        );
        ApiError::Decode(e)
    })
}

/// 从错误响应中取出给用户看的文本
///
/// 依次尝试 `detail`、`error`、`message`，再退回到首个字段的校验错误，最后是原文
fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return Some(trimmed.to_string()),
    };
    match &value {
        serde_json::Value::Object(map) => {
            for key in ["detail", "error", "message"] {
                if let Some(serde_json::Value::String(s)) = map.get(key) {
                    return Some(s.clone());
                }
            }
            map.iter().next().map(|(field, v)| match v {
                serde_json::Value::Array(items) => {
                    let first = items
                        .first()
                        .and_then(|i| i.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| v.to_string());
                    format!("{}: {}", field, first)
                }
                serde_json::Value::String(s) => format!("{}: {}", field, s),
                other => format!("{}: {}", field, other),
            })
        }
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! 单次响应的 HTTP 桩服务器（仅测试用）

    use crate::travel::http::HttpClient;
    use crate::travel::session::Session;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// 启动桩服务器，返回 `(api_base_url, 收到的原始请求（含 body）)`
    pub async fn stub_once(status: u16, reason: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 2048];
            // 读完请求头和 Content-Length 指定的 body 再回包
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{}/api", addr), handle)
    }

    pub fn client_for(base_url: &str, session: Session) -> HttpClient {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpClient::with_client(client, base_url, session)
    }
}
