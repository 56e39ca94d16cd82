//! 客户端配置
//!
//! REST / WebSocket 地址不再写死在代码里，默认值与本地开发环境一致，
//! 可通过 `.env` 或环境变量覆盖。

use std::env;
use std::time::Duration;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// REST API 基础地址（包含 `/api` 前缀）
    pub api_base_url: String,
    /// WebSocket 基础地址，例如 `ws://localhost:8000`
    pub ws_base_url: String,
    /// 地点搜索服务地址（Nominatim）
    pub nominatim_url: String,
    /// 地点搜索防抖时长
    pub location_debounce: Duration,
    /// 输入提示过期时长（收发两端一致）
    pub typing_expiry: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            ws_base_url: "ws://localhost:8000".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            location_debounce: Duration::from_millis(400),
            typing_expiry: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    /// 使用指定地址创建配置，其余字段取默认值
    pub fn new(api_base_url: impl Into<String>, ws_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: trim_slash(api_base_url.into()),
            ws_base_url: trim_slash(ws_base_url.into()),
            ..Self::default()
        }
    }

    /// 读取 `.env` 与环境变量
    ///
    /// - `TRAVEL_API_BASE_URL`
    /// - `TRAVEL_WS_BASE_URL`
    /// - `TRAVEL_NOMINATIM_URL`
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            api_base_url: trim_slash(
                env::var("TRAVEL_API_BASE_URL").unwrap_or(defaults.api_base_url),
            ),
            ws_base_url: trim_slash(env::var("TRAVEL_WS_BASE_URL").unwrap_or(defaults.ws_base_url)),
            nominatim_url: trim_slash(
                env::var("TRAVEL_NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            ),
            ..defaults
        }
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
