//! 统一错误类型
//!
//! REST 层与各状态机共用 `ApiError`，保留后端返回的 `detail` 原文，
//! 便于界面直接展示（例如非创建者移除成员时的权限错误）。

use crate::travel::trip::TripValidationError;
use thiserror::Error;

/// REST / 状态机错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络层失败（连接失败、读取响应失败等）
    #[error("请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401：会话已失效，本地凭证已被清除
    #[error("未登录或登录已失效")]
    Unauthorized,

    /// 会话中没有可用的凭证，请求未发出
    #[error("Not authenticated")]
    NotAuthenticated,

    /// 其他非 2xx 响应，`detail` 为后端错误原文
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    /// 响应反序列化失败
    #[error("反序列化响应失败: {0}")]
    Decode(#[from] serde_json::Error),

    /// 本地前置条件不满足，未发起网络请求
    #[error("当前状态不允许该操作: {0}")]
    InvalidState(String),

    /// 表单校验失败，未发起网络请求
    #[error(transparent)]
    Validation(#[from] TripValidationError),

    /// 同一对象已有进行中的变更
    #[error("操作进行中: {0}")]
    Busy(String),
}

impl ApiError {
    /// HTTP 状态码（仅 `Rejected`/`Unauthorized` 有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// 后端以 400/409 表示“已处于目标状态”（重复保存、重复申请等）
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(400) | Some(409))
    }

    /// 是否为后端的权限拒绝（403）
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// 后端返回的错误原文
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
