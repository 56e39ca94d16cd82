//! 聊天监听器回调接口

use crate::travel::chat::models::ChatMessage;
use crate::travel::types::UserId;
use async_trait::async_trait;

/// 聊天监听器
#[async_trait]
pub trait ChatListener: Send + Sync {
    /// 收到新消息（按到达顺序）
    async fn on_message(&self, message: ChatMessage);

    /// 其他成员的输入状态
    async fn on_typing(&self, user_id: UserId, user_name: String, is_typing: bool);

    async fn on_error(&self, message: String);

    async fn on_connected(&self);

    async fn on_disconnected(&self);
}

/// 默认空实现（无操作）
pub struct EmptyChatListener;

#[async_trait]
impl ChatListener for EmptyChatListener {
    async fn on_message(&self, _message: ChatMessage) {}
    async fn on_typing(&self, _user_id: UserId, _user_name: String, _is_typing: bool) {}
    async fn on_error(&self, _message: String) {}
    async fn on_connected(&self) {}
    async fn on_disconnected(&self) {}
}
