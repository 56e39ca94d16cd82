//! 搭子监听器回调接口

use crate::travel::buddy::models::BuddyMatch;
use async_trait::async_trait;

/// 搭子监听器
#[async_trait]
pub trait BuddyListener: Send + Sync {
    /// 匹配列表发生变更（乐观更新、对账、全量拉取后都会触发）
    async fn on_matches_changed(&self, matches: Vec<BuddyMatch>);

    /// 操作失败，参数为给用户看的错误信息
    async fn on_buddy_error(&self, message: String);
}

/// 默认空实现（无操作）
pub struct EmptyBuddyListener;

#[async_trait]
impl BuddyListener for EmptyBuddyListener {
    async fn on_matches_changed(&self, _matches: Vec<BuddyMatch>) {}
    async fn on_buddy_error(&self, _message: String) {}
}
