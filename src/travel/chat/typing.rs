//! 输入状态提示
//!
//! 服务端不会让 "正在输入" 过期，接收端在最后一次 `true` 之后超过时限仍未收到 `false`
//! 时自行清除，时限与发送端的防抖一致。

use crate::travel::types::UserId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 接收端的输入状态表
#[derive(Debug, Clone)]
pub struct TypingTracker {
    expiry: Duration,
    typing: HashMap<UserId, (String, Instant)>,
}

impl TypingTracker {
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            typing: HashMap::new(),
        }
    }

    /// 记录一次输入状态信号
    pub fn observe(&mut self, user_id: UserId, user_name: String, is_typing: bool, now: Instant) {
        if is_typing {
            self.typing.insert(user_id, (user_name, now));
        } else {
            self.typing.remove(&user_id);
        }
    }

    /// 当前正在输入的成员名（按用户 ID 排序），顺带清除过期条目
    pub fn active(&mut self, now: Instant) -> Vec<String> {
        let expiry = self.expiry;
        self.typing
            .retain(|_, (_, since)| now.saturating_duration_since(*since) < expiry);
        let mut users: Vec<(&UserId, &String)> =
            self.typing.iter().map(|(id, (name, _))| (id, name)).collect();
        users.sort_by_key(|(id, _)| **id);
        users.into_iter().map(|(_, name)| name.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.typing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_expires_without_explicit_stop() {
        let start = Instant::now();
        let mut t = TypingTracker::new(Duration::from_secs(2));
        t.observe(3, "Jordan".into(), true, start);
        t.observe(2, "Maya".into(), true, start + Duration::from_millis(1500));

        assert_eq!(t.active(start + Duration::from_millis(1900)), vec!["Maya", "Jordan"]);
        assert_eq!(t.active(start + Duration::from_millis(2100)), vec!["Maya"]);
        assert!(t.active(start + Duration::from_secs(4)).is_empty());
    }

    #[test]
    fn explicit_stop_and_refresh() {
        let start = Instant::now();
        let mut t = TypingTracker::new(Duration::from_secs(2));
        t.observe(2, "Maya".into(), true, start);
        t.observe(2, "Maya".into(), true, start + Duration::from_millis(1800));
        assert_eq!(t.active(start + Duration::from_millis(3000)), vec!["Maya"]);

        t.observe(2, "Maya".into(), false, start + Duration::from_millis(3100));
        assert!(t.active(start + Duration::from_millis(3200)).is_empty());
    }
}
