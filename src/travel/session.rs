//! 会话（凭证）管理
//!
//! 凭证（access/refresh token + 当前用户）只通过 `Session` 读写，HTTP 层在发请求前取快照。
//! 每次登录/清除都会递增 generation，并通过 watch channel 广播 `SessionEvent`，
//! 并发中的请求据此判断自己看到的 401 是否仍属于当前会话。

use crate::travel::types::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// 登录用户信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
}

/// token 对
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

/// 会话凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub tokens: Tokens,
    pub user: User,
}

/// 会话事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// 尚未登录
    Anonymous,
    /// 已登录
    Established { generation: u64, user_id: UserId },
    /// 收到 401 后失效
    Invalidated { generation: u64 },
    /// 主动登出
    LoggedOut { generation: u64 },
}

#[derive(Debug)]
struct SessionState {
    generation: u64,
    credentials: Option<Arc<Credentials>>,
    event: SessionEvent,
}

/// 请求发出前取得的凭证快照
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    pub generation: u64,
    pub access_token: Option<String>,
}

/// 进程内共享的会话对象（克隆后共享同一状态）
#[derive(Clone)]
pub struct Session {
    state: Arc<watch::Sender<SessionState>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// 创建未登录会话
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState {
            generation: 0,
            credentials: None,
            event: SessionEvent::Anonymous,
        });
        Self {
            state: Arc::new(tx),
        }
    }

    /// 登录成功后写入凭证
    pub fn establish(&self, tokens: Tokens, user: User) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.event = SessionEvent::Established {
                generation,
                user_id: user.id,
            };
            s.credentials = Some(Arc::new(Credentials { tokens, user }));
        });
        info!("[Session] ✅ 会话建立，generation={}", generation);
        generation
    }

    /// 主动登出
    pub fn clear(&self) {
        self.state.send_modify(|s| {
            s.generation += 1;
            s.credentials = None;
            s.event = SessionEvent::LoggedOut {
                generation: s.generation,
            };
        });
        info!("[Session] 👋 已登出");
    }

    /// 收到 401 时调用：只有快照所属的 generation 仍是当前会话时才清除凭证
    ///
    /// 返回是否真的发生了失效
    pub fn invalidate(&self, observed_generation: u64) -> bool {
        let changed = self.state.send_if_modified(|s| {
            if s.generation != observed_generation || s.credentials.is_none() {
                return false;
            }
            s.generation += 1;
            s.credentials = None;
            s.event = SessionEvent::Invalidated {
                generation: s.generation,
            };
            true
        });
        if changed {
            warn!(
                "[Session] ⚠️ 收到 401，会话失效 (generation={})",
                observed_generation
            );
        }
        changed
    }

    /// 取当前凭证快照
    pub fn snapshot(&self) -> CredentialSnapshot {
        let s = self.state.borrow();
        CredentialSnapshot {
            generation: s.generation,
            access_token: s.credentials.as_ref().map(|c| c.tokens.access.clone()),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot().access_token
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state
            .borrow()
            .credentials
            .as_ref()
            .map(|c| c.tokens.refresh.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        self.state
            .borrow()
            .credentials
            .as_ref()
            .map(|c| c.user.clone())
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.state.borrow().credentials.as_ref().map(|c| c.user.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().credentials.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// 订阅会话事件
    pub fn subscribe(&self) -> SessionEvents {
        SessionEvents {
            rx: self.state.subscribe(),
        }
    }
}

/// 会话事件订阅端
pub struct SessionEvents {
    rx: watch::Receiver<SessionState>,
}

impl SessionEvents {
    /// 当前事件
    pub fn current(&self) -> SessionEvent {
        self.rx.borrow().event.clone()
    }

    /// 等待下一次会话变化；会话对象被释放后返回 `None`
    pub async fn changed(&mut self) -> Option<SessionEvent> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().event.clone())
    }
}
