//! 聊天视图模型
//!
//! 只有已接受的成员才会拉取历史和建立连接；其他状态直接锁定聊天室。

use crate::travel::chat::api::ChatBackend;
use crate::travel::chat::listener::{ChatListener, EmptyChatListener};
use crate::travel::chat::models::ChatMessage;
use crate::travel::chat::transport::{ChatConnection, ConnectionState};
use crate::travel::chat::typing::TypingTracker;
use crate::travel::config::ClientConfig;
use crate::travel::error::ApiResult;
use crate::travel::session::Session;
use crate::travel::trip::MembershipStatus;
use crate::travel::types::{TripId, UserId};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const INVITED_NOTICE: &str = "You need to accept the trip invitation to join the chat.";
const NOT_MEMBER_NOTICE: &str = "You must be an accepted member to view this chat.";
const SEND_FAILED: &str = "Failed to send message - reconnecting...";
const HISTORY_FAILED: &str = "Failed to load messages";

/// 聊天室是否可用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomGate {
    /// 尚未打开
    Closed,
    Open,
    /// 输入框禁用，附带提示文案
    Locked(String),
}

impl RoomGate {
    /// 根据当前用户的成员状态决定聊天室是否可用
    pub fn for_membership(status: Option<MembershipStatus>) -> Self {
        match status {
            Some(MembershipStatus::Accepted) => RoomGate::Open,
            Some(MembershipStatus::Invited) => RoomGate::Locked(INVITED_NOTICE.to_string()),
            _ => RoomGate::Locked(NOT_MEMBER_NOTICE.to_string()),
        }
    }
}

struct RoomState {
    viewer: Option<UserId>,
    messages: Vec<ChatMessage>,
    error: Option<String>,
    typing: TypingTracker,
}

type SharedState = Arc<Mutex<RoomState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, RoomState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 连接回调先更新视图状态，再转发给外部监听器
struct RoomSink {
    state: SharedState,
    forward: Arc<dyn ChatListener>,
}

#[async_trait]
impl ChatListener for RoomSink {
    async fn on_message(&self, mut message: ChatMessage) {
        {
            let mut s = lock(&self.state);
            message.is_me = message.sender_id.is_some() && message.sender_id == s.viewer;
            s.messages.push(message.clone());
        }
        self.forward.on_message(message).await;
    }

    async fn on_typing(&self, user_id: UserId, user_name: String, is_typing: bool) {
        lock(&self.state)
            .typing
            .observe(user_id, user_name.clone(), is_typing, Instant::now());
        self.forward.on_typing(user_id, user_name, is_typing).await;
    }

    async fn on_error(&self, message: String) {
        lock(&self.state).error = Some(message.clone());
        self.forward.on_error(message).await;
    }

    async fn on_connected(&self) {
        lock(&self.state).error = None;
        self.forward.on_connected().await;
    }

    async fn on_disconnected(&self) {
        self.forward.on_disconnected().await;
    }
}

/// 单个行程的聊天室
pub struct ChatRoom {
    trip_id: TripId,
    backend: Arc<dyn ChatBackend>,
    session: Session,
    ws_base_url: String,
    typing_expiry: Duration,
    listener: Arc<dyn ChatListener>,
    state: SharedState,
    gate: RoomGate,
    connection: Option<Arc<ChatConnection>>,
    typing_timer: Option<JoinHandle<()>>,
}

impl ChatRoom {
    pub fn new(
        trip_id: TripId,
        backend: Arc<dyn ChatBackend>,
        session: Session,
        config: &ClientConfig,
    ) -> Self {
        Self::with_listener(trip_id, backend, session, config, Arc::new(EmptyChatListener))
    }

    pub fn with_listener(
        trip_id: TripId,
        backend: Arc<dyn ChatBackend>,
        session: Session,
        config: &ClientConfig,
        listener: Arc<dyn ChatListener>,
    ) -> Self {
        let viewer = session.current_user_id();
        Self {
            trip_id,
            backend,
            session,
            ws_base_url: config.ws_base_url.clone(),
            typing_expiry: config.typing_expiry,
            listener,
            state: Arc::new(Mutex::new(RoomState {
                viewer,
                messages: Vec::new(),
                error: None,
                typing: TypingTracker::new(config.typing_expiry),
            })),
            gate: RoomGate::Closed,
            connection: None,
            typing_timer: None,
        }
    }

    /// 打开聊天视图
    ///
    /// 非已接受成员：不拉历史、不建连接，直接锁定。已接受成员：拉取历史并建立连接，
    /// 两者失败都只体现在错误提示上。
    pub async fn open(&mut self, membership: Option<MembershipStatus>) -> &RoomGate {
        if self.connection.is_some() {
            return &self.gate;
        }
        self.gate = RoomGate::for_membership(membership);
        if let RoomGate::Locked(notice) = &self.gate {
            info!("[ChatRoom] 🔒 行程 {} 聊天室已锁定: {}", self.trip_id, notice);
            return &self.gate;
        }
        lock(&self.state).viewer = self.session.current_user_id();

        match self.backend.history(self.trip_id).await {
            Ok(history) => {
                let viewer = self.session.current_user_id();
                let mut s = lock(&self.state);
                s.error = None;
                s.messages = history.messages;
                for m in s.messages.iter_mut() {
                    if viewer.is_some() && m.sender_id == viewer {
                        m.is_me = true;
                    }
                }
            }
            Err(e) => {
                error!("[ChatRoom] ❌ 加载历史消息失败: {}", e);
                lock(&self.state).error =
                    Some(e.detail().unwrap_or(HISTORY_FAILED).to_string());
            }
        }

        let sink = Arc::new(RoomSink {
            state: self.state.clone(),
            forward: self.listener.clone(),
        });
        match ChatConnection::connect(&self.ws_base_url, self.trip_id, &self.session, sink).await {
            Ok(conn) => self.connection = Some(Arc::new(conn)),
            Err(e) => {
                error!("[ChatRoom] ❌ 建立聊天连接失败: {:#}", e);
                let mut s = lock(&self.state);
                if s.error.is_none() {
                    s.error = Some(e.to_string());
                }
            }
        }
        &self.gate
    }

    pub fn gate(&self) -> &RoomGate {
        &self.gate
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.state).messages.clone()
    }

    /// 错误提示（连接成功时清除）
    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    /// 正在输入的其他成员
    pub fn typing_users(&self) -> Vec<String> {
        lock(&self.state).typing.active(Instant::now())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
            .as_ref()
            .map(|c| c.state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    /// 输入框内容变化：发送 typing=true，停止输入一段时间后自动发送 false
    pub async fn on_input(&mut self) {
        let Some(conn) = self.connection.clone() else {
            return;
        };
        conn.send_typing(true).await;
        if let Some(timer) = self.typing_timer.take() {
            timer.abort();
        }
        let expiry = self.typing_expiry;
        self.typing_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            conn.send_typing(false).await;
        }));
    }

    /// 发送消息；内容去掉首尾空白后为空时不发送
    pub async fn send(&mut self, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() || self.gate != RoomGate::Open {
            return false;
        }

        let sent = match &self.connection {
            Some(conn) => conn.send_message(content).await,
            None => false,
        };
        if !sent {
            warn!("[ChatRoom] 消息发送失败 (trip={})", self.trip_id);
            lock(&self.state).error = Some(SEND_FAILED.to_string());
        }

        if let Some(timer) = self.typing_timer.take() {
            timer.abort();
        }
        if let Some(conn) = &self.connection {
            conn.send_typing(false).await;
        }
        sent
    }

    /// 通过 REST 发送（WebSocket 不可用时的兜底），成功后追加到本地列表
    pub async fn send_via_rest(&mut self, content: &str) -> ApiResult<ChatMessage> {
        let message = self
            .backend
            .send(self.trip_id, content.trim())
            .await
            .inspect_err(|e| error!("[ChatRoom] ❌ REST 发送失败: {}", e))?;
        let mut stored = message.clone();
        stored.is_me = true;
        lock(&self.state).messages.push(stored);
        Ok(message)
    }

    /// 关闭聊天视图，无条件断开连接
    pub async fn close(&mut self) {
        if let Some(timer) = self.typing_timer.take() {
            timer.abort();
        }
        if let Some(conn) = self.connection.take() {
            conn.close().await;
        }
        lock(&self.state).typing.clear();
        self.gate = RoomGate::Closed;
    }
}

impl Drop for ChatRoom {
    fn drop(&mut self) {
        if let Some(timer) = self.typing_timer.take() {
            timer.abort();
        }
    }
}
