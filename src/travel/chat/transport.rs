//! 行程聊天 WebSocket 连接
//!
//! 每个打开的聊天视图一条连接，地址 `/ws/trips/{trip_id}/chat/?token=<access>`。
//! 关闭码 4001（未授权）和 4003（不是已接受成员）是终态；其他断开也不会自动重连。

use crate::travel::chat::listener::ChatListener;
use crate::travel::chat::models::{ClientFrame, ServerFrame};
use crate::travel::error::ApiError;
use crate::travel::session::Session;
use crate::travel::types::TripId;
use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

pub const CLOSE_UNAUTHORIZED: u16 = 4001;
pub const CLOSE_FORBIDDEN: u16 = 4003;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// 关闭码 4001，不再重试
    Unauthorized,
    /// 关闭码 4003，不再重试
    Forbidden,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Unauthorized | ConnectionState::Forbidden)
    }
}

/// 拼接聊天连接地址
pub fn chat_url(ws_base_url: &str, trip_id: TripId, token: &str) -> Result<url::Url> {
    let mut url = url::Url::parse(&format!(
        "{}/ws/trips/{}/chat/",
        ws_base_url.trim_end_matches('/'),
        trip_id
    ))
    .with_context(|| format!("无效的 WebSocket 地址: {}", ws_base_url))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// 一条行程聊天连接
pub struct ChatConnection {
    trip_id: TripId,
    writer: Arc<Mutex<Option<WsWriter>>>,
    state: Arc<watch::Sender<ConnectionState>>,
    listener: Arc<dyn ChatListener>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl ChatConnection {
    /// 建立连接并在内部启动消息处理与心跳
    pub async fn connect(
        ws_base_url: &str,
        trip_id: TripId,
        session: &Session,
        listener: Arc<dyn ChatListener>,
    ) -> Result<Self> {
        let Some(token) = session.access_token() else {
            let err = ApiError::NotAuthenticated;
            listener.on_error(err.to_string()).await;
            return Err(err.into());
        };
        let url = chat_url(ws_base_url, trip_id, &token)?;

        let (state, _rx) = watch::channel(ConnectionState::Connecting);
        let state = Arc::new(state);

        info!("[Chat] 🔗 连接行程 {} 的聊天室", trip_id);
        let (ws_stream, response) = match connect_async(url.as_str()).await {
            Ok(ok) => ok,
            Err(e) => {
                error!("[Chat] ❌ WebSocket 连接失败: {}", e);
                state.send_replace(ConnectionState::Disconnected);
                listener.on_disconnected().await;
                return Err(e).context("连接聊天室失败");
            }
        };
        info!("[Chat] ✅ WebSocket 连接成功, 状态: {}", response.status());

        let (write, read) = ws_stream.split();
        let writer = Arc::new(Mutex::new(Some(write)));
        state.send_replace(ConnectionState::Connected);
        listener.on_connected().await;

        let reader_task = tokio::spawn(read_loop(
            read,
            writer.clone(),
            state.clone(),
            listener.clone(),
        ));

        let writer_for_heartbeat = writer.clone();
        let heartbeat_task = tokio::spawn(async move {
            let mut ticker = interval(HEARTBEAT_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut guard = writer_for_heartbeat.lock().await;
                let Some(w) = guard.as_mut() else { break };
                if w.send(WsMessage::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            trip_id,
            writer,
            state,
            listener,
            tasks: StdMutex::new(vec![reader_task, heartbeat_task]),
        })
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// 订阅连接状态
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// 发送聊天消息；未连接时立即返回 false，不排队
    pub async fn send_message(&self, content: &str) -> bool {
        let frame = ClientFrame::ChatMessage {
            content: content.to_string(),
        };
        if self.send_frame(&frame).await {
            return true;
        }
        self.listener.on_error("Not connected".to_string()).await;
        false
    }

    /// 发送输入状态；未连接时静默丢弃
    pub async fn send_typing(&self, is_typing: bool) {
        self.send_frame(&ClientFrame::Typing { is_typing }).await;
    }

    async fn send_frame(&self, frame: &ClientFrame) -> bool {
        if !self.is_connected() {
            return false;
        }
        let text = match serde_json::to_string(frame) {
            Ok(t) => t,
            Err(e) => {
                error!("[Chat] 序列化消息失败: {}", e);
                return false;
            }
        };
        let mut guard = self.writer.lock().await;
        let Some(w) = guard.as_mut() else {
            return false;
        };
        match w.send(WsMessage::Text(text)).await {
            Ok(()) => true,
            Err(e) => {
                warn!("[Chat] 发送失败: {}", e);
                false
            }
        }
    }

    /// 关闭连接（离开聊天视图时）；进行中的发送不保证送达
    pub async fn close(&self) {
        self.abort_tasks();
        if let Some(mut w) = self.writer.lock().await.take() {
            if let Err(e) = w.send(WsMessage::Close(None)).await {
                debug!("[Chat] 关闭帧发送失败: {}", e);
            }
        }
        let was_terminal = self.state().is_terminal();
        if !was_terminal {
            self.state.send_replace(ConnectionState::Disconnected);
        }
        info!("[Chat] 👋 已关闭行程 {} 的聊天连接", self.trip_id);
    }

    fn abort_tasks(&self) {
        for task in self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            task.abort();
        }
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// 消息处理循环（事件循环）
async fn read_loop(
    mut read: WsReader,
    writer: Arc<Mutex<Option<WsWriter>>>,
    state: Arc<watch::Sender<ConnectionState>>,
    listener: Arc<dyn ChatListener>,
) {
    let mut close_code: Option<u16> = None;
    while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(WsMessage::Text(text)) => dispatch(&text, listener.as_ref()).await,
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
            Ok(WsMessage::Close(frame)) => {
                warn!("[Chat] 👋 连接关闭: {:?}", frame);
                close_code = frame.as_ref().map(|f| u16::from(f.code));
                break;
            }
            Err(e) => {
                error!("[Chat] WebSocket 错误: {}", e);
                break;
            }
            _ => {}
        }
    }

    writer.lock().await.take();
    let (next, reason) = match close_code {
        Some(CLOSE_UNAUTHORIZED) => (
            ConnectionState::Unauthorized,
            Some("Unauthorized - please login again"),
        ),
        Some(CLOSE_FORBIDDEN) => (
            ConnectionState::Forbidden,
            Some("Access denied - you must be an accepted trip member"),
        ),
        _ => (ConnectionState::Disconnected, None),
    };
    // 回调里读到的必须是关闭后的状态
    state.send_replace(next);
    listener.on_disconnected().await;
    if let Some(reason) = reason {
        listener.on_error(reason.to_string()).await;
    }
}

async fn dispatch(text: &str, listener: &dyn ChatListener) {
    let frame = match serde_json::from_str::<ServerFrame>(text) {
        Ok(f) => f,
        Err(e) => {
            error!("[Chat] 解析消息失败: {}, 原始消息: {}", e, text);
            return;
        }
    };
    match frame {
        ServerFrame::ChatMessage { message: Some(m) } => listener.on_message(m).await,
        ServerFrame::ChatMessage { message: None } => {}
        ServerFrame::UserTyping {
            user_id: Some(user_id),
            user_name: Some(user_name),
            is_typing,
        } => listener.on_typing(user_id, user_name, is_typing).await,
        ServerFrame::UserTyping { .. } => {}
        ServerFrame::Error { message, error } => {
            listener
                .on_error(ServerFrame::error_text(message.as_ref(), error.as_deref()))
                .await
        }
        ServerFrame::ConnectionEstablished { .. } => debug!("[Chat] 连接已建立: {}", text),
        ServerFrame::Unknown => debug!("[Chat] 未知消息类型: {}", text),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::travel::buddy::service::tests::session_for;
    use crate::travel::chat::models::ChatMessage;
    use crate::travel::types::UserId;
    use async_trait::async_trait;
    use std::future::Future;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    /// 记录所有回调的监听器
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub events: StdMutex<Vec<String>>,
    }

    impl Recorder {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, e: String) {
            self.events.lock().unwrap().push(e);
        }
    }

    #[async_trait]
    impl ChatListener for Recorder {
        async fn on_message(&self, message: ChatMessage) {
            self.push(format!("message:{}", message.content));
        }
        async fn on_typing(&self, user_id: UserId, user_name: String, is_typing: bool) {
            self.push(format!("typing:{}:{}:{}", user_id, user_name, is_typing));
        }
        async fn on_error(&self, message: String) {
            self.push(format!("error:{}", message));
        }
        async fn on_connected(&self) {
            self.push("connected".to_string());
        }
        async fn on_disconnected(&self) {
            self.push("disconnected".to_string());
        }
    }

    pub(crate) type ServerWs = WebSocketStream<TcpStream>;

    /// 启动只接受一次连接的 WebSocket 服务器，返回 `(ws_base_url, 请求 URI)`
    pub(crate) async fn serve_once<F, Fut>(handler: F) -> (String, JoinHandle<String>)
    where
        F: FnOnce(ServerWs) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let uri = Arc::new(StdMutex::new(String::new()));
            let seen = uri.clone();
            let ws = tokio_tungstenite::accept_hdr_async(stream, move |req: &Request, resp: Response| -> std::result::Result<Response, ErrorResponse> {
                *seen.lock().unwrap() = req.uri().to_string();
                Ok(resp)
            })
            .await
            .unwrap();
            handler(ws).await;
            let path = uri.lock().unwrap().clone();
            path
        });
        (format!("ws://{}", addr), handle)
    }

    pub(crate) async fn close_with(ws: &mut ServerWs, code: u16) {
        ws.send(WsMessage::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: "closed".into(),
        })))
        .await
        .ok();
        while let Some(Ok(_)) = ws.next().await {}
    }

    async fn wait_for_state(conn: &ChatConnection, f: impl Fn(ConnectionState) -> bool) {
        let mut rx = conn.subscribe_state();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| f(*s)))
            .await
            .expect("state timeout")
            .unwrap();
    }

    /// 轮询直到条件成立（回调在状态变化之后执行）
    pub(crate) async fn eventually(f: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !f() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition timeout");
    }

    #[test]
    fn url_carries_token() {
        let url = chat_url("ws://localhost:8000/", 42, "abc.def").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/trips/42/chat/?token=abc.def");
    }

    #[tokio::test]
    async fn frames_dispatch_then_forbidden_close_is_terminal() {
        let (base, server) = serve_once(|mut ws| async move {
            for frame in [
                r#"{"type":"connection_established","message":"ok"}"#,
                r#"{"type":"chat_message","message":{"id":1,"sender_id":2,"content":"hello","created_at":""}}"#,
                r#"{"type":"user_typing","user_id":2,"user_name":"Maya","is_typing":true}"#,
                r#"{"type":"error","message":"Message too long"}"#,
                r#"{"type":"error"}"#,
                r#"{"type":"mystery"}"#,
            ] {
                ws.send(WsMessage::Text(frame.to_string())).await.unwrap();
            }
            close_with(&mut ws, CLOSE_FORBIDDEN).await;
        })
        .await;

        let recorder = Arc::new(Recorder::default());
        let conn = ChatConnection::connect(&base, 42, &session_for(1), recorder.clone())
            .await
            .unwrap();
        wait_for_state(&conn, ConnectionState::is_terminal).await;
        eventually(|| recorder.events().len() == 7).await;

        assert_eq!(conn.state(), ConnectionState::Forbidden);
        assert!(!conn.is_connected());
        assert_eq!(
            recorder.events(),
            vec![
                "connected",
                "message:hello",
                "typing:2:Maya:true",
                "error:Message too long",
                "error:Unknown error",
                "disconnected",
                "error:Access denied - you must be an accepted trip member",
            ]
        );
        let uri = server.await.unwrap();
        assert_eq!(uri, "/ws/trips/42/chat/?token=access-1");

        // 终态下发送立即失败，不会重连
        assert!(!conn.send_message("still there?").await);
        assert_eq!(recorder.events().last().unwrap(), "error:Not connected");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(conn.state(), ConnectionState::Forbidden);
    }

    #[tokio::test]
    async fn unauthorized_close_reports_login_error() {
        let (base, _server) = serve_once(|mut ws| async move {
            close_with(&mut ws, CLOSE_UNAUTHORIZED).await;
        })
        .await;
        let recorder = Arc::new(Recorder::default());
        let conn = ChatConnection::connect(&base, 7, &session_for(1), recorder.clone())
            .await
            .unwrap();
        wait_for_state(&conn, ConnectionState::is_terminal).await;
        assert_eq!(conn.state(), ConnectionState::Unauthorized);
        eventually(|| {
            recorder
                .events()
                .contains(&"error:Unauthorized - please login again".to_string())
        })
        .await;
    }

    /// 在 `on_disconnected` 中记录当时的连接状态
    #[derive(Default)]
    struct StateAtDisconnect {
        rx: StdMutex<Option<watch::Receiver<ConnectionState>>>,
        seen: StdMutex<Option<ConnectionState>>,
    }

    #[async_trait]
    impl ChatListener for StateAtDisconnect {
        async fn on_message(&self, _message: ChatMessage) {}
        async fn on_typing(&self, _user_id: UserId, _user_name: String, _is_typing: bool) {}
        async fn on_error(&self, _message: String) {}
        async fn on_connected(&self) {}
        async fn on_disconnected(&self) {
            let state = self.rx.lock().unwrap().as_ref().map(|rx| *rx.borrow());
            *self.seen.lock().unwrap() = state;
        }
    }

    #[tokio::test]
    async fn disconnect_callback_sees_closed_state() {
        let (base, _server) = serve_once(|mut ws| async move {
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_text() {
                    break;
                }
            }
            close_with(&mut ws, 1000).await;
        })
        .await;

        let listener = Arc::new(StateAtDisconnect::default());
        let conn = ChatConnection::connect(&base, 42, &session_for(1), listener.clone())
            .await
            .unwrap();
        *listener.rx.lock().unwrap() = Some(conn.subscribe_state());
        conn.send_typing(true).await;

        eventually(|| listener.seen.lock().unwrap().is_some()).await;
        assert_eq!(*listener.seen.lock().unwrap(), Some(ConnectionState::Disconnected));
    }

    #[tokio::test]
    async fn outbound_frames_reach_server() {
        let (tx, rx) = tokio::sync::oneshot::channel::<Vec<String>>();
        let (base, _server) = serve_once(|mut ws| async move {
            let mut got = Vec::new();
            while let Some(Ok(msg)) = ws.next().await {
                if let WsMessage::Text(t) = msg {
                    got.push(t);
                    if got.len() == 2 {
                        break;
                    }
                }
            }
            tx.send(got).ok();
            close_with(&mut ws, 1000).await;
        })
        .await;

        let conn = ChatConnection::connect(&base, 42, &session_for(1), Arc::new(Recorder::default()))
            .await
            .unwrap();
        conn.send_typing(true).await;
        assert!(conn.send_message("hi").await);

        let got = tokio::time::timeout(Duration::from_secs(5), rx).await.unwrap().unwrap();
        let frames: Vec<serde_json::Value> =
            got.iter().map(|t| serde_json::from_str(t).unwrap()).collect();
        assert_eq!(frames[0], serde_json::json!({"type":"typing","is_typing":true}));
        assert_eq!(frames[1], serde_json::json!({"type":"chat_message","content":"hi"}));

        wait_for_state(&conn, |s| s == ConnectionState::Disconnected).await;
        // 普通关闭不是终态，但也不会自动重连
        assert!(!conn.state().is_terminal());
    }

    #[tokio::test]
    async fn missing_token_fails_before_connecting() {
        let recorder = Arc::new(Recorder::default());
        let result = ChatConnection::connect("ws://127.0.0.1:9", 1, &Session::new(), recorder.clone()).await;
        assert!(result.is_err());
        assert_eq!(recorder.events(), vec!["error:Not authenticated"]);
    }
}
