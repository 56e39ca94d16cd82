//! 行程聊天模块
//!
//! REST 拉取历史 + 每个打开的聊天视图一条 WebSocket 连接

pub mod api;
pub mod listener;
pub mod models;
pub mod room;
pub mod transport;
pub mod typing;

pub use api::{ChatApi, ChatBackend};
pub use listener::{ChatListener, EmptyChatListener};
pub use models::{ChatHistory, ChatMessage, ClientFrame, ServerFrame};
pub use room::{ChatRoom, RoomGate};
pub use transport::{ChatConnection, ConnectionState};
pub use typing::TypingTracker;
