//! 聊天数据结构与 WebSocket 帧

use crate::travel::types::{deserialize_vec_or_null, TripId, UserId};
use serde::{Deserialize, Serialize};

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    /// 系统消息没有发送者
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_avatar: Option<String>,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub is_me: bool,
}

/// 历史消息响应（按时间顺序，客户端不重新排序）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub room_id: i64,
    pub trip_id: TripId,
    #[serde(default)]
    pub trip_title: String,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub messages: Vec<ChatMessage>,
}

/// 服务端推送的帧，按 `type` 区分
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    ChatMessage {
        #[serde(default)]
        message: Option<ChatMessage>,
    },
    UserTyping {
        #[serde(default)]
        user_id: Option<UserId>,
        #[serde(default)]
        user_name: Option<String>,
        #[serde(default)]
        is_typing: bool,
    },
    Error {
        #[serde(default)]
        message: Option<serde_json::Value>,
        #[serde(default)]
        error: Option<String>,
    },
    ConnectionEstablished {
        #[serde(default)]
        message: Option<serde_json::Value>,
    },
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// error 帧展示给用户的文本
    pub fn error_text(message: Option<&serde_json::Value>, error: Option<&str>) -> String {
        let from_message = message.and_then(|m| match m {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });
        from_message
            .or_else(|| error.filter(|e| !e.is_empty()).map(str::to_string))
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// 客户端发送的帧
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    ChatMessage { content: String },
    Typing { is_typing: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_have_wire_shape() {
        let json = serde_json::to_value(ClientFrame::ChatMessage {
            content: "hi".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type":"chat_message","content":"hi"}));

        let json = serde_json::to_value(ClientFrame::Typing { is_typing: true }).unwrap();
        assert_eq!(json, serde_json::json!({"type":"typing","is_typing":true}));
    }

    #[test]
    fn server_frames_parse_by_type() {
        let f: ServerFrame = serde_json::from_str(
            r#"{"type":"chat_message","message":{"id":1,"sender_id":null,"content":"Maya joined","created_at":"","is_system":true,"is_me":false}}"#,
        )
        .unwrap();
        match f {
            ServerFrame::ChatMessage { message: Some(m) } => assert!(m.is_system),
            other => panic!("unexpected frame {:?}", other),
        }

        let f: ServerFrame =
            serde_json::from_str(r#"{"type":"presence","user_id":3}"#).unwrap();
        assert_eq!(f, ServerFrame::Unknown);
    }

    #[test]
    fn error_text_prefers_message_then_error() {
        let msg = serde_json::json!("Message too long");
        assert_eq!(ServerFrame::error_text(Some(&msg), Some("x")), "Message too long");
        assert_eq!(ServerFrame::error_text(None, Some("Rate limited")), "Rate limited");
        assert_eq!(ServerFrame::error_text(None, None), "Unknown error");
    }
}
