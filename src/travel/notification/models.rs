//! 通知数据模型

use crate::travel::types::{RequestId, UserId};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;

/// 通知类型，未知类型保留原文
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum NotificationType {
    BuddyRequestSent,
    BuddyRequestReceived,
    BuddyRequestAccepted,
    BuddyRequestRejected,
    BuddyDisconnected,
    Other(String),
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "buddy_request_sent" => NotificationType::BuddyRequestSent,
            "buddy_request_received" => NotificationType::BuddyRequestReceived,
            "buddy_request_accepted" => NotificationType::BuddyRequestAccepted,
            "buddy_request_rejected" => NotificationType::BuddyRequestRejected,
            "buddy_disconnected" => NotificationType::BuddyDisconnected,
            _ => NotificationType::Other(value),
        }
    }
}

/// 展示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

impl NotificationType {
    pub fn severity(&self) -> Severity {
        match self {
            NotificationType::BuddyRequestAccepted => Severity::Success,
            NotificationType::BuddyRequestRejected => Severity::Error,
            _ => Severity::Info,
        }
    }
}

/// 通知附带的关联对象
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NotificationMetadata {
    #[serde(default)]
    pub buddy_request_id: Option<RequestId>,
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub disconnector_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub related_object_id: Option<i64>,
    #[serde(default)]
    pub metadata: Option<NotificationMetadata>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// 相对时间标签（`JUST NOW`、`5MIN AGO`、`YESTERDAY` ...）
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let diff = now.signed_duration_since(self.created_at);
        let minutes = diff.num_minutes();
        let hours = diff.num_hours();
        let days = diff.num_days();
        if minutes < 1 {
            "JUST NOW".to_string()
        } else if minutes < 60 {
            format!("{}MIN AGO", minutes)
        } else if hours < 24 {
            format!("{}HOUR{} AGO", hours, if hours > 1 { "S" } else { "" })
        } else if days == 1 {
            "YESTERDAY".to_string()
        } else if days < 7 {
            format!("{}DAYS AGO", days)
        } else {
            self.created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string()
        }
    }
}
