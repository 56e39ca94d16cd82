//! 搭子（buddy）数据结构

use crate::travel::types::{RequestId, UserId};
use serde::{Deserialize, Serialize};

/// 后端保存的请求状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestRecordStatus {
    Pending,
    Accepted,
    Rejected,
}

/// 从当前用户视角看到的关系状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    None,
    PendingOutgoing,
    PendingIncoming,
    Accepted,
    Rejected,
}

impl RequestStatus {
    /// 是否可以发起新的请求（被拒绝后视同没有关系）
    pub fn can_send(self) -> bool {
        !self.is_active()
    }

    /// 是否存在有效（待处理或已接受）的关系
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RequestStatus::PendingOutgoing | RequestStatus::PendingIncoming | RequestStatus::Accepted
        )
    }
}

/// 有向的搭子请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuddyRequest {
    pub id: RequestId,
    pub sender_id: UserId,
    #[serde(default)]
    pub sender_name: String,
    pub receiver_id: UserId,
    #[serde(default)]
    pub receiver_name: String,
    pub status: RequestRecordStatus,
    #[serde(default)]
    pub created_at: String,
}

impl BuddyRequest {
    /// 是否连接了这两个用户（无向）
    pub fn involves(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// 匹配结果（后端每次拉取时重新计算）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuddyMatch {
    pub matched_user_id: UserId,
    pub matched_user_name: String,
    #[serde(default)]
    pub matched_user_email: String,
    #[serde(default)]
    pub shared_interests: Vec<String>,
    #[serde(default)]
    pub match_score: f64,
    #[serde(default)]
    pub request_status: RequestStatus,
    #[serde(default)]
    pub request_id: Option<RequestId>,
}

/// 已建立关系的搭子（创建行程时的邀请候选）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buddy {
    pub id: UserId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub primary_interest: Option<String>,
}

/// 在搭子列表中按姓名/邮箱搜索，并可按主要兴趣过滤
pub fn filter_buddies<'a>(
    buddies: &'a [Buddy],
    search: &str,
    interest: Option<&str>,
) -> Vec<&'a Buddy> {
    let needle = search.to_lowercase();
    buddies
        .iter()
        .filter(|b| {
            b.full_name.to_lowercase().contains(&needle) || b.email.to_lowercase().contains(&needle)
        })
        .filter(|b| match interest {
            Some(i) => b.primary_interest.as_deref() == Some(i),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_inactive_relations_allow_sending() {
        for status in [RequestStatus::None, RequestStatus::Rejected] {
            assert!(!status.is_active());
            assert!(status.can_send());
        }
        for status in [
            RequestStatus::PendingOutgoing,
            RequestStatus::PendingIncoming,
            RequestStatus::Accepted,
        ] {
            assert!(status.is_active());
            assert!(!status.can_send());
        }
    }

    #[test]
    fn match_without_status_defaults_to_none() {
        let m: BuddyMatch = serde_json::from_str(
            r#"{"matched_user_id":2,"matched_user_name":"Maya","shared_interests":["Hiking"],"match_score":92.5}"#,
        )
        .unwrap();
        assert_eq!(m.request_status, RequestStatus::None);
        assert_eq!(m.request_id, None);
    }

    #[test]
    fn filter_by_name_email_and_interest() {
        let buddies = vec![
            Buddy {
                id: 1,
                full_name: "Maya Chen".into(),
                email: "maya@x.io".into(),
                primary_interest: Some("Hiking".into()),
            },
            Buddy {
                id: 2,
                full_name: "Jordan Smith".into(),
                email: "jordan@x.io".into(),
                primary_interest: Some("Climbing".into()),
            },
        ];
        let ids = |v: Vec<&Buddy>| v.into_iter().map(|b| b.id).collect::<Vec<_>>();
        assert_eq!(ids(filter_buddies(&buddies, "MAYA", None)), vec![1]);
        assert_eq!(ids(filter_buddies(&buddies, "x.io", Some("Climbing"))), vec![2]);
        assert_eq!(ids(filter_buddies(&buddies, "", None)), vec![1, 2]);
    }
}
