//! 行程数据结构

use crate::travel::types::{deserialize_vec_or_null, MembershipId, TripId, UserId};
use serde::{Deserialize, Serialize};

/// 成员角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Creator,
    Member,
}

/// 成员状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Invited,
    Accepted,
    Rejected,
}

/// 行程状态（后端根据日期计算）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Upcoming,
    #[default]
    Planned,
    Completed,
    Confirmed,
    #[serde(other)]
    Unknown,
}

/// 行程成员
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripMember {
    pub membership_id: MembershipId,
    /// 成员的用户 ID
    pub id: UserId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub role: MemberRole,
    pub status: MembershipStatus,
}

impl TripMember {
    pub fn user_id(&self) -> UserId {
        self.user_id.unwrap_or(self.id)
    }

    pub fn is_creator(&self) -> bool {
        self.role == MemberRole::Creator
    }
}

/// 行程（详情接口带 `members`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub title: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub status: TripStatus,
    pub creator_id: UserId,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default, alias = "image_url")]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub members: Vec<TripMember>,
}

impl Trip {
    /// 展示用目的地：优先 `destination`，否则拼接 city/country
    pub fn destination_label(&self) -> String {
        if let Some(d) = self.destination.as_deref().filter(|d| !d.is_empty()) {
            return d.to_string();
        }
        [self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn member(&self, user_id: UserId) -> Option<&TripMember> {
        self.members.iter().find(|m| m.user_id() == user_id)
    }

    pub fn creator(&self) -> Option<&TripMember> {
        self.members.iter().find(|m| m.is_creator())
    }
}

/// 待处理的行程邀请（收件箱条目）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub membership_id: MembershipId,
    pub trip_id: TripId,
    pub title: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    pub creator_id: UserId,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub status: String,
}

/// 仪表盘统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub trips_created: u32,
    pub trips_joined: u32,
}

/// 创建行程的请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTrip {
    pub title: String,
    pub city: String,
    pub region: Option<String>,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: String,
    pub end_date: String,
    pub invited_user_ids: Vec<UserId>,
}
