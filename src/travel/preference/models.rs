//! 旅行偏好数据模型

use serde::{Deserialize, Serialize};

pub type InterestId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetRange {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelStyle {
    #[default]
    Solo,
    Group,
    Family,
    Adventure,
    Leisure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripDuration {
    #[default]
    Weekend,
    Short,
    Long,
}

/// 兴趣标签
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Interest {
    pub id: InterestId,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// 当前用户已保存的偏好
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preferences {
    pub budget_range: BudgetRange,
    pub travel_style: TravelStyle,
    pub preferred_trip_duration: TripDuration,
    #[serde(default, deserialize_with = "crate::travel::types::deserialize_vec_or_null")]
    pub interests: Vec<Interest>,
}

impl Preferences {
    pub fn interest_ids(&self) -> Vec<InterestId> {
        self.interests.iter().map(|i| i.id).collect()
    }

    /// 转成保存用的请求体
    pub fn to_payload(&self) -> PreferencesPayload {
        PreferencesPayload {
            budget_range: self.budget_range,
            travel_style: self.travel_style,
            preferred_trip_duration: self.preferred_trip_duration,
            interest_ids: self.interest_ids(),
        }
    }
}

/// 保存偏好的请求体
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PreferencesPayload {
    pub budget_range: BudgetRange,
    pub travel_style: TravelStyle,
    pub preferred_trip_duration: TripDuration,
    pub interest_ids: Vec<InterestId>,
}

impl PreferencesPayload {
    /// 勾选/取消勾选兴趣
    pub fn toggle_interest(&mut self, id: InterestId) {
        if let Some(pos) = self.interest_ids.iter().position(|i| *i == id) {
            self.interest_ids.remove(pos);
        } else {
            self.interest_ids.push(id);
        }
    }
}
