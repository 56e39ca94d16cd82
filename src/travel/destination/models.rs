//! 目的地推荐相关数据模型

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 推荐分类筛选，`All` 时不带 category 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Nature,
    Adventure,
    Culture,
    Food,
    Leisure,
}

impl CategoryFilter {
    /// 查询参数值，`All` 返回 None
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Nature => Some("nature"),
            CategoryFilter::Adventure => Some("adventure"),
            CategoryFilter::Culture => Some("culture"),
            CategoryFilter::Food => Some("food"),
            CategoryFilter::Leisure => Some("leisure"),
        }
    }
}

/// 推荐结果（来自第三方 POI 数据，可能还没有本地 ID）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedDestination {
    pub xid: String,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub kinds: String,
    /// 与团队兴趣的匹配度，后端计算，客户端只展示
    #[serde(default, skip_serializing)]
    pub match_score: Option<f64>,
}

/// 已入库的目的地
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Destination {
    pub id: i64,
    #[serde(default)]
    pub xid: Option<String>,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub kinds: Option<String>,
}

impl Destination {
    /// 去重用的键：优先 xid，没有时退回数据库 ID
    pub fn saved_key(&self) -> String {
        match &self.xid {
            Some(xid) if !xid.is_empty() => xid.clone(),
            _ => self.id.to_string(),
        }
    }
}

/// 行程中已保存的目的地
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedDestination {
    pub id: i64,
    pub destination: Destination,
    #[serde(default)]
    pub saved_by: String,
    #[serde(default)]
    pub saved_at: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// 团队偏好分析
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GroupAnalysis {
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub dominant_interests: Vec<String>,
    #[serde(default)]
    pub budget_distribution: HashMap<String, u32>,
    #[serde(default)]
    pub dominant_budget: Option<String>,
    #[serde(default)]
    pub style_distribution: HashMap<String, u32>,
    #[serde(default)]
    pub dominant_style: Option<String>,
}

/// 保存目的地的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// 新保存成功
    Saved(SavedDestination),
    /// 本地已记录或后端报告重复，视为已保存
    AlreadySaved,
}
