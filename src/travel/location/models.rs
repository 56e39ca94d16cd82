//! 地点搜索（Nominatim）数据结构

use serde::{Deserialize, Serialize};

/// Nominatim 返回的地址明细
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NominatimAddress {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Nominatim 搜索结果（经纬度是字符串）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NominatimResult {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub address: NominatimAddress,
    #[serde(default)]
    pub name: Option<String>,
}

/// 选中后的目的地
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub city: String,
    pub region: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> &'a str {
    candidates
        .iter()
        .flatten()
        .find(|s| !s.is_empty())
        .copied()
        .unwrap_or("")
}

impl NominatimResult {
    /// 把搜索结果解析成目的地
    ///
    /// city 依次取 city / town / village / name；经纬度解析失败时为 NaN
    pub fn resolve(&self) -> LocationData {
        let a = &self.address;
        LocationData {
            city: first_non_empty(&[
                a.city.as_deref(),
                a.town.as_deref(),
                a.village.as_deref(),
                self.name.as_deref(),
            ])
            .to_string(),
            region: a.state.clone().unwrap_or_default(),
            country: a.country.clone().unwrap_or_default(),
            latitude: self.lat.trim().parse().unwrap_or(f64::NAN),
            longitude: self.lon.trim().parse().unwrap_or(f64::NAN),
            display_name: self.display_name.clone(),
        }
    }
}
