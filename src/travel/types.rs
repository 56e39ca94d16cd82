//! 通用 DTO 与标识类型

use serde::{Deserialize, Deserializer};

pub type UserId = i64;
pub type TripId = i64;
pub type RequestId = i64;
pub type MembershipId = i64;

/// 分页列表响应 `{count, results}`
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default = "Vec::new", deserialize_with = "deserialize_vec_or_null")]
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn into_results(self) -> Vec<T> {
        self.results
    }
}

/// 反序列化数组字段，处理 null 值
pub(crate) fn deserialize_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// 列表响应：后端有的接口直接返回数组，有的返回分页对象
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Plain(Vec<T>),
    Paged(Paginated<T>),
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Plain(v) => v,
            ListResponse::Paged(p) => p.results,
        }
    }
}

/// 操作完成后界面应跳转到的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextView {
    /// 留在当前页
    Stay,
    /// 返回仪表盘
    Dashboard,
    /// 仪表盘的“我的行程”标签页
    MyTrips,
    /// 行程列表
    TripList,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_tolerates_null_results() {
        let page: Paginated<i64> = serde_json::from_str(r#"{"count":0,"results":null}"#).unwrap();
        assert!(page.results.is_empty());

        let page: Paginated<i64> = serde_json::from_str(r#"{"results":[1,2]}"#).unwrap();
        assert_eq!(page.count, None);
        assert_eq!(page.into_results(), vec![1, 2]);
    }

    fn decode_page<T: serde::de::DeserializeOwned>(raw: &str) -> Vec<T> {
        serde_json::from_str::<Paginated<T>>(raw).unwrap().into_results()
    }

    #[test]
    fn paginated_decodes_generic_items() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Item {
            id: i64,
        }
        let items: Vec<Item> = decode_page(r#"{"count":2,"results":[{"id":1},{"id":2}]}"#);
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);
        assert!(decode_page::<Item>(r#"{"results":null}"#).is_empty());
    }

    #[test]
    fn list_response_accepts_both_shapes() {
        let plain: ListResponse<i64> = serde_json::from_str("[3,4]").unwrap();
        assert_eq!(plain.into_vec(), vec![3, 4]);
        let paged: ListResponse<i64> = serde_json::from_str(r#"{"count":1,"results":[5]}"#).unwrap();
        assert_eq!(paged.into_vec(), vec![5]);
    }
}
