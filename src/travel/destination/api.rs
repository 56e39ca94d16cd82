//! 目的地推荐 HTTP API 客户端

use crate::travel::destination::models::{
    CategoryFilter, GroupAnalysis, RecommendedDestination, SavedDestination,
};
use crate::travel::error::ApiResult;
use crate::travel::http::HttpClient;
use crate::travel::types::{ListResponse, TripId};
use async_trait::async_trait;
use tracing::info;

/// 目的地后端接口
#[async_trait]
pub trait DestinationBackend: Send + Sync {
    async fn recommendations(
        &self,
        trip_id: TripId,
        category: CategoryFilter,
        limit: Option<u32>,
    ) -> ApiResult<Vec<RecommendedDestination>>;

    async fn group_analysis(&self, trip_id: TripId) -> ApiResult<GroupAnalysis>;

    async fn save(
        &self,
        trip_id: TripId,
        destination: &RecommendedDestination,
    ) -> ApiResult<SavedDestination>;

    async fn saved(&self, trip_id: TripId) -> ApiResult<Vec<SavedDestination>>;

    async fn remove(&self, trip_id: TripId, saved_id: i64) -> ApiResult<()>;
}

#[derive(Clone)]
pub struct DestinationApi {
    http: HttpClient,
}

impl DestinationApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DestinationBackend for DestinationApi {
    async fn recommendations(
        &self,
        trip_id: TripId,
        category: CategoryFilter,
        limit: Option<u32>,
    ) -> ApiResult<Vec<RecommendedDestination>> {
        let mut query = Vec::new();
        if let Some(category) = category.as_query() {
            query.push(("category", category.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let list: ListResponse<RecommendedDestination> = self
            .http
            .get(
                &format!("/trips/{}/recommendations/", trip_id),
                &query,
                "目的地推荐",
            )
            .await?;
        let list = list.into_vec();
        info!("[DestAPI] ✅ 行程 {} 推荐条目数: {}", trip_id, list.len());
        Ok(list)
    }

    async fn group_analysis(&self, trip_id: TripId) -> ApiResult<GroupAnalysis> {
        self.http
            .get(
                &format!("/trips/{}/group-analysis/", trip_id),
                &[],
                "团队偏好分析",
            )
            .await
    }

    async fn save(
        &self,
        trip_id: TripId,
        destination: &RecommendedDestination,
    ) -> ApiResult<SavedDestination> {
        info!("[DestAPI] 📌 保存目的地 {} 到行程 {}", destination.xid, trip_id);
        self.http
            .post(
                &format!("/trips/{}/save-destination/", trip_id),
                Some(destination),
                "保存目的地",
            )
            .await
    }

    async fn saved(&self, trip_id: TripId) -> ApiResult<Vec<SavedDestination>> {
        let list: ListResponse<SavedDestination> = self
            .http
            .get(
                &format!("/trips/{}/saved-destinations/", trip_id),
                &[],
                "已保存目的地",
            )
            .await?;
        Ok(list.into_vec())
    }

    async fn remove(&self, trip_id: TripId, saved_id: i64) -> ApiResult<()> {
        info!("[DestAPI] 🗑️ 移除行程 {} 的已保存目的地 {}", trip_id, saved_id);
        self.http
            .delete_ack(
                &format!("/trips/{}/saved-destinations/{}/", trip_id, saved_id),
                "移除已保存目的地",
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::http::testing::{client_for, stub_once};
    use crate::travel::session::Session;

    #[tokio::test]
    async fn recommendations_omit_all_category() {
        let (base, request) = stub_once(200, "OK", "[]").await;
        let api = DestinationApi::new(client_for(&base, Session::new()));
        let list = api
            .recommendations(7, CategoryFilter::All, Some(12))
            .await
            .unwrap();
        assert!(list.is_empty());

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /api/trips/7/recommendations/?limit=12 "));
    }

    #[tokio::test]
    async fn recommendations_with_category() {
        let body = r#"[{"xid":"N1","name":"Falls","city":"Bled","category":"nature",
            "short_description":"","image":null,"lat":46.3,"lon":14.1,"kinds":"waterfalls"}]"#;
        let (base, request) = stub_once(200, "OK", body).await;
        let api = DestinationApi::new(client_for(&base, Session::new()));
        let list = api
            .recommendations(7, CategoryFilter::Nature, None)
            .await
            .unwrap();
        assert_eq!(list[0].xid, "N1");

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /api/trips/7/recommendations/?category=nature "));
    }

    #[tokio::test]
    async fn duplicate_save_surfaces_conflict() {
        let (base, _request) =
            stub_once(400, "Bad Request", r#"{"detail":"Destination already saved"}"#).await;
        let api = DestinationApi::new(client_for(&base, Session::new()));
        let rec = RecommendedDestination {
            xid: "N1".into(),
            name: "Falls".into(),
            city: "Bled".into(),
            category: "nature".into(),
            short_description: String::new(),
            image: None,
            lat: 46.3,
            lon: 14.1,
            kinds: String::new(),
            match_score: None,
        };
        let err = api.save(7, &rec).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.detail(), Some("Destination already saved"));
    }
}
