//! 行程 HTTP API 客户端
//!
//! 负责所有 `/trips/` 相关的 HTTP 请求

use crate::travel::error::ApiResult;
use crate::travel::http::HttpClient;
use crate::travel::trip::models::{DashboardStats, Invitation, NewTrip, Trip};
use crate::travel::types::{ListResponse, MembershipId, TripId, UserId};
use async_trait::async_trait;
use tracing::info;

/// 行程后端接口
#[async_trait]
pub trait TripBackend: Send + Sync {
    async fn list_trips(&self) -> ApiResult<Vec<Trip>>;

    async fn get_trip(&self, trip_id: TripId) -> ApiResult<Trip>;

    async fn create_trip(&self, trip: &NewTrip) -> ApiResult<Trip>;

    async fn dashboard_stats(&self) -> ApiResult<DashboardStats>;

    async fn invitations(&self) -> ApiResult<Vec<Invitation>>;

    async fn invite(&self, trip_id: TripId, user_id: UserId) -> ApiResult<()>;

    async fn accept_invitation(&self, trip_id: TripId) -> ApiResult<()>;

    async fn reject_invitation(&self, trip_id: TripId) -> ApiResult<()>;

    async fn leave(&self, trip_id: TripId) -> ApiResult<()>;

    async fn remove_member(&self, trip_id: TripId, membership_id: MembershipId) -> ApiResult<()>;

    async fn delete_trip(&self, trip_id: TripId) -> ApiResult<()>;
}

/// 行程相关的 HTTP API 客户端
#[derive(Clone)]
pub struct TripApi {
    http: HttpClient,
}

impl TripApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn post_empty(&self, path: String, operation_name: &str) -> ApiResult<()> {
        self.http.post_ack::<()>(&path, None, operation_name).await
    }
}

#[async_trait]
impl TripBackend for TripApi {
    async fn list_trips(&self) -> ApiResult<Vec<Trip>> {
        let list: ListResponse<Trip> = self.http.get("/trips/", &[], "行程列表").await?;
        let trips = list.into_vec();
        info!("[TripAPI] ✅ 行程列表响应，条目数: {}", trips.len());
        Ok(trips)
    }

    async fn get_trip(&self, trip_id: TripId) -> ApiResult<Trip> {
        self.http
            .get(&format!("/trips/{}/", trip_id), &[], "行程详情")
            .await
    }

    async fn create_trip(&self, trip: &NewTrip) -> ApiResult<Trip> {
        info!(
            "[TripAPI] 📤 创建行程: {} ({} 位受邀者)",
            trip.title,
            trip.invited_user_ids.len()
        );
        self.http.post("/trips/", Some(trip), "创建行程").await
    }

    async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.http
            .get("/trips/dashboard/stats/", &[], "仪表盘统计")
            .await
    }

    async fn invitations(&self) -> ApiResult<Vec<Invitation>> {
        let list: ListResponse<Invitation> =
            self.http.get("/trips/invitations/", &[], "行程邀请").await?;
        Ok(list.into_vec())
    }

    async fn invite(&self, trip_id: TripId, user_id: UserId) -> ApiResult<()> {
        info!("[TripAPI] ✉️ 邀请用户 {} 加入行程 {}", user_id, trip_id);
        self.http
            .post_ack(
                &format!("/trips/{}/invite/", trip_id),
                Some(&serde_json::json!({ "user_id": user_id })),
                "邀请成员",
            )
            .await
    }

    async fn accept_invitation(&self, trip_id: TripId) -> ApiResult<()> {
        self.post_empty(format!("/trips/{}/accept/", trip_id), "接受行程邀请")
            .await
    }

    async fn reject_invitation(&self, trip_id: TripId) -> ApiResult<()> {
        self.post_empty(format!("/trips/{}/reject/", trip_id), "拒绝行程邀请")
            .await
    }

    async fn leave(&self, trip_id: TripId) -> ApiResult<()> {
        self.post_empty(format!("/trips/{}/leave/", trip_id), "退出行程")
            .await
    }

    async fn remove_member(&self, trip_id: TripId, membership_id: MembershipId) -> ApiResult<()> {
        info!("[TripAPI] 🗑️ 移除行程 {} 的成员 {}", trip_id, membership_id);
        self.post_empty(
            format!("/trips/{}/remove-member/{}/", trip_id, membership_id),
            "移除成员",
        )
        .await
    }

    async fn delete_trip(&self, trip_id: TripId) -> ApiResult<()> {
        info!("[TripAPI] 🗑️ 取消行程 {}", trip_id);
        self.http
            .delete_ack(&format!("/trips/{}/delete/", trip_id), "取消行程")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::http::testing::{client_for, stub_once};
    use crate::travel::session::Session;

    #[tokio::test]
    async fn invite_posts_user_id() {
        let (base, request) = stub_once(201, "Created", "{}").await;
        let api = TripApi::new(client_for(&base, Session::new()));
        api.invite(42, 5).await.unwrap();

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /api/trips/42/invite/"));
        assert!(raw.ends_with(r#"{"user_id":5}"#));
    }

    #[tokio::test]
    async fn invitations_read_paginated_results() {
        let body = r#"{"count":1,"results":[{"membership_id":3,"trip_id":42,"title":"Alps",
            "destination":"Interlaken","start_date":"2026-11-12","end_date":"2026-11-20",
            "creator_id":1,"creator_name":"Maya","status":"invited"}]}"#;
        let (base, _request) = stub_once(200, "OK", body).await;
        let api = TripApi::new(client_for(&base, Session::new()));
        let list = api.invitations().await.unwrap();
        assert_eq!(list[0].trip_id, 42);
        assert_eq!(list[0].creator_name, "Maya");
    }
}
