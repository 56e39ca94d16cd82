//! 行程监听器回调接口

use crate::travel::trip::models::{Invitation, Trip};
use async_trait::async_trait;

/// 行程监听器
#[async_trait]
pub trait TripListener: Send + Sync {
    /// 行程详情（含成员列表）变更；`None` 表示已离开或已取消
    async fn on_trip_changed(&self, trip: Option<Trip>);

    /// 邀请收件箱变更
    async fn on_invitations_changed(&self, invitations: Vec<Invitation>);

    async fn on_trip_error(&self, message: String);
}

/// 默认空实现（无操作）
pub struct EmptyTripListener;

#[async_trait]
impl TripListener for EmptyTripListener {
    async fn on_trip_changed(&self, _trip: Option<Trip>) {}
    async fn on_invitations_changed(&self, _invitations: Vec<Invitation>) {}
    async fn on_trip_error(&self, _message: String) {}
}
