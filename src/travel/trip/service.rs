//! 行程成员管理
//!
//! - `TripMembershipManager`：单个行程的成员名单与成员操作
//! - `InvitationInbox`：当前用户待处理的行程邀请
//! - `TripCatalog`：行程列表、仪表盘统计、创建行程
//!
//! 角色判断只用于界面（禁用按钮），真正的权限由后端决定，后端拒绝时原样返回错误。

use crate::travel::error::{ApiError, ApiResult};
use crate::travel::session::Session;
use crate::travel::trip::api::TripBackend;
use crate::travel::trip::listener::{EmptyTripListener, TripListener};
use crate::travel::trip::models::{DashboardStats, Invitation, MembershipStatus, Trip, TripMember};
use crate::travel::trip::validate::TripDraft;
use crate::travel::types::{MembershipId, NextView, TripId, UserId};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// 取消行程前必须取得的确认凭据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelConfirmation {
    trip_id: TripId,
}

impl CancelConfirmation {
    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }
}

/// 单个行程的成员管理器
pub struct TripMembershipManager {
    backend: Arc<dyn TripBackend>,
    session: Session,
    listener: Arc<dyn TripListener>,
    trip_id: TripId,
    trip: Mutex<Option<Trip>>,
}

impl TripMembershipManager {
    pub fn new(backend: Arc<dyn TripBackend>, session: Session, trip_id: TripId) -> Self {
        Self::with_listener(backend, session, trip_id, Arc::new(EmptyTripListener))
    }

    pub fn with_listener(
        backend: Arc<dyn TripBackend>,
        session: Session,
        trip_id: TripId,
        listener: Arc<dyn TripListener>,
    ) -> Self {
        Self {
            backend,
            session,
            listener,
            trip_id,
            trip: Mutex::new(None),
        }
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    /// 当前行程快照
    pub async fn trip(&self) -> Option<Trip> {
        self.trip.lock().await.clone()
    }

    /// 全量拉取行程详情（含成员），整体替换本地状态
    pub async fn fetch_trip(&self) -> ApiResult<Trip> {
        let result = self.backend.get_trip(self.trip_id).await;
        match &result {
            Ok(trip) => {
                info!(
                    "[TripSvc] ✅ 行程 {} 详情，成员数: {}",
                    self.trip_id,
                    trip.members.len()
                );
                *self.trip.lock().await = Some(trip.clone());
            }
            Err(e) => {
                error!("[TripSvc] ❌ 拉取行程 {} 失败: {}", self.trip_id, e);
                *self.trip.lock().await = None;
            }
        }
        self.publish(result.as_ref().err()).await;
        result
    }

    /// 邀请成员（仅创建者可用，后端判定）
    ///
    /// 成员 ID 由后端分配，不做乐观插入。邀请成功后重新拉取行程；
    /// 拉取失败只通过监听器报告，邀请本身仍算成功，本地名单保持不变
    pub async fn invite_member(&self, user_id: UserId) -> ApiResult<()> {
        if let Err(e) = self.backend.invite(self.trip_id, user_id).await {
            error!(
                "[TripSvc] ❌ 邀请用户 {} 加入行程 {} 失败: {}",
                user_id, self.trip_id, e
            );
            self.publish(Some(&e)).await;
            return Err(e);
        }
        info!("[TripSvc] ✉️ 已邀请用户 {} 加入行程 {}", user_id, self.trip_id);
        let refetch = self.reconcile().await;
        self.publish(refetch.as_ref().err()).await;
        Ok(())
    }

    /// 接受自己的邀请，成功后重新拉取（状态变为 accepted）
    pub async fn accept_invite(&self) -> ApiResult<Trip> {
        if let Err(e) = self.backend.accept_invitation(self.trip_id).await {
            error!("[TripSvc] ❌ 接受行程 {} 邀请失败: {}", self.trip_id, e);
            self.publish(Some(&e)).await;
            return Err(e);
        }
        self.fetch_trip().await
    }

    /// 拒绝自己的邀请（成员记录被删除），界面离开该行程
    pub async fn decline_invite(&self) -> ApiResult<NextView> {
        self.detach(self.backend.reject_invitation(self.trip_id).await, "拒绝邀请")
            .await?;
        Ok(NextView::Dashboard)
    }

    /// 移除成员（invited 或 accepted 均可），之后总是重新拉取行程
    ///
    /// 拉取失败时保留本地名单（成功移除的成员已先从本地去掉）
    pub async fn remove_member(&self, membership_id: MembershipId) -> ApiResult<()> {
        let target = self.member_by_membership(membership_id).await;
        if target.as_ref().is_some_and(TripMember::is_creator) {
            return Err(ApiError::InvalidState("不能移除行程创建者".to_string()));
        }

        let result = self.backend.remove_member(self.trip_id, membership_id).await;
        match &result {
            Ok(()) => {
                info!(
                    "[TripSvc] ✅ 已移除行程 {} 的成员 {}",
                    self.trip_id, membership_id
                );
                if let Some(trip) = self.trip.lock().await.as_mut() {
                    trip.members.retain(|m| m.membership_id != membership_id);
                }
            }
            Err(e) => error!(
                "[TripSvc] ❌ 移除行程 {} 的成员 {} 失败: {}",
                self.trip_id, membership_id, e
            ),
        }
        let refetch = self.reconcile().await;
        self.publish(result.as_ref().err().or(refetch.as_ref().err()))
            .await;
        result
    }

    /// 非创建者退出行程，成功后返回仪表盘
    pub async fn leave_trip(&self) -> ApiResult<NextView> {
        if self.is_creator().await {
            return Err(ApiError::InvalidState(
                "创建者不能退出行程，请改为取消行程".to_string(),
            ));
        }
        self.detach(self.backend.leave(self.trip_id).await, "退出行程")
            .await?;
        Ok(NextView::Dashboard)
    }

    /// 取消行程前的确认步骤
    pub fn confirm_cancel(&self) -> CancelConfirmation {
        CancelConfirmation {
            trip_id: self.trip_id,
        }
    }

    /// 永久删除行程（仅创建者，后端判定），成功后返回行程列表
    pub async fn cancel_trip(&self, confirmation: CancelConfirmation) -> ApiResult<NextView> {
        if confirmation.trip_id != self.trip_id {
            return Err(ApiError::InvalidState(format!(
                "确认凭据属于行程 {}，不是行程 {}",
                confirmation.trip_id, self.trip_id
            )));
        }
        warn!("[TripSvc] ⚠️ 取消行程 {}", self.trip_id);
        self.detach(self.backend.delete_trip(self.trip_id).await, "取消行程")
            .await?;
        Ok(NextView::TripList)
    }

    /// 当前用户在该行程中的成员记录
    pub async fn my_membership(&self) -> Option<TripMember> {
        let me = self.session.current_user_id()?;
        self.trip.lock().await.as_ref()?.member(me).cloned()
    }

    pub async fn is_creator(&self) -> bool {
        let Some(me) = self.session.current_user_id() else {
            return false;
        };
        self.trip
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| t.creator_id == me)
    }

    pub async fn can_invite(&self) -> bool {
        self.is_creator().await
    }

    /// 创建者可以移除除自己以外的任何成员
    pub async fn can_remove(&self, member: &TripMember) -> bool {
        !member.is_creator() && self.is_creator().await
    }

    pub async fn can_leave(&self) -> bool {
        self.my_membership()
            .await
            .is_some_and(|m| !m.is_creator() && m.status == MembershipStatus::Accepted)
    }

    pub async fn accepted_members(&self) -> Vec<TripMember> {
        self.members_with(MembershipStatus::Accepted).await
    }

    pub async fn pending_members(&self) -> Vec<TripMember> {
        self.members_with(MembershipStatus::Invited).await
    }

    async fn members_with(&self, status: MembershipStatus) -> Vec<TripMember> {
        self.trip
            .lock()
            .await
            .as_ref()
            .map(|t| {
                t.members
                    .iter()
                    .filter(|m| m.status == status)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn member_by_membership(&self, membership_id: MembershipId) -> Option<TripMember> {
        self.trip
            .lock()
            .await
            .as_ref()?
            .members
            .iter()
            .find(|m| m.membership_id == membership_id)
            .cloned()
    }

    /// 变更后的对账拉取，失败时保留本地状态
    async fn reconcile(&self) -> ApiResult<()> {
        match self.backend.get_trip(self.trip_id).await {
            Ok(trip) => {
                *self.trip.lock().await = Some(trip);
                Ok(())
            }
            Err(e) => {
                warn!(
                    "[TripSvc] ⚠️ 对账拉取行程 {} 失败，保留本地名单: {}",
                    self.trip_id, e
                );
                Err(e)
            }
        }
    }

    /// 离开类操作：成功后清空本地状态（界面将离开该行程）
    async fn detach(&self, result: ApiResult<()>, operation_name: &str) -> ApiResult<()> {
        match result {
            Ok(()) => {
                info!("[TripSvc] ✅ {}成功 (trip={})", operation_name, self.trip_id);
                *self.trip.lock().await = None;
                self.publish(None).await;
                Ok(())
            }
            Err(e) => {
                error!(
                    "[TripSvc] ❌ {}失败 (trip={}): {}",
                    operation_name, self.trip_id, e
                );
                self.publish(Some(&e)).await;
                Err(e)
            }
        }
    }

    async fn publish(&self, err: Option<&ApiError>) {
        self.listener.on_trip_changed(self.trip().await).await;
        if let Some(e) = err {
            self.listener.on_trip_error(e.to_string()).await;
        }
    }
}

/// 行程邀请收件箱
pub struct InvitationInbox {
    backend: Arc<dyn TripBackend>,
    listener: Arc<dyn TripListener>,
    items: Mutex<Vec<Invitation>>,
}

impl InvitationInbox {
    pub fn new(backend: Arc<dyn TripBackend>) -> Self {
        Self::with_listener(backend, Arc::new(EmptyTripListener))
    }

    pub fn with_listener(backend: Arc<dyn TripBackend>, listener: Arc<dyn TripListener>) -> Self {
        Self {
            backend,
            listener,
            items: Mutex::new(Vec::new()),
        }
    }

    pub async fn items(&self) -> Vec<Invitation> {
        self.items.lock().await.clone()
    }

    pub async fn refresh(&self) -> ApiResult<Vec<Invitation>> {
        let result = self.backend.invitations().await;
        match &result {
            Ok(list) => *self.items.lock().await = list.clone(),
            Err(e) => error!("[Invitations] ❌ 拉取邀请失败: {}", e),
        }
        self.listener.on_invitations_changed(self.items().await).await;
        result
    }

    /// 接受邀请：移除该条目，界面跳到“我的行程”
    pub async fn accept(&self, trip_id: TripId) -> ApiResult<NextView> {
        self.respond(trip_id, true).await?;
        Ok(NextView::MyTrips)
    }

    /// 拒绝邀请：移除该条目，留在收件箱
    pub async fn decline(&self, trip_id: TripId) -> ApiResult<NextView> {
        self.respond(trip_id, false).await?;
        Ok(NextView::Stay)
    }

    async fn respond(&self, trip_id: TripId, accept: bool) -> ApiResult<()> {
        let result = if accept {
            self.backend.accept_invitation(trip_id).await
        } else {
            self.backend.reject_invitation(trip_id).await
        };
        if let Err(e) = result {
            error!("[Invitations] ❌ 处理行程 {} 的邀请失败: {}", trip_id, e);
            self.listener.on_trip_error(e.to_string()).await;
            return Err(e);
        }
        self.items.lock().await.retain(|i| i.trip_id != trip_id);
        self.listener.on_invitations_changed(self.items().await).await;
        Ok(())
    }
}

/// 行程列表 / 仪表盘 / 创建行程
pub struct TripCatalog {
    backend: Arc<dyn TripBackend>,
}

impl TripCatalog {
    pub fn new(backend: Arc<dyn TripBackend>) -> Self {
        Self { backend }
    }

    pub async fn list_trips(&self) -> ApiResult<Vec<Trip>> {
        self.backend.list_trips().await
    }

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.backend.dashboard_stats().await
    }

    /// 校验表单并创建行程；校验失败时不发请求
    pub async fn create_trip(&self, draft: &TripDraft, today: NaiveDate) -> ApiResult<Trip> {
        let payload = draft.validate(today).inspect_err(|e| {
            warn!("[TripSvc] 创建行程表单校验失败: {}", e);
        })?;
        self.backend.create_trip(&payload).await.inspect_err(|e| {
            error!("[TripSvc] ❌ 创建行程失败: {}", e);
        })
    }
}
