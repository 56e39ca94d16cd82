//! 搭子关系管理（乐观更新 + 对账）
//!
//! 本地只保存当前用户的匹配列表；每个变更先改本地状态，再调用后端，
//! 失败时重新拉取匹配列表覆盖本地状态。解除关系无论成败都重新拉取。

use crate::travel::buddy::api::BuddyBackend;
use crate::travel::buddy::listener::{BuddyListener, EmptyBuddyListener};
use crate::travel::buddy::models::{Buddy, BuddyMatch, BuddyRequest, RequestStatus};
use crate::travel::buddy::status::derive_status;
use crate::travel::error::{ApiError, ApiResult};
use crate::travel::optimistic::{run_optimistic, ReconcilePolicy};
use crate::travel::session::Session;
use crate::travel::types::UserId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// 匹配列表查询参数（对账时沿用上一次的参数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchQuery {
    pub limit: u32,
    pub min_score: f64,
}

impl Default for MatchQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            min_score: 0.0,
        }
    }
}

/// 搭子关系管理器
pub struct BuddyManager {
    backend: Arc<dyn BuddyBackend>,
    session: Session,
    listener: Arc<dyn BuddyListener>,
    matches: Mutex<Vec<BuddyMatch>>,
    query: Mutex<MatchQuery>,
    /// 正在进行变更的目标用户
    in_flight: StdMutex<HashSet<UserId>>,
}

/// 变更进行中的标记，drop 时移除
struct InFlightGuard<'a> {
    set: &'a StdMutex<HashSet<UserId>>,
    user_id: UserId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}

fn update_match(list: &mut [BuddyMatch], user_id: UserId, f: impl FnOnce(&mut BuddyMatch)) {
    if let Some(m) = list.iter_mut().find(|m| m.matched_user_id == user_id) {
        f(m);
    }
}

impl BuddyManager {
    /// 创建管理器（使用默认空监听器）
    pub fn new(backend: Arc<dyn BuddyBackend>, session: Session) -> Self {
        Self::with_listener(backend, session, Arc::new(EmptyBuddyListener))
    }

    /// 创建管理器（带自定义监听器）
    pub fn with_listener(
        backend: Arc<dyn BuddyBackend>,
        session: Session,
        listener: Arc<dyn BuddyListener>,
    ) -> Self {
        Self {
            backend,
            session,
            listener,
            matches: Mutex::new(Vec::new()),
            query: Mutex::new(MatchQuery::default()),
            in_flight: StdMutex::new(HashSet::new()),
        }
    }

    /// 当前匹配列表快照
    pub async fn matches(&self) -> Vec<BuddyMatch> {
        self.matches.lock().await.clone()
    }

    /// 指定用户的匹配项
    pub async fn find(&self, user_id: UserId) -> Option<BuddyMatch> {
        self.matches
            .lock()
            .await
            .iter()
            .find(|m| m.matched_user_id == user_id)
            .cloned()
    }

    /// 该用户是否有进行中的变更（界面据此禁用按钮）
    pub fn is_busy(&self, user_id: UserId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user_id)
    }

    /// 全量拉取匹配列表，整体替换本地状态
    ///
    /// 失败时本地列表清空，并通过监听器报告错误
    pub async fn fetch_matches(&self, limit: u32, min_score: f64) -> ApiResult<Vec<BuddyMatch>> {
        *self.query.lock().await = MatchQuery { limit, min_score };
        let result = self.load_matches().await;
        {
            let mut guard = self.matches.lock().await;
            match &result {
                Ok(list) => *guard = list.clone(),
                Err(e) => {
                    error!("[BuddySvc] ❌ 拉取匹配列表失败: {}", e);
                    guard.clear();
                }
            }
        }
        self.publish(result.as_ref().err()).await;
        result
    }

    /// 旧接口路径：拉取请求列表，本地推导每个匹配的关系状态
    pub async fn refresh_statuses_from_requests(&self) -> ApiResult<Vec<BuddyMatch>> {
        let self_id = self.require_user()?;
        let requests = match self.backend.list_requests().await {
            Ok(page) => page.into_results(),
            Err(e) => {
                error!("[BuddySvc] ❌ 拉取搭子请求列表失败: {}", e);
                self.publish(Some(&e)).await;
                return Err(e);
            }
        };
        let snapshot = {
            let mut guard = self.matches.lock().await;
            for m in guard.iter_mut() {
                let (status, request_id) = derive_status(&requests, self_id, m.matched_user_id);
                m.request_status = status;
                m.request_id = request_id;
            }
            guard.clone()
        };
        debug!(
            "[BuddySvc] 根据 {} 条请求记录重新推导了 {} 个匹配的状态",
            requests.len(),
            snapshot.len()
        );
        self.publish(None).await;
        Ok(snapshot)
    }

    /// 已建立关系的搭子列表
    pub async fn accepted_buddies(&self) -> ApiResult<Vec<Buddy>> {
        self.backend.accepted_buddies().await
    }

    /// 发送搭子请求
    pub async fn send_request(&self, target: UserId) -> ApiResult<BuddyRequest> {
        let _guard = self.begin(target)?;
        let self_id = self.require_user()?;
        let current = self.require_match(target).await?;
        if !current.request_status.can_send() {
            return Err(ApiError::InvalidState(format!(
                "与用户 {} 的关系为 {:?}，不能重复发送请求",
                target, current.request_status
            )));
        }

        info!("[BuddySvc] 📤 发送搭子请求 -> {}", target);
        let result = run_optimistic(
            &self.matches,
            ReconcilePolicy::RefetchOnFailure,
            |list| {
                update_match(list, target, |m| {
                    m.request_status = RequestStatus::PendingOutgoing;
                    m.request_id = None;
                })
            },
            async {
                self.publish(None).await;
                self.backend.send_request(target).await
            },
            |list, req| {
                let (status, request_id) = derive_status(std::slice::from_ref(req), self_id, target);
                update_match(list, target, |m| {
                    m.request_status = status;
                    m.request_id = request_id;
                })
            },
            self.load_matches(),
        )
        .await;
        self.publish(result.as_ref().err()).await;
        result
    }

    /// 撤回自己发出的请求
    ///
    /// 本地没有 `request_id` 时不发请求、不改状态，只记录错误
    pub async fn cancel_request(&self, target: UserId) -> ApiResult<()> {
        let _guard = self.begin(target)?;
        let current = self.require_match(target).await?;
        if current.request_status != RequestStatus::PendingOutgoing {
            return Err(ApiError::InvalidState(format!(
                "与用户 {} 的关系为 {:?}，没有可撤回的请求",
                target, current.request_status
            )));
        }
        let Some(request_id) = current.request_id else {
            error!(
                "[BuddySvc] ❌ 撤回请求失败：用户 {} 的待处理请求缺少 request_id",
                target
            );
            return Ok(());
        };

        info!("[BuddySvc] 🗑️ 撤回搭子请求 {} (user={})", request_id, target);
        let result = run_optimistic(
            &self.matches,
            ReconcilePolicy::RefetchOnFailure,
            |list| {
                update_match(list, target, |m| {
                    m.request_status = RequestStatus::None;
                    m.request_id = None;
                })
            },
            async {
                self.publish(None).await;
                self.backend.cancel_request(request_id).await
            },
            |_, _| {},
            self.load_matches(),
        )
        .await;
        self.publish(result.as_ref().err()).await;
        result
    }

    /// 接受对方发来的请求
    pub async fn accept_request(&self, target: UserId) -> ApiResult<BuddyRequest> {
        self.respond(target, true).await
    }

    /// 拒绝对方发来的请求
    pub async fn reject_request(&self, target: UserId) -> ApiResult<BuddyRequest> {
        self.respond(target, false).await
    }

    async fn respond(&self, target: UserId, accept: bool) -> ApiResult<BuddyRequest> {
        let _guard = self.begin(target)?;
        let self_id = self.require_user()?;
        let current = self.require_match(target).await?;
        let request_id = match (current.request_status, current.request_id) {
            (RequestStatus::PendingIncoming, Some(id)) => id,
            (status, id) => {
                return Err(ApiError::InvalidState(format!(
                    "与用户 {} 的关系为 {:?} (request_id={:?})，没有待处理的来访请求",
                    target, status, id
                )))
            }
        };

        let optimistic_status = if accept {
            RequestStatus::Accepted
        } else {
            RequestStatus::Rejected
        };
        info!(
            "[BuddySvc] {} 搭子请求 {} (user={})",
            if accept { "✅ 接受" } else { "🚫 拒绝" },
            request_id,
            target
        );

        let result = run_optimistic(
            &self.matches,
            ReconcilePolicy::RefetchOnFailure,
            |list| update_match(list, target, |m| m.request_status = optimistic_status),
            async {
                self.publish(None).await;
                if accept {
                    self.backend.accept_request(request_id).await
                } else {
                    self.backend.reject_request(request_id).await
                }
            },
            |list, req| {
                update_match(list, target, |m| {
                    if accept {
                        let (status, request_id) =
                            derive_status(std::slice::from_ref(req), self_id, target);
                        m.request_status = status;
                        m.request_id = request_id;
                    } else {
                        // 被拒绝的请求不再有效，之后可以重新发起
                        m.request_status = RequestStatus::Rejected;
                        m.request_id = None;
                    }
                })
            },
            self.load_matches(),
        )
        .await;
        self.publish(result.as_ref().err()).await;
        result
    }

    /// 解除搭子关系
    ///
    /// 解除可能影响其他地方的行程成员关系，因此无论成败都重新拉取
    pub async fn disconnect(&self, target: UserId) -> ApiResult<()> {
        let _guard = self.begin(target)?;
        let current = self.require_match(target).await?;
        if current.request_status != RequestStatus::Accepted {
            return Err(ApiError::InvalidState(format!(
                "与用户 {} 的关系为 {:?}，不是搭子",
                target, current.request_status
            )));
        }

        info!("[BuddySvc] ✂️ 解除搭子关系 (user={})", target);
        let result = run_optimistic(
            &self.matches,
            ReconcilePolicy::AlwaysRefetch,
            |list| {
                update_match(list, target, |m| {
                    m.request_status = RequestStatus::None;
                    m.request_id = None;
                })
            },
            async {
                self.publish(None).await;
                self.backend.disconnect(target).await
            },
            |_, _| {},
            self.load_matches(),
        )
        .await;
        self.publish(result.as_ref().err()).await;
        result
    }

    async fn load_matches(&self) -> ApiResult<Vec<BuddyMatch>> {
        let query = *self.query.lock().await;
        self.backend
            .list_matches(query.limit, query.min_score)
            .await
            .map(|page| page.into_results())
    }

    fn begin(&self, user_id: UserId) -> ApiResult<InFlightGuard<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !set.insert(user_id) {
            warn!("[BuddySvc] ⚠️ 用户 {} 已有进行中的操作", user_id);
            return Err(ApiError::Busy(format!("用户 {} 已有进行中的操作", user_id)));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            user_id,
        })
    }

    fn require_user(&self) -> ApiResult<UserId> {
        self.session
            .current_user_id()
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn require_match(&self, user_id: UserId) -> ApiResult<BuddyMatch> {
        self.find(user_id)
            .await
            .ok_or_else(|| ApiError::InvalidState(format!("匹配列表中没有用户 {}", user_id)))
    }

    async fn publish(&self, err: Option<&ApiError>) {
        let snapshot = self.matches().await;
        self.listener.on_matches_changed(snapshot).await;
        if let Some(e) = err {
            self.listener.on_buddy_error(e.to_string()).await;
        }
    }
}
