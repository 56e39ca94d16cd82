//! 行程已保存目的地
//!
//! 按 xid 记录已保存的目的地。重复保存不会发请求；后端以 400/409 报告重复时
//! 本地直接记为已保存，不向上层报错。

use crate::travel::destination::api::DestinationBackend;
use crate::travel::destination::models::{
    CategoryFilter, GroupAnalysis, RecommendedDestination, SaveOutcome, SavedDestination,
};
use crate::travel::error::ApiResult;
use crate::travel::types::TripId;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Default)]
struct SavedState {
    items: Vec<SavedDestination>,
    keys: HashSet<String>,
}

/// 单个行程的目的地推荐与收藏
pub struct SavedDestinations {
    backend: Arc<dyn DestinationBackend>,
    trip_id: TripId,
    state: Mutex<SavedState>,
    /// 同一时间只允许一个保存请求
    save_lock: Mutex<()>,
}

impl SavedDestinations {
    pub fn new(backend: Arc<dyn DestinationBackend>, trip_id: TripId) -> Self {
        Self {
            backend,
            trip_id,
            state: Mutex::new(SavedState::default()),
            save_lock: Mutex::new(()),
        }
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    pub async fn items(&self) -> Vec<SavedDestination> {
        self.state.lock().await.items.clone()
    }

    pub async fn is_saved(&self, xid: &str) -> bool {
        self.state.lock().await.keys.contains(xid)
    }

    /// 拉取已保存列表并重建 xid 集合
    pub async fn refresh(&self) -> ApiResult<Vec<SavedDestination>> {
        let items = self.backend.saved(self.trip_id).await.map_err(|e| {
            error!("[DestSvc] ❌ 拉取行程 {} 已保存目的地失败: {}", self.trip_id, e);
            e
        })?;
        let mut state = self.state.lock().await;
        state.keys = items.iter().map(|s| s.destination.saved_key()).collect();
        state.items = items.clone();
        info!("[DestSvc] ✅ 行程 {} 已保存目的地: {}", self.trip_id, items.len());
        Ok(items)
    }

    /// 推荐列表（排序由后端决定）
    pub async fn recommendations(
        &self,
        category: CategoryFilter,
        limit: Option<u32>,
    ) -> ApiResult<Vec<RecommendedDestination>> {
        self.backend
            .recommendations(self.trip_id, category, limit)
            .await
    }

    pub async fn group_analysis(&self) -> ApiResult<GroupAnalysis> {
        self.backend.group_analysis(self.trip_id).await
    }

    /// 保存推荐的目的地
    pub async fn save(&self, destination: &RecommendedDestination) -> ApiResult<SaveOutcome> {
        let _saving = self.save_lock.lock().await;
        if self.is_saved(&destination.xid).await {
            info!("[DestSvc] 目的地 {} 已保存，跳过", destination.xid);
            return Ok(SaveOutcome::AlreadySaved);
        }

        match self.backend.save(self.trip_id, destination).await {
            Ok(saved) => {
                let mut state = self.state.lock().await;
                state.keys.insert(destination.xid.clone());
                state.keys.insert(saved.destination.saved_key());
                state.items.push(saved.clone());
                info!("[DestSvc] ✅ {} 已加入行程 {}", destination.name, self.trip_id);
                Ok(SaveOutcome::Saved(saved))
            }
            Err(e) if e.is_conflict() => {
                warn!(
                    "[DestSvc] 后端报告目的地 {} 已保存: {}",
                    destination.xid, e
                );
                self.state
                    .lock()
                    .await
                    .keys
                    .insert(destination.xid.clone());
                Ok(SaveOutcome::AlreadySaved)
            }
            Err(e) => {
                error!("[DestSvc] ❌ 保存目的地 {} 失败: {}", destination.xid, e);
                Err(e)
            }
        }
    }

    /// 移除已保存的目的地，成功后从本地列表删除
    pub async fn remove(&self, saved_id: i64) -> ApiResult<()> {
        self.backend
            .remove(self.trip_id, saved_id)
            .await
            .map_err(|e| {
                error!("[DestSvc] ❌ 移除已保存目的地 {} 失败: {}", saved_id, e);
                e
            })?;
        let mut state = self.state.lock().await;
        if let Some(pos) = state.items.iter().position(|s| s.id == saved_id) {
            let removed = state.items.remove(pos);
            state.keys.remove(&removed.destination.saved_key());
        }
        Ok(())
    }
}
