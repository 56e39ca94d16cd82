//! 偏好编辑
//!
//! 记录后端是否已有偏好：没有时保存走 POST，之后一律 PUT。

use crate::travel::error::ApiResult;
use crate::travel::preference::api::PreferenceBackend;
use crate::travel::preference::models::{Interest, Preferences, PreferencesPayload};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

#[derive(Default)]
struct PreferenceState {
    interests: Vec<Interest>,
    saved: Option<PreferencesPayload>,
}

pub struct PreferenceStore {
    backend: Arc<dyn PreferenceBackend>,
    state: Mutex<PreferenceState>,
}

impl PreferenceStore {
    pub fn new(backend: Arc<dyn PreferenceBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(PreferenceState::default()),
        }
    }

    /// 可选兴趣
    pub async fn interests(&self) -> Vec<Interest> {
        self.state.lock().await.interests.clone()
    }

    /// 最近一次加载或保存成功的偏好
    pub async fn saved(&self) -> Option<PreferencesPayload> {
        self.state.lock().await.saved.clone()
    }

    pub async fn has_preferences(&self) -> bool {
        self.state.lock().await.saved.is_some()
    }

    /// 拉取兴趣列表与当前偏好；没有偏好时返回默认表单
    pub async fn load(&self) -> ApiResult<PreferencesPayload> {
        let interests = self.backend.interests().await.map_err(|e| {
            error!("[PrefSvc] ❌ 拉取兴趣列表失败: {}", e);
            e
        })?;
        let current = self
            .backend
            .my_preferences()
            .await
            .map_err(|e| {
                error!("[PrefSvc] ❌ 拉取偏好失败: {}", e);
                e
            })?
            .as_ref()
            .map(Preferences::to_payload);

        let mut state = self.state.lock().await;
        state.interests = interests;
        state.saved = current.clone();
        info!(
            "[PrefSvc] ✅ 兴趣 {} 个，已有偏好: {}",
            state.interests.len(),
            current.is_some()
        );
        Ok(current.unwrap_or_default())
    }

    /// 保存偏好：首次 POST，之后 PUT
    pub async fn save(&self, payload: &PreferencesPayload) -> ApiResult<()> {
        let exists = self.has_preferences().await;
        let result = if exists {
            self.backend.update(payload).await
        } else {
            self.backend.create(payload).await
        };
        if let Err(e) = &result {
            error!("[PrefSvc] ❌ 保存偏好失败: {}", e);
            return result;
        }
        self.state.lock().await.saved = Some(payload.clone());
        info!("[PrefSvc] ✅ 偏好已保存（{}）", if exists { "PUT" } else { "POST" });
        Ok(())
    }

    /// 新增兴趣标签，成功后加入可选列表
    pub async fn add_interest(&self, name: &str) -> ApiResult<Interest> {
        let name = name.trim();
        let interest = self.backend.create_interest(name).await.map_err(|e| {
            error!("[PrefSvc] ❌ 新增兴趣 {} 失败: {}", name, e);
            e
        })?;
        self.state.lock().await.interests.push(interest.clone());
        Ok(interest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::preference::models::{BudgetRange, TravelStyle};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakePrefs {
        stored: StdMutex<Option<PreferencesPayload>>,
        calls: StdMutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl PreferenceBackend for FakePrefs {
        async fn interests(&self) -> ApiResult<Vec<Interest>> {
            Ok(vec![Interest {
                id: 1,
                name: "Hiking".into(),
                is_active: true,
            }])
        }

        async fn create_interest(&self, name: &str) -> ApiResult<Interest> {
            Ok(Interest {
                id: 2,
                name: name.to_string(),
                is_active: true,
            })
        }

        async fn my_preferences(&self) -> ApiResult<Option<Preferences>> {
            Ok(None)
        }

        async fn create(&self, payload: &PreferencesPayload) -> ApiResult<()> {
            self.calls.lock().unwrap().push("POST");
            *self.stored.lock().unwrap() = Some(payload.clone());
            Ok(())
        }

        async fn update(&self, payload: &PreferencesPayload) -> ApiResult<()> {
            self.calls.lock().unwrap().push("PUT");
            *self.stored.lock().unwrap() = Some(payload.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn first_save_posts_then_puts() {
        let backend = Arc::new(FakePrefs::default());
        let store = PreferenceStore::new(backend.clone());

        let mut form = store.load().await.unwrap();
        assert_eq!(form, PreferencesPayload::default());
        assert!(!store.has_preferences().await);

        form.budget_range = BudgetRange::High;
        form.toggle_interest(1);
        store.save(&form).await.unwrap();

        form.travel_style = TravelStyle::Family;
        store.save(&form).await.unwrap();

        assert_eq!(*backend.calls.lock().unwrap(), vec!["POST", "PUT"]);
        assert_eq!(store.saved().await, Some(form));
    }

    #[tokio::test]
    async fn added_interest_becomes_selectable() {
        let store = PreferenceStore::new(Arc::new(FakePrefs::default()));
        store.load().await.unwrap();
        store.add_interest("  Street food ").await.unwrap();
        let names: Vec<String> = store.interests().await.into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Hiking", "Street food"]);
    }
}
