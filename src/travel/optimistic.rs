//! 乐观更新 + 失败后全量拉取对账
//!
//! 每个变更操作都拆成四步：
//! 1. `optimistic`：立即修改本地状态
//! 2. `remote`：调用后端
//! 3. `on_success`：把后端返回的实体合并进本地状态
//! 4. `refetch`：按 `ReconcilePolicy` 用后端权威数据整体替换本地状态
//!
//! 失败时本地状态一定被 `refetch` 的结果覆盖，不会停留在乐观值上；
//! `refetch` 本身失败时退回 `S::default()`（与列表拉取失败时展示空列表一致）。

use crate::travel::error::ApiResult;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// 对账策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// 仅在远端调用失败时重新拉取
    RefetchOnFailure,
    /// 无论成功失败都重新拉取
    AlwaysRefetch,
}

/// 执行一次乐观更新
pub async fn run_optimistic<S, T, Opt, Remote, Success, Refetch>(
    state: &Mutex<S>,
    policy: ReconcilePolicy,
    optimistic: Opt,
    remote: Remote,
    on_success: Success,
    refetch: Refetch,
) -> ApiResult<T>
where
    S: Default,
    Opt: FnOnce(&mut S),
    Remote: Future<Output = ApiResult<T>>,
    Success: FnOnce(&mut S, &T),
    Refetch: Future<Output = ApiResult<S>>,
{
    {
        let mut guard = state.lock().await;
        optimistic(&mut guard);
    }

    let result = remote.await;

    let needs_refetch = match &result {
        Ok(value) => {
            let mut guard = state.lock().await;
            on_success(&mut guard, value);
            policy == ReconcilePolicy::AlwaysRefetch
        }
        Err(e) => {
            error!("[Optimistic] 远端调用失败，回滚为权威数据: {}", e);
            true
        }
    };

    if needs_refetch {
        let fresh = refetch.await;
        let mut guard = state.lock().await;
        match fresh {
            Ok(s) => {
                debug!("[Optimistic] 对账完成");
                *guard = s;
            }
            Err(e) => {
                error!("[Optimistic] 对账拉取失败，清空本地状态: {}", e);
                *guard = S::default();
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::error::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn authoritative() -> Vec<&'static str> {
        vec!["a", "b"]
    }

    #[tokio::test]
    async fn failure_restores_authoritative_state() {
        let state = Mutex::new(authoritative());
        let result: ApiResult<()> = run_optimistic(
            &state,
            ReconcilePolicy::RefetchOnFailure,
            |s| s.push("optimistic"),
            async { Err(ApiError::InvalidState("boom".into())) },
            |_, _| {},
            async { Ok(authoritative()) },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(*state.lock().await, authoritative());
    }

    #[tokio::test]
    async fn success_merges_without_refetch() {
        let state = Mutex::new(authoritative());
        let refetches = AtomicUsize::new(0);
        let result = run_optimistic(
            &state,
            ReconcilePolicy::RefetchOnFailure,
            |s| s.push("pending"),
            async { Ok("confirmed") },
            |s, v| {
                if let Some(last) = s.last_mut() {
                    *last = *v;
                }
            },
            async {
                refetches.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            },
        )
        .await;

        assert_eq!(result.unwrap(), "confirmed");
        assert_eq!(*state.lock().await, vec!["a", "b", "confirmed"]);
        assert_eq!(refetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn always_refetch_runs_after_success() {
        let state = Mutex::new(authoritative());
        let result = run_optimistic(
            &state,
            ReconcilePolicy::AlwaysRefetch,
            |s| s.clear(),
            async { Ok(()) },
            |_, _| {},
            async { Ok(vec!["server"]) },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(*state.lock().await, vec!["server"]);
    }

    #[tokio::test]
    async fn failed_refetch_falls_back_to_empty() {
        let state = Mutex::new(authoritative());
        let _: ApiResult<()> = run_optimistic(
            &state,
            ReconcilePolicy::RefetchOnFailure,
            |_| {},
            async { Err(ApiError::InvalidState("remote".into())) },
            |_, _| {},
            async { Err(ApiError::InvalidState("refetch".into())) },
        )
        .await;

        assert!(state.lock().await.is_empty());
    }
}
