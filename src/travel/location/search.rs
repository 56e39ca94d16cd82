//! 地点自动补全
//!
//! 每次新的查询都会中止上一个还没完成的查询；被中止的调用返回 `Superseded`，
//! 过期的结果不会被交给调用方。

use crate::travel::error::{ApiError, ApiResult};
use crate::travel::location::models::NominatimResult;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

const USER_AGENT: &str = "travel-buddy-app";
const RESULT_LIMIT: &str = "5";

/// 一次搜索的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<NominatimResult>),
    /// 被更新的查询取代
    Superseded,
}

/// 地点搜索
pub struct LocationSearch {
    client: reqwest::Client,
    base_url: String,
    debounce: Duration,
    current: Mutex<Option<AbortHandle>>,
}

impl LocationSearch {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, debounce: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            debounce,
            current: Mutex::new(None),
        }
    }

    /// 搜索地点；空白查询直接返回空结果且不发请求
    pub async fn search(&self, query: &str) -> ApiResult<SearchOutcome> {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = previous {
            debug!("[Location] 中止上一次查询");
            handle.abort();
        }

        let query = query.trim().to_string();
        if query.is_empty() {
            return Ok(SearchOutcome::Results(Vec::new()));
        }

        let client = self.client.clone();
        let url = format!("{}/search", self.base_url);
        let debounce = self.debounce;
        let task = tokio::spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }
            fetch(&client, &url, &query).await
        });
        *self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task.abort_handle());

        match task.await {
            Ok(result) => result.map(SearchOutcome::Results),
            Err(e) if e.is_cancelled() => Ok(SearchOutcome::Superseded),
            Err(e) => Err(ApiError::InvalidState(format!("地点搜索任务异常: {}", e))),
        }
    }

    /// 中止进行中的查询（关闭下拉框时）
    pub fn cancel(&self) {
        if let Some(handle) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

async fn fetch(client: &reqwest::Client, url: &str, query: &str) -> ApiResult<Vec<NominatimResult>> {
    info!("[Location] 🔍 搜索地点: {}", query);
    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .query(&[
            ("q", query),
            ("format", "json"),
            ("addressdetails", "1"),
            ("limit", RESULT_LIMIT),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        error!("[Location] ❌ 地点搜索失败，HTTP状态: {}", status);
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            detail: "Failed to fetch locations".to_string(),
        });
    }
    let results: Vec<NominatimResult> = serde_json::from_slice(&response.bytes().await?)?;
    debug!("[Location] 返回 {} 个地点", results.len());
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::http::testing::stub_once;

    fn searcher(base: &str, debounce: Duration) -> LocationSearch {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        LocationSearch::new(client, base, debounce)
    }

    #[tokio::test]
    async fn blank_query_sends_nothing() {
        let search = searcher("http://127.0.0.1:9", Duration::ZERO);
        assert_eq!(
            search.search("   ").await.unwrap(),
            SearchOutcome::Results(Vec::new())
        );
    }

    #[tokio::test]
    async fn query_carries_nominatim_parameters() {
        let body = r#"[{"display_name":"Tokyo, Japan","lat":"35.68","lon":"139.76","address":{"city":"Tokyo","country":"Japan"}}]"#;
        let (base, request) = stub_once(200, "OK", body).await;
        let search = searcher(&base, Duration::ZERO);

        let SearchOutcome::Results(results) = search.search("Tokyo").await.unwrap() else {
            panic!("expected results");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].resolve().city, "Tokyo");

        let raw = request.await.unwrap();
        let first_line = raw.lines().next().unwrap();
        assert!(first_line.starts_with("GET /api/search?"));
        assert!(first_line.contains("q=Tokyo"));
        assert!(first_line.contains("format=json"));
        assert!(first_line.contains("addressdetails=1"));
        assert!(first_line.contains("limit=5"));
        assert!(raw.to_lowercase().contains("user-agent: travel-buddy-app"));
    }

    #[tokio::test]
    async fn newer_query_supersedes_older_one() {
        let body = r#"[{"display_name":"Interlaken","lat":"46.68","lon":"7.86","address":{"town":"Interlaken"}}]"#;
        let (base, _request) = stub_once(200, "OK", body).await;
        let search = searcher(&base, Duration::from_millis(200));

        let (first, second) = tokio::join!(search.search("Inter"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            search.search("Interlaken").await
        });
        assert_eq!(first.unwrap(), SearchOutcome::Superseded);
        match second.unwrap() {
            SearchOutcome::Results(r) => assert_eq!(r[0].resolve().city, "Interlaken"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
