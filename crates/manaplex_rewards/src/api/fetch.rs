//! Manaplex platform API client with rate limiting, bounded retries, and
//! an optional SQLite response cache.
//!
//! Retry/backoff policy lives here, transparent to the pipeline above:
//! exponential backoff on request errors and non-2xx responses, bounded
//! attempt count.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::api::cache::ResponseCache;

const DEFAULT_API_URL: &str = "https://api.manaplex.io/v1";
const RATE_LIMIT_MS: u64 = 200;
const MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 500;

/// Event types covered by one history fetch. All three are combined into a
/// single upstream call to minimize round trips.
pub const HISTORY_EVENT_TYPES: &str = "claim_reward,claim_daily,purchase";

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub base_url: String,
    pub rate_limit_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub offline: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            rate_limit_ms: RATE_LIMIT_MS,
            max_retries: MAX_RETRIES,
            retry_backoff_ms: RETRY_BACKOFF_MS,
            offline: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("cache: {0}")]
    Cache(#[from] crate::api::cache::CacheError),
    #[error("api error: status {0} body {1}")]
    Api(u16, String),
    #[error("invalid response envelope: {0}")]
    Envelope(String),
    #[error("offline mode: no cached data for key")]
    OfflineMiss,
}

/// One raw history event exactly as the platform returns it. `data` and
/// `result` stay stringified here; the parser decodes them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawHistoryEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub player: String,
    pub success: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_date: OffsetDateTime,
    #[serde(default)]
    pub block_num: u64,
    pub data: String,
    /// Null only when `success` is false.
    pub result: Option<String>,
}

/// Concrete date window for a season id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeasonRange {
    pub season_id: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

/// Upstream client. One instance may serve concurrent pipeline runs; the
/// rate limiter and request counter are the only shared state.
pub struct Fetcher {
    config: FetchConfig,
    client: Option<reqwest::Client>,
    cache: Option<ResponseCache>,
    last_request: std::sync::Mutex<Option<OffsetDateTime>>,
    request_count: AtomicU64,
}

impl Fetcher {
    pub fn new(config: FetchConfig, cache: Option<ResponseCache>) -> Result<Self, FetchError> {
        let client = if config.offline {
            None
        } else {
            Some(
                reqwest::Client::builder()
                    .use_rustls_tls()
                    .timeout(Duration::from_secs(30))
                    .build()?,
            )
        };
        Ok(Self {
            config,
            client,
            cache,
            last_request: std::sync::Mutex::new(None),
            request_count: AtomicU64::new(0),
        })
    }

    async fn rate_limit(&self) {
        let sleep_ms = {
            let prev = self
                .last_request
                .lock()
                .map(|g| *g)
                .unwrap_or_default();
            if let Some(prev) = prev {
                let elapsed = (OffsetDateTime::now_utc() - prev).whole_milliseconds();
                let need: i128 = self.config.rate_limit_ms as i128;
                if elapsed < need {
                    (need - elapsed).max(0) as u64
                } else {
                    0
                }
            } else {
                0
            }
        };
        if sleep_ms > 0 {
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        }
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(OffsetDateTime::now_utc());
        }
    }

    async fn get_json(
        &self,
        path: &str,
        cache_key: &str,
        bearer: Option<&str>,
    ) -> Result<String, FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(cache_key)? {
                debug!(key = %cache_key, "cache hit");
                return Ok(cached);
            }
            if self.config.offline {
                return Err(FetchError::OfflineMiss);
            }
        }

        let client = self.client.as_ref().ok_or(FetchError::OfflineMiss)?;
        self.rate_limit().await;

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            let mut req = client.get(&url);
            if let Some(token) = bearer {
                req = req.bearer_auth(token);
            }
            match req.send().await {
                Ok(r) => {
                    let status = r.status();
                    let body = r.text().await.unwrap_or_default();
                    if !status.is_success() {
                        last_err = Some(FetchError::Api(status.as_u16(), body));
                        if attempt < self.config.max_retries {
                            let ms = self.config.retry_backoff_ms * (1 << attempt);
                            tokio::time::sleep(Duration::from_millis(ms)).await;
                        }
                        continue;
                    }
                    self.request_count.fetch_add(1, Ordering::Relaxed);
                    if let Some(cache) = &self.cache {
                        let _ = cache.put(cache_key, &body);
                    }
                    return Ok(body);
                }
                Err(e) => {
                    last_err = Some(FetchError::Request(e));
                    if attempt < self.config.max_retries {
                        let ms = self.config.retry_backoff_ms * (1 << attempt);
                        warn!(attempt, ms, "retry after request error");
                        tokio::time::sleep(Duration::from_millis(ms)).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(FetchError::Api(0, "unknown".to_string())))
    }

    /// Fetch all history events for a player in the given window. One call
    /// covers daily claims, league rewards, and purchases.
    pub async fn player_history(
        &self,
        player: &str,
        session: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<RawHistoryEvent>, FetchError> {
        let from = format_rfc3339(start)?;
        let to = format_rfc3339(end)?;
        let norm = serde_json::json!({
            "player": player,
            "types": HISTORY_EVENT_TYPES,
            "from": from,
            "to": to,
        });
        let cache_key = ResponseCache::key_for(&norm.to_string());
        let path = format!(
            "/players/history?username={}&types={}&from={}&to={}",
            urlencoding::encode(player),
            urlencoding::encode(HISTORY_EVENT_TYPES),
            urlencoding::encode(&from),
            urlencoding::encode(&to),
        );
        let body = self.get_json(&path, &cache_key, Some(session)).await?;
        let parsed: Vec<RawHistoryEvent> = serde_json::from_str(&body)
            .map_err(|e| FetchError::Envelope(format!("player history: {e}")))?;
        info!(player, count = parsed.len(), "player_history");
        Ok(parsed)
    }

    /// Map a season id to its date window. `Ok(None)` for unrecognized
    /// season ids (the upstream responds with a JSON null body).
    pub async fn season_range(&self, season_id: u32) -> Result<Option<SeasonRange>, FetchError> {
        let norm = serde_json::json!({ "season_id": season_id });
        let cache_key = ResponseCache::key_for(&norm.to_string());
        let path = format!("/settings/season?id={season_id}");
        let body = self.get_json(&path, &cache_key, None).await?;
        serde_json::from_str::<Option<SeasonRange>>(&body)
            .map_err(|e| FetchError::Envelope(format!("season range: {e}")))
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

fn format_rfc3339(ts: OffsetDateTime) -> Result<String, FetchError> {
    ts.format(&Rfc3339)
        .map_err(|e| FetchError::Envelope(format!("timestamp: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let c = FetchConfig::default();
        assert_eq!(c.base_url, DEFAULT_API_URL);
        assert_eq!(c.max_retries, 3);
        assert!(!c.offline);
    }

    #[test]
    fn raw_event_deserializes_with_null_result() {
        let json = r#"{
            "id": "ev9",
            "type": "claim_daily",
            "player": "someguy",
            "success": false,
            "created_date": "2026-04-02T08:00:00Z",
            "block_num": 900,
            "data": "{}",
            "result": null
        }"#;
        let ev: RawHistoryEvent = serde_json::from_str(json).unwrap();
        assert!(!ev.success);
        assert!(ev.result.is_none());
    }

    #[test]
    fn season_range_null_body_is_none() {
        let parsed: Option<SeasonRange> = serde_json::from_str("null").unwrap();
        assert!(parsed.is_none());
    }

    #[tokio::test]
    async fn offline_without_cache_is_a_miss() {
        let fetcher = Fetcher::new(
            FetchConfig {
                offline: true,
                ..Default::default()
            },
            None,
        )
        .unwrap();
        let err = fetcher.season_range(101).await.unwrap_err();
        assert!(matches!(err, FetchError::OfflineMiss));
    }
}
