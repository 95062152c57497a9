//! Pipeline orchestrator: fetch → parse → extract → aggregate.
//!
//! One network fetch per run; everything after it is synchronous in-memory
//! work. Each run owns its accumulator, so concurrent runs for different
//! players need no locking. Per-event parse failures never abort a run;
//! fetch failures are fatal and propagate as one error.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::api::fetch::{FetchError, Fetcher, RawHistoryEvent};
use crate::api::token::{unseal_token, TokenError};
use crate::history::{extract_rewards, parse_event, ParsedEvent};
use crate::summary::{RewardAggregator, RewardSummary};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("fetch history: {0}")]
    Fetch(#[from] FetchError),
    #[error("unknown season id {0}")]
    InvalidSeason(u32),
    #[error("session token: {0}")]
    Token(#[from] TokenError),
}

/// Inclusive date window for a history run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

/// Final pipeline output: every entry (parsed or fallback) sorted by
/// creation date descending, plus the aggregated summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParsedPlayerRewardHistory {
    pub player: String,
    pub all_entries: Vec<ParsedEvent>,
    pub aggregation: RewardSummary,
    pub total_entries: usize,
    pub season_id: Option<u32>,
    pub date_range: Option<DateRange>,
}

/// Runs history fetches and aggregation against one upstream client.
pub struct HistoryPipeline {
    fetcher: Fetcher,
}

impl HistoryPipeline {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Aggregate a player's reward history over an explicit date window.
    pub async fn run(
        &self,
        player: &str,
        token: &str,
        range: DateRange,
    ) -> Result<ParsedPlayerRewardHistory, PipelineError> {
        let session = unseal_token(token)?;
        let raw = self
            .fetcher
            .player_history(player, &session, range.start, range.end)
            .await?;
        Ok(build_history(player, &raw, None, Some(range)))
    }

    /// Aggregate a player's reward history for one season. Surfaces an
    /// invalid season id before the history fetch is attempted.
    pub async fn run_season(
        &self,
        player: &str,
        token: &str,
        season_id: u32,
    ) -> Result<ParsedPlayerRewardHistory, PipelineError> {
        let session = unseal_token(token)?;
        let season = self
            .fetcher
            .season_range(season_id)
            .await?
            .ok_or(PipelineError::InvalidSeason(season_id))?;
        let range = DateRange {
            start: season.start,
            end: season.end,
        };
        let raw = self
            .fetcher
            .player_history(player, &session, range.start, range.end)
            .await?;
        Ok(build_history(player, &raw, Some(season_id), Some(range)))
    }
}

/// Parse, extract, and aggregate a raw event batch. Pure; used by the
/// pipeline after its fetch and directly by fixture-driven tests.
pub fn build_history(
    player: &str,
    raw: &[RawHistoryEvent],
    season_id: Option<u32>,
    date_range: Option<DateRange>,
) -> ParsedPlayerRewardHistory {
    let mut aggregator = RewardAggregator::new();
    let mut entries: Vec<ParsedEvent> = Vec::with_capacity(raw.len());
    let mut fallback_count = 0usize;
    for event in raw {
        let parsed = parse_event(event);
        if parsed.parsing_error {
            fallback_count += 1;
            debug!(id = %parsed.id, event_type = %parsed.event_type, "event kept as raw fallback");
        }
        let extraction = extract_rewards(&parsed);
        aggregator.aggregate(&extraction.items, &extraction.meta);
        entries.push(parsed);
    }
    // Stable sort: entries with identical timestamps keep fetch order.
    entries.sort_by(|a, b| b.created_date.cmp(&a.created_date));
    let total_entries = entries.len();
    info!(player, total_entries, fallback_count, "history aggregated");
    ParsedPlayerRewardHistory {
        player: player.to_string(),
        all_entries: entries,
        aggregation: aggregator.finalize(),
        total_entries,
        season_id,
        date_range,
    }
}
