//! manaplex_rewards — reward-history aggregation for Manaplex accounts.
//!
//! Fetches a player's heterogeneous event log (daily-quest claims, league
//! rewards, shop purchases) from the platform API and folds it into a
//! normalized, typed reward summary. Read-only; no signing, no persistence
//! beyond the response cache.

pub mod api;
pub mod history;
pub mod pipeline;
pub mod summary;

pub use api::{
    seal_token, unseal_token, FetchConfig, FetchError, Fetcher, RawHistoryEvent, ResponseCache,
    SeasonRange, TokenError, HISTORY_EVENT_TYPES,
};
pub use history::{
    extract_rewards, parse_event, EventMeta, EventPayload, Extraction, ParsedEvent, RewardItem,
};
pub use pipeline::{
    build_history, DateRange, HistoryPipeline, ParsedPlayerRewardHistory, PipelineError,
};
pub use summary::{merge_summaries, CardTally, RewardAggregator, RewardSummary};
