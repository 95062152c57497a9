//! Upstream platform API: fetching, response caching, token handling.

pub(crate) mod cache;
pub(crate) mod fetch;
pub(crate) mod token;

pub use cache::{CacheError, ResponseCache};
pub use fetch::{
    FetchConfig, FetchError, Fetcher, RawHistoryEvent, SeasonRange, HISTORY_EVENT_TYPES,
};
pub use token::{seal_token, unseal_token, TokenError};
