//! Reward aggregation and summary merging.

mod aggregate;
mod merge;

pub use aggregate::{CardTally, RewardAggregator, RewardSummary};
pub use merge::merge_summaries;
