//! History event parsing and reward extraction.

pub(crate) mod events;
mod extract;
mod parser;
pub(crate) mod raw;

pub use events::{
    ChestPayout, ChestSet, DailyClaim, DrawCounts, DrawTier, EventPayload, LeagueClaim,
    LeagueFormat, ParsedEvent, PurchaseKind, PurchaseReceipt, ScrollTier, SeasonPayout,
};
pub use extract::{extract_rewards, EventMeta, Extraction, RewardItem, MERITS_PER_PURCHASE_UNIT};
pub use parser::parse_event;
pub use raw::WireReward;
