//! Normalized event model produced by the parser.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::history::raw::WireReward;

/// League ladder format an advancement belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LeagueFormat {
    Foundation,
    Wild,
    Modern,
}

/// Unbind scroll rarity, keyed by the four-tier naming scheme used in
/// summaries. The shop emits bare rarity names (`"epic"`); chest payloads
/// emit the suffixed form (`"epic_scroll"`). Both decode to the same tier.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScrollTier {
    #[serde(rename = "common_scroll", alias = "common")]
    Common,
    #[serde(rename = "rare_scroll", alias = "rare")]
    Rare,
    #[serde(rename = "epic_scroll", alias = "epic")]
    Epic,
    #[serde(rename = "legendary_scroll", alias = "legendary")]
    Legendary,
}

/// Chest tier for reward draws.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawTier {
    Minor,
    Major,
    Ultimate,
}

/// Draw counters at the chest-tier level.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawCounts {
    pub minor: u64,
    pub major: u64,
    pub ultimate: u64,
}

impl DrawCounts {
    pub fn add(&mut self, other: DrawCounts) {
        self.minor = self.minor.saturating_add(other.minor);
        self.major = self.major.saturating_add(other.major);
        self.ultimate = self.ultimate.saturating_add(other.ultimate);
    }

    pub fn total(&self) -> u64 {
        self.minor
            .saturating_add(self.major)
            .saturating_add(self.ultimate)
    }
}

/// One opened chest: its itemized rewards plus the potion charges the
/// platform consumed while rolling it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ChestPayout {
    pub rewards: Vec<WireReward>,
    pub gold_charges_used: u64,
    pub legendary_charges_used: u64,
}

/// The up-to-three chests attached to a league advancement. A player may
/// not have qualified for all tiers.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ChestSet {
    pub minor: Option<ChestPayout>,
    pub major: Option<ChestPayout>,
    pub ultimate: Option<ChestPayout>,
}

impl ChestSet {
    /// Present chests in minor → major → ultimate order.
    pub fn present(&self) -> impl Iterator<Item = &ChestPayout> {
        [&self.minor, &self.major, &self.ultimate]
            .into_iter()
            .flatten()
    }
}

/// Decoded daily-quest claim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyClaim {
    pub quest_name: String,
    pub rewards: Vec<WireReward>,
}

/// Decoded single-tier league advancement claim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LeagueClaim {
    pub format: LeagueFormat,
    pub tier: u32,
    pub season: u32,
    pub chests: ChestSet,
    pub draws: DrawCounts,
}

/// Season-end payout. Carries aggregate glint totals only; there is no
/// itemized reward list on these entries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SeasonPayout {
    pub season: u32,
    pub glint: u64,
    pub affiliate_glint: u64,
}

/// Decoded shop purchase, dispatched on the receipt's `sub_type`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurchaseKind {
    Draw { tier: DrawTier, payout: ChestPayout },
    Merits { amount: u64 },
    RankedEntries { player_entries: u64 },
    Potion { potion_type: String },
    UnbindScroll { tier: ScrollTier },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PurchaseReceipt {
    #[serde(flatten)]
    pub kind: PurchaseKind,
    pub payment_amount: f64,
    pub payment_currency: String,
    pub quantity: u64,
}

/// Typed payload of a parsed event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "payload", rename_all = "snake_case")]
pub enum EventPayload {
    Daily(DailyClaim),
    League(LeagueClaim),
    LeagueSeason(SeasonPayout),
    Purchase(PurchaseReceipt),
    /// Failed events (null result) and anything that fell back to raw text.
    Empty,
}

/// Normalized projection of one raw history event. Constructed once by the
/// parser and never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParsedEvent {
    pub id: String,
    /// Raw discriminator as the platform sent it (`claim_daily`,
    /// `claim_reward`, `purchase`, or anything unexpected).
    pub event_type: String,
    pub player: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_date: OffsetDateTime,
    pub block_num: u64,
    pub success: bool,
    pub payload: EventPayload,
    /// True when `data`/`result` could not be decoded into any known shape.
    /// The event is still retained; it just contributes nothing.
    pub parsing_error: bool,
    /// Original payload text, kept for display when parsing failed.
    pub raw_fallback: Option<String>,
}

impl ParsedEvent {
    pub fn is_fallback(&self) -> bool {
        self.parsing_error
    }
}

impl LeagueFormat {
    pub fn as_key(&self) -> &'static str {
        match self {
            LeagueFormat::Foundation => "foundation",
            LeagueFormat::Wild => "wild",
            LeagueFormat::Modern => "modern",
        }
    }
}

impl ScrollTier {
    pub fn as_key(&self) -> &'static str {
        match self {
            ScrollTier::Common => "common_scroll",
            ScrollTier::Rare => "rare_scroll",
            ScrollTier::Epic => "epic_scroll",
            ScrollTier::Legendary => "legendary_scroll",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_tier_accepts_both_namings() {
        let bare: ScrollTier = serde_json::from_str(r#""epic""#).unwrap();
        let suffixed: ScrollTier = serde_json::from_str(r#""epic_scroll""#).unwrap();
        assert_eq!(bare, ScrollTier::Epic);
        assert_eq!(suffixed, ScrollTier::Epic);
        assert_eq!(serde_json::to_string(&bare).unwrap(), r#""epic_scroll""#);
    }

    #[test]
    fn chest_set_skips_absent_tiers() {
        let set = ChestSet {
            minor: Some(ChestPayout::default()),
            major: None,
            ultimate: Some(ChestPayout::default()),
        };
        assert_eq!(set.present().count(), 2);
    }

    #[test]
    fn league_format_keys() {
        assert_eq!(LeagueFormat::Foundation.as_key(), "foundation");
        let f: LeagueFormat = serde_json::from_str(r#""modern""#).unwrap();
        assert_eq!(f, LeagueFormat::Modern);
    }
}
