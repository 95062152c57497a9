//! Reward summary accumulator.
//!
//! One `RewardAggregator` per pipeline run; no shared state across runs or
//! players. Every counter is monotonically non-decreasing during a pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::history::{DrawCounts, EventMeta, LeagueFormat, RewardItem, ScrollTier};

/// Per-card tally, grouped by card id with the gold/regular split kept.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardTally {
    pub edition: u32,
    pub quantity: u64,
    pub gold_quantity: u64,
    pub regular_quantity: u64,
}

/// Cumulative reward totals for one history window.
///
/// Season glint payouts are tracked in their own fields rather than being
/// folded into the itemized counters; they are aggregate season-level
/// figures, not itemizable rewards.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RewardSummary {
    pub total_packs: BTreeMap<u32, u64>,
    pub total_frontier_entries: u64,
    pub total_ranked_entries: u64,
    pub total_cards: BTreeMap<u64, CardTally>,
    pub total_potions: BTreeMap<String, u64>,
    pub total_merits: u64,
    pub total_energy: u64,
    pub total_scrolls: BTreeMap<ScrollTier, u64>,
    pub total_draws: DrawCounts,
    /// Tiers advanced per format, in insertion order. Consumers sort for
    /// display.
    pub league_advancements: BTreeMap<LeagueFormat, Vec<u32>>,
    pub quest_type_breakdown: BTreeMap<String, u64>,
    pub season_glint: u64,
    pub season_affiliate_glint: u64,
    /// Display count of merit purchase bundles (granted merits / 200).
    pub merit_purchase_count: u64,
}

/// Folds extracted reward items and event metadata into a `RewardSummary`.
#[derive(Debug, Default)]
pub struct RewardAggregator {
    summary: RewardSummary,
}

impl RewardAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event's items and metadata into the shared accumulator.
    pub fn aggregate(&mut self, items: &[RewardItem], meta: &EventMeta) {
        let s = &mut self.summary;
        for item in items {
            match item {
                RewardItem::Card {
                    card_id,
                    edition,
                    gold,
                    quantity,
                } => {
                    let entry = s.total_cards.entry(*card_id).or_default();
                    entry.quantity = entry.quantity.saturating_add(*quantity);
                    if *gold {
                        entry.gold_quantity = entry.gold_quantity.saturating_add(*quantity);
                    } else {
                        entry.regular_quantity = entry.regular_quantity.saturating_add(*quantity);
                    }
                    // A card id + edition pairing is stable per stream;
                    // last write wins.
                    entry.edition = *edition;
                }
                RewardItem::Potion {
                    potion_type,
                    quantity,
                } => {
                    *s.total_potions.entry(potion_type.clone()).or_insert(0) += quantity;
                }
                RewardItem::Merits { quantity } => {
                    s.total_merits = s.total_merits.saturating_add(*quantity);
                }
                RewardItem::Energy { quantity } => {
                    s.total_energy = s.total_energy.saturating_add(*quantity);
                }
                RewardItem::Scroll { tier, quantity } => {
                    *s.total_scrolls.entry(*tier).or_insert(0) += quantity;
                }
                RewardItem::Pack { edition, quantity } => {
                    *s.total_packs.entry(*edition).or_insert(0) += quantity;
                }
                RewardItem::RankedEntries { quantity } => {
                    s.total_ranked_entries = s.total_ranked_entries.saturating_add(*quantity);
                }
                RewardItem::FrontierEntries { quantity } => {
                    s.total_frontier_entries = s.total_frontier_entries.saturating_add(*quantity);
                }
            }
        }
        s.total_draws.add(meta.draws);
        if let Some((format, tier)) = meta.league {
            s.league_advancements.entry(format).or_default().push(tier);
        }
        if let Some(name) = &meta.quest_name {
            *s.quest_type_breakdown.entry(name.clone()).or_insert(0) += 1;
        }
        s.season_glint = s.season_glint.saturating_add(meta.glint);
        s.season_affiliate_glint = s.season_affiliate_glint.saturating_add(meta.affiliate_glint);
        s.merit_purchase_count = s
            .merit_purchase_count
            .saturating_add(meta.merit_purchase_units);
    }

    /// Finish the pass and hand the summary to the caller.
    pub fn finalize(self) -> RewardSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(gold: bool, quantity: u64) -> RewardItem {
        RewardItem::Card {
            card_id: 123,
            edition: 7,
            gold,
            quantity,
        }
    }

    #[test]
    fn card_grouping_splits_gold_and_regular() {
        let mut agg = RewardAggregator::new();
        agg.aggregate(&[card(false, 3)], &EventMeta::default());
        agg.aggregate(&[card(false, 3)], &EventMeta::default());
        agg.aggregate(&[card(true, 1)], &EventMeta::default());
        let s = agg.finalize();
        let tally = &s.total_cards[&123];
        assert_eq!(tally.quantity, 7);
        assert_eq!(tally.regular_quantity, 6);
        assert_eq!(tally.gold_quantity, 1);
        assert_eq!(tally.edition, 7);
    }

    #[test]
    fn scalar_counters_conserve_quantities() {
        let mut agg = RewardAggregator::new();
        let items = vec![
            RewardItem::Merits { quantity: 40 },
            RewardItem::Merits { quantity: 60 },
            RewardItem::Energy { quantity: 2 },
            RewardItem::RankedEntries { quantity: 3 },
            RewardItem::FrontierEntries { quantity: 1 },
        ];
        agg.aggregate(&items, &EventMeta::default());
        let s = agg.finalize();
        assert_eq!(s.total_merits, 100);
        assert_eq!(s.total_energy, 2);
        assert_eq!(s.total_ranked_entries, 3);
        assert_eq!(s.total_frontier_entries, 1);
    }

    #[test]
    fn maps_union_per_key() {
        let mut agg = RewardAggregator::new();
        agg.aggregate(
            &[
                RewardItem::Pack {
                    edition: 15,
                    quantity: 2,
                },
                RewardItem::Potion {
                    potion_type: "gold".to_string(),
                    quantity: 5,
                },
                RewardItem::Scroll {
                    tier: ScrollTier::Rare,
                    quantity: 1,
                },
            ],
            &EventMeta::default(),
        );
        agg.aggregate(
            &[RewardItem::Pack {
                edition: 15,
                quantity: 1,
            }],
            &EventMeta::default(),
        );
        let s = agg.finalize();
        assert_eq!(s.total_packs[&15], 3);
        assert_eq!(s.total_potions["gold"], 5);
        assert_eq!(s.total_scrolls[&ScrollTier::Rare], 1);
    }

    #[test]
    fn metadata_counters() {
        let mut agg = RewardAggregator::new();
        let meta = EventMeta {
            quest_name: Some("foundation".to_string()),
            league: Some((LeagueFormat::Wild, 2)),
            draws: DrawCounts {
                minor: 1,
                major: 0,
                ultimate: 0,
            },
            glint: 500,
            affiliate_glint: 50,
            merit_purchase_units: 2,
        };
        agg.aggregate(&[], &meta);
        agg.aggregate(&[], &meta);
        let s = agg.finalize();
        assert_eq!(s.quest_type_breakdown["foundation"], 2);
        assert_eq!(s.league_advancements[&LeagueFormat::Wild], vec![2, 2]);
        assert_eq!(s.total_draws.minor, 2);
        assert_eq!(s.season_glint, 1000);
        assert_eq!(s.season_affiliate_glint, 100);
        assert_eq!(s.merit_purchase_count, 4);
    }
}
