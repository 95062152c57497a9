//! Flattens a parsed event into category-tagged reward items plus the
//! per-event metadata the aggregator needs (quest name, league advancement,
//! draw counters, season glint, purchase unit conversion).
//!
//! Purchases are synthesized into the same item vocabulary as claims, so
//! the aggregator never needs to know where an item came from.

use crate::history::events::{
    DrawCounts, DrawTier, EventPayload, LeagueFormat, ParsedEvent, PurchaseKind, ScrollTier,
};
use crate::history::raw::WireReward;

/// Merits granted per real-world purchase bundle unit. The shop grants
/// merits in multiples of 200; the display purchase count divides by this.
pub const MERITS_PER_PURCHASE_UNIT: u64 = 200;

/// One normalized reward, regardless of which event type or nesting level
/// it came from. Ephemeral: produced and consumed within one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewardItem {
    Card {
        card_id: u64,
        edition: u32,
        gold: bool,
        quantity: u64,
    },
    Potion {
        potion_type: String,
        quantity: u64,
    },
    Merits {
        quantity: u64,
    },
    Energy {
        quantity: u64,
    },
    Scroll {
        tier: ScrollTier,
        quantity: u64,
    },
    Pack {
        edition: u32,
        quantity: u64,
    },
    RankedEntries {
        quantity: u64,
    },
    FrontierEntries {
        quantity: u64,
    },
}

impl RewardItem {
    fn from_wire(wire: &WireReward) -> RewardItem {
        match wire {
            WireReward::RewardCard {
                card_detail_id,
                edition,
                foil,
                quantity,
            } => RewardItem::Card {
                card_id: *card_detail_id,
                edition: *edition,
                gold: *foil != 0,
                quantity: *quantity,
            },
            WireReward::Potion {
                potion_type,
                quantity,
            } => RewardItem::Potion {
                potion_type: potion_type.clone(),
                quantity: *quantity,
            },
            WireReward::Merits { quantity } => RewardItem::Merits {
                quantity: *quantity,
            },
            WireReward::Energy { quantity } => RewardItem::Energy {
                quantity: *quantity,
            },
            WireReward::Scroll {
                scroll_type,
                quantity,
            } => RewardItem::Scroll {
                tier: *scroll_type,
                quantity: *quantity,
            },
            WireReward::Pack { edition, quantity } => RewardItem::Pack {
                edition: *edition,
                quantity: *quantity,
            },
            WireReward::RankedEntries { quantity } => RewardItem::RankedEntries {
                quantity: *quantity,
            },
            WireReward::FrontierEntries { quantity } => RewardItem::FrontierEntries {
                quantity: *quantity,
            },
        }
    }

    /// Quantity regardless of category.
    pub fn quantity(&self) -> u64 {
        match self {
            RewardItem::Card { quantity, .. }
            | RewardItem::Potion { quantity, .. }
            | RewardItem::Merits { quantity }
            | RewardItem::Energy { quantity }
            | RewardItem::Scroll { quantity, .. }
            | RewardItem::Pack { quantity, .. }
            | RewardItem::RankedEntries { quantity }
            | RewardItem::FrontierEntries { quantity } => *quantity,
        }
    }
}

/// Per-event metadata folded alongside the item list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventMeta {
    pub quest_name: Option<String>,
    pub league: Option<(LeagueFormat, u32)>,
    pub draws: DrawCounts,
    pub glint: u64,
    pub affiliate_glint: u64,
    /// Purchase-bundle display count for `reward_merits` purchases
    /// (granted merits / 200); zero everywhere else.
    pub merit_purchase_units: u64,
}

/// Items plus metadata extracted from one event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub items: Vec<RewardItem>,
    pub meta: EventMeta,
}

/// Extract all reward items from a parsed event. Pure; fallback and failed
/// events yield an empty extraction.
pub fn extract_rewards(event: &ParsedEvent) -> Extraction {
    let mut items = Vec::new();
    let mut meta = EventMeta::default();
    match &event.payload {
        EventPayload::Daily(daily) => {
            meta.quest_name = Some(daily.quest_name.clone());
            items.extend(daily.rewards.iter().map(RewardItem::from_wire));
        }
        EventPayload::League(league) => {
            meta.league = Some((league.format, league.tier));
            meta.draws = league.draws;
            for chest in league.chests.present() {
                items.extend(chest.rewards.iter().map(RewardItem::from_wire));
            }
        }
        EventPayload::LeagueSeason(season) => {
            // No itemizable rewards; glint totals are signaled separately.
            meta.glint = season.glint;
            meta.affiliate_glint = season.affiliate_glint;
        }
        EventPayload::Purchase(receipt) => match &receipt.kind {
            PurchaseKind::Draw { tier, payout } => {
                items.extend(payout.rewards.iter().map(RewardItem::from_wire));
                match tier {
                    DrawTier::Minor => meta.draws.minor = receipt.quantity,
                    DrawTier::Major => meta.draws.major = receipt.quantity,
                    DrawTier::Ultimate => meta.draws.ultimate = receipt.quantity,
                }
            }
            PurchaseKind::Merits { amount } => {
                items.push(RewardItem::Merits { quantity: *amount });
                meta.merit_purchase_units = amount / MERITS_PER_PURCHASE_UNIT;
            }
            PurchaseKind::RankedEntries { player_entries } => {
                items.push(RewardItem::RankedEntries {
                    quantity: *player_entries,
                });
            }
            PurchaseKind::Potion { potion_type } => {
                items.push(RewardItem::Potion {
                    potion_type: potion_type.clone(),
                    quantity: receipt.quantity,
                });
            }
            PurchaseKind::UnbindScroll { tier } => {
                items.push(RewardItem::Scroll {
                    tier: *tier,
                    quantity: receipt.quantity,
                });
            }
        },
        EventPayload::Empty => {}
    }
    Extraction { items, meta }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::events::{
        ChestPayout, ChestSet, DailyClaim, LeagueClaim, PurchaseReceipt, SeasonPayout,
    };
    use time::OffsetDateTime;

    fn event(payload: EventPayload) -> ParsedEvent {
        ParsedEvent {
            id: "ev1".to_string(),
            event_type: "claim_reward".to_string(),
            player: "someguy".to_string(),
            created_date: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            block_num: 1,
            success: true,
            payload,
            parsing_error: false,
            raw_fallback: None,
        }
    }

    fn card(quantity: u64) -> WireReward {
        WireReward::RewardCard {
            card_detail_id: 123,
            edition: 7,
            foil: 0,
            quantity,
        }
    }

    #[test]
    fn daily_extraction_carries_quest_name() {
        let ev = event(EventPayload::Daily(DailyClaim {
            quest_name: "foundation".to_string(),
            rewards: vec![WireReward::Pack {
                edition: 15,
                quantity: 2,
            }],
        }));
        let ex = extract_rewards(&ev);
        assert_eq!(ex.meta.quest_name.as_deref(), Some("foundation"));
        assert_eq!(
            ex.items,
            vec![RewardItem::Pack {
                edition: 15,
                quantity: 2
            }]
        );
    }

    #[test]
    fn league_concatenates_present_chests_only() {
        let ev = event(EventPayload::League(LeagueClaim {
            format: LeagueFormat::Wild,
            tier: 2,
            season: 101,
            chests: ChestSet {
                minor: Some(ChestPayout {
                    rewards: vec![card(3)],
                    ..Default::default()
                }),
                major: None,
                ultimate: Some(ChestPayout {
                    rewards: vec![WireReward::Merits { quantity: 40 }],
                    ..Default::default()
                }),
            },
            draws: DrawCounts {
                minor: 1,
                major: 0,
                ultimate: 2,
            },
        }));
        let ex = extract_rewards(&ev);
        assert_eq!(ex.items.len(), 2);
        assert_eq!(ex.meta.league, Some((LeagueFormat::Wild, 2)));
        assert_eq!(ex.meta.draws.ultimate, 2);
    }

    #[test]
    fn season_payout_signals_glint_without_items() {
        let ev = event(EventPayload::LeagueSeason(SeasonPayout {
            season: 101,
            glint: 500,
            affiliate_glint: 50,
        }));
        let ex = extract_rewards(&ev);
        assert!(ex.items.is_empty());
        assert_eq!(ex.meta.glint, 500);
        assert_eq!(ex.meta.affiliate_glint, 50);
    }

    #[test]
    fn merits_purchase_converts_to_bundle_units() {
        let ev = event(EventPayload::Purchase(PurchaseReceipt {
            kind: PurchaseKind::Merits { amount: 400 },
            payment_amount: 4.0,
            payment_currency: "USD".to_string(),
            quantity: 400,
        }));
        let ex = extract_rewards(&ev);
        assert_eq!(ex.items, vec![RewardItem::Merits { quantity: 400 }]);
        assert_eq!(ex.meta.merit_purchase_units, 2);
    }

    #[test]
    fn scroll_purchase_synthesizes_scroll_item() {
        let ev = event(EventPayload::Purchase(PurchaseReceipt {
            kind: PurchaseKind::UnbindScroll {
                tier: ScrollTier::Legendary,
            },
            payment_amount: 1.5,
            payment_currency: "USD".to_string(),
            quantity: 2,
        }));
        let ex = extract_rewards(&ev);
        assert_eq!(
            ex.items,
            vec![RewardItem::Scroll {
                tier: ScrollTier::Legendary,
                quantity: 2
            }]
        );
    }

    #[test]
    fn draw_purchase_counts_draws_and_items() {
        let ev = event(EventPayload::Purchase(PurchaseReceipt {
            kind: PurchaseKind::Draw {
                tier: DrawTier::Major,
                payout: ChestPayout {
                    rewards: vec![card(1)],
                    ..Default::default()
                },
            },
            payment_amount: 2.0,
            payment_currency: "USD".to_string(),
            quantity: 1,
        }));
        let ex = extract_rewards(&ev);
        assert_eq!(ex.items.len(), 1);
        assert_eq!(ex.meta.draws.major, 1);
        assert_eq!(ex.meta.draws.minor, 0);
    }

    #[test]
    fn empty_payload_extracts_nothing() {
        let ex = extract_rewards(&event(EventPayload::Empty));
        assert!(ex.items.is_empty());
        assert_eq!(ex.meta, EventMeta::default());
    }
}
