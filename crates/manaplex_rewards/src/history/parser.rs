//! Total parser from raw history events to the normalized event model.
//!
//! `parse_event` never fails: anything that cannot be decoded into a known
//! shape degrades to an `Empty` payload with `parsing_error` set and the
//! original payload text kept as a raw fallback. Malformed entries are
//! retained, never dropped; they just contribute nothing downstream.

use serde_json::Value;
use tracing::debug;

use crate::api::fetch::RawHistoryEvent;
use crate::history::events::{
    ChestPayout, ChestSet, DailyClaim, DrawCounts, DrawTier, EventPayload, LeagueClaim,
    ParsedEvent, PurchaseKind, PurchaseReceipt, ScrollTier, SeasonPayout,
};
use crate::history::raw::{
    decode_if_string, reward_list, ClaimRewardData, LeagueResultWire, PotionChargesWire,
    PurchaseResultWire,
};

const UNKNOWN_QUEST: &str = "Unknown";

/// Parse one raw event. Total: returns a fallback entry instead of erroring.
pub fn parse_event(raw: &RawHistoryEvent) -> ParsedEvent {
    // Failed claims legitimately carry a null result; keep them as empty
    // entries rather than flagging them as malformed.
    if !raw.success {
        return finish(raw, EventPayload::Empty, false, None);
    }
    let payload = match raw.event_type.as_str() {
        "claim_daily" => parse_daily(raw),
        "claim_reward" => parse_claim_reward(raw),
        "purchase" => parse_purchase(raw),
        other => {
            debug!(event_type = other, id = %raw.id, "unknown event type");
            None
        }
    };
    match payload {
        Some(payload) => finish(raw, payload, false, None),
        None => {
            let fallback = raw.result.clone().unwrap_or_else(|| raw.data.clone());
            finish(raw, EventPayload::Empty, true, Some(fallback))
        }
    }
}

fn finish(
    raw: &RawHistoryEvent,
    payload: EventPayload,
    parsing_error: bool,
    raw_fallback: Option<String>,
) -> ParsedEvent {
    ParsedEvent {
        id: raw.id.clone(),
        event_type: raw.event_type.clone(),
        player: raw.player.clone(),
        created_date: raw.created_date,
        block_num: raw.block_num,
        success: raw.success,
        payload,
        parsing_error,
        raw_fallback,
    }
}

fn parse_daily(raw: &RawHistoryEvent) -> Option<EventPayload> {
    let result = raw.result.as_deref()?;
    let value: Value = serde_json::from_str(result).ok()?;
    let quest = value.get("quest_data")?;
    let quest_name = quest
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_QUEST)
        .to_string();
    // quest_data.rewards is sometimes a JSON object and sometimes a
    // JSON-encoded string of that object.
    let decoded = decode_if_string(quest.get("rewards")?)?;
    let rewards = reward_list(&decoded)?;
    Some(EventPayload::Daily(DailyClaim {
        quest_name,
        rewards,
    }))
}

fn parse_claim_reward(raw: &RawHistoryEvent) -> Option<EventPayload> {
    let data: ClaimRewardData = serde_json::from_str(&raw.data).ok()?;
    match data {
        ClaimRewardData::LeagueSeason {
            season,
            rewards,
            affiliate_rewards,
        } => {
            // Season payouts carry aggregate glint only; no result envelope.
            Some(EventPayload::LeagueSeason(SeasonPayout {
                season,
                glint: rewards,
                affiliate_glint: affiliate_rewards,
            }))
        }
        ClaimRewardData::League {
            format,
            tier,
            season,
        } => {
            let result = raw.result.as_deref()?;
            let wire: LeagueResultWire = serde_json::from_str(result).ok()?;
            let chests = ChestSet {
                minor: opt_chest(wire.rewards.minor.as_ref())?,
                major: opt_chest(wire.rewards.major.as_ref())?,
                ultimate: opt_chest(wire.rewards.ultimate.as_ref())?,
            };
            Some(EventPayload::League(LeagueClaim {
                format,
                tier,
                season,
                chests,
                draws: DrawCounts {
                    minor: wire.minor_draw,
                    major: wire.major_draw,
                    ultimate: wire.ultimate_draw,
                },
            }))
        }
    }
}

fn parse_purchase(raw: &RawHistoryEvent) -> Option<EventPayload> {
    let result = raw.result.as_deref()?;
    let wire: PurchaseResultWire = serde_json::from_str(result).ok()?;
    let kind = match wire.sub_type.as_str() {
        "minor_draw" => PurchaseKind::Draw {
            tier: DrawTier::Minor,
            payout: chest_from_value(&wire.data)?,
        },
        "major_draw" => PurchaseKind::Draw {
            tier: DrawTier::Major,
            payout: chest_from_value(&wire.data)?,
        },
        "ultimate_draw" => PurchaseKind::Draw {
            tier: DrawTier::Ultimate,
            payout: chest_from_value(&wire.data)?,
        },
        "reward_merits" => PurchaseKind::Merits {
            amount: wire.data.get("amount").and_then(Value::as_u64)?,
        },
        "ranked_draw_entry" => PurchaseKind::RankedEntries {
            player_entries: wire
                .data
                .get("result")
                .and_then(|r| r.get("player_entries"))
                .and_then(Value::as_u64)?,
        },
        "potion" => PurchaseKind::Potion {
            potion_type: wire
                .data
                .get("potion_type")
                .and_then(Value::as_str)?
                .to_string(),
        },
        "unbind_scroll" => {
            let tier: ScrollTier =
                serde_json::from_value(wire.data.get("scroll_type")?.clone()).ok()?;
            PurchaseKind::UnbindScroll { tier }
        }
        other => {
            debug!(sub_type = other, id = %raw.id, "unknown purchase sub_type");
            return None;
        }
    };
    Some(EventPayload::Purchase(PurchaseReceipt {
        kind,
        payment_amount: wire.payment_amount,
        payment_currency: wire.payment_currency,
        quantity: wire.quantity,
    }))
}

/// A chest payout as nested under league results and draw purchases:
/// `{ "result": { "rewards": …, "potions": { "gold": …, "legendary": … } } }`.
fn chest_from_value(value: &Value) -> Option<ChestPayout> {
    let rewards = reward_list(value)?;
    let result = value.get("result").unwrap_or(value);
    let charges = match result.get("potions") {
        Some(p) => serde_json::from_value::<PotionChargesWire>(p.clone()).ok()?,
        None => PotionChargesWire::default(),
    };
    Some(ChestPayout {
        rewards,
        gold_charges_used: charges.gold.map(|c| c.charges_used).unwrap_or(0),
        legendary_charges_used: charges.legendary.map(|c| c.charges_used).unwrap_or(0),
    })
}

fn opt_chest(value: Option<&Value>) -> Option<Option<ChestPayout>> {
    match value {
        Some(v) => chest_from_value(v).map(Some),
        None => Some(None),
    }
}
