//! Wire shapes for the stringified `data` / `result` envelopes.
//!
//! The platform emits a union of partially-overlapping record shapes:
//! quest payouts, chest payouts, and purchase receipts all carry reward
//! line items, but each nests them differently and the daily-quest payload
//! is sometimes double-JSON-encoded. Everything here is decode-only
//! plumbing for the parser.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::events::{LeagueFormat, ScrollTier};

/// One reward line item, as emitted inside quest payouts, chest payouts,
/// and purchase receipts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireReward {
    RewardCard {
        card_detail_id: u64,
        #[serde(default)]
        edition: u32,
        #[serde(default)]
        foil: u8,
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
        scroll_type: ScrollTier,
        quantity: u64,
    },
    Pack {
        #[serde(default)]
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

/// `claim_reward` sub-kind, discriminated by `data.type`.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ClaimRewardData {
    League {
        format: LeagueFormat,
        tier: u32,
        season: u32,
    },
    LeagueSeason {
        season: u32,
        #[serde(default)]
        rewards: u64,
        #[serde(default)]
        affiliate_rewards: u64,
    },
}

/// `claim_reward` result envelope for league advancements.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct LeagueResultWire {
    #[serde(default)]
    pub rewards: ChestSetWire,
    #[serde(default)]
    pub minor_draw: u64,
    #[serde(default)]
    pub major_draw: u64,
    #[serde(default)]
    pub ultimate_draw: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ChestSetWire {
    pub minor: Option<Value>,
    pub major: Option<Value>,
    pub ultimate: Option<Value>,
}

/// Potion charges consumed while rolling a chest.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct PotionChargesWire {
    pub gold: Option<ChargeWire>,
    pub legendary: Option<ChargeWire>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ChargeWire {
    #[serde(default)]
    pub charges_used: u64,
}

/// Purchase receipt envelope. `data` stays opaque here; its shape depends
/// on `sub_type` and is decoded by the parser.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PurchaseResultWire {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub purchase_type: String,
    pub sub_type: String,
    #[serde(default)]
    pub payment_amount: f64,
    #[serde(default)]
    pub payment_currency: String,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default)]
    pub data: Value,
}

/// Decode a value that is sometimes a JSON object and sometimes a
/// JSON-encoded string of that object. Returns `None` when the inner text
/// is not valid JSON.
pub(crate) fn decode_if_string(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => serde_json::from_str(s).ok(),
        other => Some(other.clone()),
    }
}

/// Normalize the inconsistent reward-payload shapes into a plain item list.
///
/// Accepted inputs: an `{ "result": { "rewards": … } }` envelope, a bare
/// `{ "rewards": … }` object, a bare array of items, or a single bare item.
/// Returns `None` when any item fails to decode, so the caller can degrade
/// the whole event to its raw-text fallback.
pub(crate) fn reward_list(value: &Value) -> Option<Vec<WireReward>> {
    let inner = value
        .get("result")
        .and_then(|r| r.get("rewards"))
        .or_else(|| value.get("rewards"))
        .unwrap_or(value);
    match inner {
        Value::Array(items) => items
            .iter()
            .map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
        Value::Object(_) => serde_json::from_value::<WireReward>(inner.clone())
            .ok()
            .map(|item| vec![item]),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_if_string_passthrough_and_inner() {
        let obj = json!({"a": 1});
        assert_eq!(decode_if_string(&obj), Some(obj.clone()));
        let encoded = Value::String(r#"{"a":1}"#.to_string());
        assert_eq!(decode_if_string(&encoded), Some(obj));
        let bad = Value::String("{not json".to_string());
        assert_eq!(decode_if_string(&bad), None);
    }

    #[test]
    fn reward_list_bare_array() {
        let v = json!([{"type": "pack", "edition": 15, "quantity": 2}]);
        let items = reward_list(&v).unwrap();
        assert_eq!(
            items,
            vec![WireReward::Pack {
                edition: 15,
                quantity: 2
            }]
        );
    }

    #[test]
    fn reward_list_single_bare_item() {
        let v = json!({"type": "merits", "quantity": 60});
        let items = reward_list(&v).unwrap();
        assert_eq!(items, vec![WireReward::Merits { quantity: 60 }]);
    }

    #[test]
    fn reward_list_enveloped() {
        let v = json!({"result": {"rewards": [{"type": "energy", "quantity": 1}]}});
        let items = reward_list(&v).unwrap();
        assert_eq!(items, vec![WireReward::Energy { quantity: 1 }]);
    }

    #[test]
    fn reward_list_rejects_unknown_item() {
        let v = json!([{"type": "mystery_box", "quantity": 1}]);
        assert!(reward_list(&v).is_none());
    }

    #[test]
    fn wire_card_defaults_foil() {
        let v = json!({"type": "reward_card", "card_detail_id": 123, "edition": 7, "quantity": 3});
        let item: WireReward = serde_json::from_value(v).unwrap();
        assert_eq!(
            item,
            WireReward::RewardCard {
                card_detail_id: 123,
                edition: 7,
                foil: 0,
                quantity: 3
            }
        );
    }
}
