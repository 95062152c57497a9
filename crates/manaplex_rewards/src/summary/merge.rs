//! Merging of partial summaries computed per page or per category.
//!
//! Scalar counters sum, map-valued counters sum per key, advancement lists
//! concatenate. The result is independent of input order and grouping up to
//! the insertion order of `league_advancements` (consumers sort for
//! display).

use tracing::warn;

use crate::summary::aggregate::RewardSummary;

/// Merge any number of partial summaries into one.
pub fn merge_summaries<I>(summaries: I) -> RewardSummary
where
    I: IntoIterator<Item = RewardSummary>,
{
    let mut out = RewardSummary::default();
    for summary in summaries {
        merge_into(&mut out, summary);
    }
    out
}

fn merge_into(acc: &mut RewardSummary, other: RewardSummary) {
    for (edition, count) in other.total_packs {
        *acc.total_packs.entry(edition).or_insert(0) += count;
    }
    acc.total_frontier_entries = acc
        .total_frontier_entries
        .saturating_add(other.total_frontier_entries);
    acc.total_ranked_entries = acc
        .total_ranked_entries
        .saturating_add(other.total_ranked_entries);
    for (card_id, tally) in other.total_cards {
        let entry = acc.total_cards.entry(card_id).or_default();
        if entry.quantity == 0 {
            entry.edition = tally.edition;
        } else if entry.edition != tally.edition {
            // Same card id with conflicting editions across partial
            // summaries is a data-quality problem upstream; keep the first.
            warn!(
                card_id,
                kept = entry.edition,
                dropped = tally.edition,
                "conflicting card edition across merged summaries"
            );
        }
        entry.quantity = entry.quantity.saturating_add(tally.quantity);
        entry.gold_quantity = entry.gold_quantity.saturating_add(tally.gold_quantity);
        entry.regular_quantity = entry
            .regular_quantity
            .saturating_add(tally.regular_quantity);
    }
    for (potion, count) in other.total_potions {
        *acc.total_potions.entry(potion).or_insert(0) += count;
    }
    acc.total_merits = acc.total_merits.saturating_add(other.total_merits);
    acc.total_energy = acc.total_energy.saturating_add(other.total_energy);
    for (tier, count) in other.total_scrolls {
        *acc.total_scrolls.entry(tier).or_insert(0) += count;
    }
    acc.total_draws.add(other.total_draws);
    for (format, tiers) in other.league_advancements {
        acc.league_advancements
            .entry(format)
            .or_default()
            .extend(tiers);
    }
    for (quest, count) in other.quest_type_breakdown {
        *acc.quest_type_breakdown.entry(quest).or_insert(0) += count;
    }
    acc.season_glint = acc.season_glint.saturating_add(other.season_glint);
    acc.season_affiliate_glint = acc
        .season_affiliate_glint
        .saturating_add(other.season_affiliate_glint);
    acc.merit_purchase_count = acc
        .merit_purchase_count
        .saturating_add(other.merit_purchase_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{DrawCounts, EventMeta, LeagueFormat, RewardItem, ScrollTier};
    use crate::summary::aggregate::RewardAggregator;

    fn summary_from(items: Vec<RewardItem>, meta: EventMeta) -> RewardSummary {
        let mut agg = RewardAggregator::new();
        agg.aggregate(&items, &meta);
        agg.finalize()
    }

    fn sample_items() -> Vec<Vec<RewardItem>> {
        vec![
            vec![
                RewardItem::Card {
                    card_id: 123,
                    edition: 7,
                    gold: false,
                    quantity: 3,
                },
                RewardItem::Merits { quantity: 40 },
            ],
            vec![
                RewardItem::Card {
                    card_id: 123,
                    edition: 7,
                    gold: true,
                    quantity: 1,
                },
                RewardItem::Pack {
                    edition: 15,
                    quantity: 2,
                },
            ],
            vec![
                RewardItem::Scroll {
                    tier: ScrollTier::Common,
                    quantity: 1,
                },
                RewardItem::Energy { quantity: 5 },
            ],
        ]
    }

    /// Summaries compared with advancement lists sorted, since merge only
    /// guarantees equality up to list order.
    fn normalized(mut s: RewardSummary) -> RewardSummary {
        for tiers in s.league_advancements.values_mut() {
            tiers.sort_unstable();
        }
        s
    }

    #[test]
    fn merge_matches_single_pass() {
        let groups = sample_items();
        let mut single = RewardAggregator::new();
        for items in &groups {
            single.aggregate(items, &EventMeta::default());
        }
        let merged = merge_summaries(
            groups
                .into_iter()
                .map(|items| summary_from(items, EventMeta::default())),
        );
        assert_eq!(merged, single.finalize());
    }

    #[test]
    fn merge_is_commutative_and_associative() {
        let meta_a = EventMeta {
            league: Some((LeagueFormat::Modern, 3)),
            draws: DrawCounts {
                minor: 1,
                major: 0,
                ultimate: 0,
            },
            ..Default::default()
        };
        let meta_b = EventMeta {
            league: Some((LeagueFormat::Modern, 4)),
            glint: 500,
            ..Default::default()
        };
        let groups = sample_items();
        let a = summary_from(groups[0].clone(), meta_a);
        let b = summary_from(groups[1].clone(), meta_b);
        let c = summary_from(groups[2].clone(), EventMeta::default());

        let abc = merge_summaries([a.clone(), b.clone(), c.clone()]);
        let cba = merge_summaries([c.clone(), b.clone(), a.clone()]);
        let nested = merge_summaries([merge_summaries([a, b]), c]);
        assert_eq!(normalized(abc.clone()), normalized(cba));
        assert_eq!(normalized(abc), normalized(nested));
    }

    #[test]
    fn edition_conflict_keeps_first() {
        let first = summary_from(
            vec![RewardItem::Card {
                card_id: 123,
                edition: 7,
                gold: false,
                quantity: 3,
            }],
            EventMeta::default(),
        );
        let second = summary_from(
            vec![RewardItem::Card {
                card_id: 123,
                edition: 9,
                gold: false,
                quantity: 2,
            }],
            EventMeta::default(),
        );
        let merged = merge_summaries([first, second]);
        let tally = &merged.total_cards[&123];
        assert_eq!(tally.edition, 7);
        assert_eq!(tally.quantity, 5);
    }

    #[test]
    fn merge_of_empty_is_identity() {
        let s = summary_from(sample_items().remove(0), EventMeta::default());
        let merged = merge_summaries([RewardSummary::default(), s.clone()]);
        assert_eq!(merged, s);
    }
}
