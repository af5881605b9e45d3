//! Crew scoring: how much each crew member advances the player's unfinished
//! collections, absolute and per unit of citation currency. Pure over its
//! inputs; the pass parallelizes per crew because records never read each
//! other.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use rayon::prelude::*;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::engine::cost::{citation_cost, citation_table};
use crate::engine::filter::CrewFilter;
use crate::engine::state::{CrewRecord, PlayerCollectionState};

/// Reciprocal-need sums are scaled to integers for stable display and sorting.
pub const COLLECTION_SCORE_SCALE: f64 = 10_000.0;
pub const STAR_SCORE_SCALE: f64 = 1_000_000_000.0;

/// Cost-efficiency score for closing a crew's own rarity gap. `Capped` means
/// the crew is already at maximum rarity and cannot be improved; it rides the
/// wire as the legacy sentinel `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarScore {
    Capped,
    Value(u64),
}

impl StarScore {
    pub fn is_capped(self) -> bool {
        matches!(self, Self::Capped)
    }

    pub fn value(self) -> Option<u64> {
        match self {
            Self::Value(n) => Some(n),
            Self::Capped => None,
        }
    }
}

impl Default for StarScore {
    fn default() -> Self {
        StarScore::Value(0)
    }
}

impl fmt::Display for StarScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capped => write!(f, "capped"),
            Self::Value(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for StarScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Capped => serializer.serialize_i64(-1),
            Self::Value(n) => serializer.serialize_u64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for StarScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoreVisitor;

        impl Visitor<'_> for ScoreVisitor {
            type Value = StarScore;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative score or the sentinel -1")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<StarScore, E> {
                Ok(StarScore::Value(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<StarScore, E> {
                match value {
                    -1 => Ok(StarScore::Capped),
                    n if n >= 0 => Ok(StarScore::Value(n as u64)),
                    n => Err(E::custom(format!("score {n} is not -1 or non-negative"))),
                }
            }
        }

        deserializer.deserialize_any(ScoreVisitor)
    }
}

/// Ranking contract for star scores: `Capped` outranks every numeric value,
/// and two `Capped` crew fall back to their collection scores. Returns
/// `Greater` when `a` ranks higher.
pub fn compare_by_star_score(a: &CrewRecord, b: &CrewRecord) -> Ordering {
    match (a.star_score, b.star_score) {
        (StarScore::Capped, StarScore::Capped) => a.collection_score.cmp(&b.collection_score),
        (StarScore::Capped, StarScore::Value(_)) => Ordering::Greater,
        (StarScore::Value(_), StarScore::Capped) => Ordering::Less,
        (StarScore::Value(x), StarScore::Value(y)) => x.cmp(&y),
    }
}

/// Pool-wide maxima from one scoring pass. Consumers normalize individual
/// scores against these for relative grading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub scored_crew: usize,
    pub top_collection_score: u32,
    pub top_star_score: u64,
}

/// Score every crew record in place against the given collection set.
///
/// Scores are recomputed from zero on each pass. Crew outside the filter
/// keep zero scores, except that crew at maximum rarity are always marked
/// `Capped` so the sentinel stays truthful across the whole pool. Only
/// collections with a positive outstanding need contribute to the sums.
pub fn score_crew_pool(
    crew: &mut [CrewRecord],
    states: &[PlayerCollectionState],
    filter: &CrewFilter,
    sale: bool,
) -> ScoreSummary {
    let mut need_weight: HashMap<u32, f64> = HashMap::with_capacity(states.len());
    for state in states {
        if state.advancing() && state.needed > 0 {
            need_weight.insert(state.id, 1.0 / f64::from(state.needed));
        }
    }
    let table = citation_table(sale);

    let (scored_crew, top_collection_score, top_star_score) = crew
        .par_iter_mut()
        .map(|record| {
            record.collection_score = 0;
            record.star_score = if record.at_max_rarity() {
                StarScore::Capped
            } else {
                StarScore::Value(0)
            };

            if !filter.matches_with_search(record) {
                return (0usize, 0u32, 0u64);
            }

            let raw: f64 = record
                .unmaxed_ids
                .iter()
                .filter_map(|id| need_weight.get(id))
                .sum();
            record.collection_score = (COLLECTION_SCORE_SCALE * raw).round() as u32;

            let mut star_value = 0u64;
            if !record.star_score.is_capped() {
                let cost = citation_cost(record.fusion_rarity(), record.max_rarity, table);
                if cost > 0 {
                    star_value = (STAR_SCORE_SCALE * raw / f64::from(cost)).round() as u64;
                }
                record.star_score = StarScore::Value(star_value);
            }

            (1usize, record.collection_score, star_value)
        })
        .reduce(
            || (0, 0, 0),
            |a, b| (a.0 + b.0, a.1.max(b.1), a.2.max(b.2)),
        );

    ScoreSummary {
        scored_crew,
        top_collection_score,
        top_star_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::collection::{Milestone, MilestoneGoal};

    fn state(id: u32, goal: u32, needed: u32) -> PlayerCollectionState {
        PlayerCollectionState {
            id,
            name: format!("collection-{id}"),
            progress: MilestoneGoal::Goal(goal.saturating_sub(needed)),
            milestone: Milestone {
                goal: MilestoneGoal::Goal(goal),
                rewards: vec![],
                buffs: vec![],
            },
            owned: 0,
            needed,
            progress_pct: 0.0,
            needed_pct: 0.0,
            total_rewards: 0,
            needed_stars: None,
            needed_cost: None,
            description: String::new(),
        }
    }

    fn member(symbol: &str, rarity: u8, max_rarity: u8, unmaxed: &[u32]) -> CrewRecord {
        CrewRecord {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            rarity,
            max_rarity,
            favorite: false,
            retrievable: true,
            highest_owned_rarity: rarity,
            highest_owned_level: 1,
            collection_ids: unmaxed.to_vec(),
            unmaxed_ids: unmaxed.to_vec(),
            immortal_rewards: vec![],
            collection_score: 0,
            star_score: StarScore::default(),
        }
    }

    #[test]
    fn one_needed_collection_scores_at_full_scale() {
        let states = vec![state(1, 5, 1)];
        let mut crew = vec![member("a", 3, 5, &[1]), member("b", 5, 5, &[1])];
        let summary = score_crew_pool(&mut crew, &states, &CrewFilter::default(), false);

        // Crew a: raw 1.0 over a 2-star gap priced at 50000 per star.
        assert_eq!(crew[0].collection_score, 10_000);
        assert_eq!(crew[0].star_score, StarScore::Value(10_000));
        // Crew b cannot be improved.
        assert_eq!(crew[1].star_score, StarScore::Capped);
        assert_eq!(crew[1].collection_score, 10_000);
        assert_eq!(summary.top_collection_score, 10_000);
        assert_eq!(summary.top_star_score, 10_000);
    }

    #[test]
    fn capped_sentinel_tracks_max_rarity_pool_wide() {
        let states = vec![state(1, 5, 2)];
        let filter = CrewFilter {
            search: Some("nobody".to_string()),
            ..CrewFilter::default()
        };
        let mut crew = vec![member("a", 4, 4, &[1]), member("b", 2, 4, &[1])];
        score_crew_pool(&mut crew, &states, &filter, false);

        // Both fail the search; the sentinel must still be truthful.
        assert_eq!(crew[0].star_score, StarScore::Capped);
        assert_eq!(crew[0].collection_score, 0);
        assert_eq!(crew[1].star_score, StarScore::Value(0));
    }

    #[test]
    fn satisfied_and_stalled_collections_are_excluded() {
        let mut done = state(1, 5, 0);
        done.progress_pct = 1.0;
        let mut stalled = state(2, 0, 0);
        stalled.milestone.goal = MilestoneGoal::NotApplicable;
        let states = vec![done, stalled, state(3, 4, 2)];

        let mut crew = vec![member("a", 2, 5, &[1, 2, 3])];
        score_crew_pool(&mut crew, &states, &CrewFilter::default(), false);

        // Only collection 3 contributes: 10000 * (1/2).
        assert_eq!(crew[0].collection_score, 5_000);
    }

    #[test]
    fn rescoring_does_not_accumulate() {
        let states = vec![state(1, 5, 2)];
        let mut crew = vec![member("a", 2, 5, &[1])];
        score_crew_pool(&mut crew, &states, &CrewFilter::default(), false);
        let first = (crew[0].collection_score, crew[0].star_score);
        score_crew_pool(&mut crew, &states, &CrewFilter::default(), false);
        assert_eq!((crew[0].collection_score, crew[0].star_score), first);
    }

    #[test]
    fn sale_pricing_raises_value_density() {
        let states = vec![state(1, 5, 1)];
        let mut crew = vec![member("a", 4, 5, &[1])];
        score_crew_pool(&mut crew, &states, &CrewFilter::default(), false);
        let regular = crew[0].star_score;
        score_crew_pool(&mut crew, &states, &CrewFilter::default(), true);
        let sale = crew[0].star_score;

        assert_eq!(regular, StarScore::Value(20_000));
        assert_eq!(sale, StarScore::Value(25_000));
    }

    #[test]
    fn unowned_crew_price_from_rarity_one() {
        let states = vec![state(1, 5, 1)];
        let mut crew = vec![member("a", 0, 5, &[1])];
        score_crew_pool(&mut crew, &states, &CrewFilter::default(), false);

        // Gap 5-1 = 4 stars at 50000 each.
        assert_eq!(crew[0].star_score, StarScore::Value(5_000));
    }

    #[test]
    fn zero_cost_gap_scores_zero_instead_of_dividing() {
        let states = vec![state(1, 5, 1)];
        let mut crew = vec![member("a", 0, 1, &[1])];
        score_crew_pool(&mut crew, &states, &CrewFilter::default(), false);
        assert_eq!(crew[0].star_score, StarScore::Value(0));
        assert_eq!(crew[0].collection_score, 10_000);
    }

    #[test]
    fn ranking_puts_capped_above_values_then_falls_back() {
        let mut capped_low = member("a", 5, 5, &[]);
        capped_low.star_score = StarScore::Capped;
        capped_low.collection_score = 100;
        let mut capped_high = member("b", 4, 4, &[]);
        capped_high.star_score = StarScore::Capped;
        capped_high.collection_score = 900;
        let mut valued = member("c", 2, 5, &[]);
        valued.star_score = StarScore::Value(u64::MAX);

        assert_eq!(compare_by_star_score(&capped_low, &valued), Ordering::Greater);
        assert_eq!(compare_by_star_score(&valued, &capped_low), Ordering::Less);
        assert_eq!(
            compare_by_star_score(&capped_high, &capped_low),
            Ordering::Greater
        );
    }

    #[test]
    fn star_score_wire_format_uses_legacy_sentinel() {
        assert_eq!(serde_json::to_string(&StarScore::Capped).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&StarScore::Value(42)).unwrap(), "42");
        assert_eq!(
            serde_json::from_str::<StarScore>("-1").unwrap(),
            StarScore::Capped
        );
        assert_eq!(
            serde_json::from_str::<StarScore>("42").unwrap(),
            StarScore::Value(42)
        );
        assert!(serde_json::from_str::<StarScore>("-2").is_err());
    }
}
