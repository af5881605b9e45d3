pub mod combo;
pub mod cost;
pub mod filter;
pub mod score;
pub mod state;
pub mod tiers;

use crate::data::collection::CollectionDefinition;
use crate::data::crew::CrewEntry;
use crate::data::player::PlayerSnapshot;
use crate::engine::filter::CrewFilter;
use crate::engine::score::{score_crew_pool, ScoreSummary};
use crate::engine::state::{
    build_collection_states, build_crew_pool, CrewRecord, PlayerCollectionState,
};
use crate::parallel::batch_ranges;

/// Number of progress-reporting batches for score-with-progress (streaming jobs).
const SCORE_PROGRESS_BATCH_COUNT: usize = 40;

/// Everything the engine derives for one player: the crew pool projected onto
/// the best owned copies, and the collection states cross-linked with it.
#[derive(Debug, Clone, Default)]
pub struct PlayerEvaluation {
    pub crew: Vec<CrewRecord>,
    pub collections: Vec<PlayerCollectionState>,
}

/// Project the crew catalog onto the player's snapshot, then derive every
/// collection state and annotate crew membership.
pub fn evaluate_player(
    definitions: &[CollectionDefinition],
    catalog: &[CrewEntry],
    player: &PlayerSnapshot,
) -> PlayerEvaluation {
    let mut crew = build_crew_pool(catalog, player);
    let collections = build_collection_states(definitions, player, &mut crew);
    PlayerEvaluation { crew, collections }
}

/// Like [score::score_crew_pool] but runs in batches and invokes
/// `on_progress(done, total)` after each, counted in crew records.
pub fn score_crew_pool_with_progress<F>(
    crew: &mut [CrewRecord],
    states: &[PlayerCollectionState],
    filter: &CrewFilter,
    sale: bool,
    mut on_progress: F,
) -> ScoreSummary
where
    F: FnMut(u32, u32),
{
    let total = crew.len();
    if total == 0 {
        return ScoreSummary::default();
    }
    // Report total immediately so a stream shows "0 / total" while the first batch runs.
    on_progress(0, total as u32);

    let num_batches = SCORE_PROGRESS_BATCH_COUNT.min(total);
    let mut summary = ScoreSummary::default();
    for (start, end) in batch_ranges(total, num_batches) {
        let batch = score_crew_pool(&mut crew[start..end], states, filter, sale);
        summary.scored_crew += batch.scored_crew;
        summary.top_collection_score = summary.top_collection_score.max(batch.top_collection_score);
        summary.top_star_score = summary.top_star_score.max(batch.top_star_score);
        on_progress(end as u32, total as u32);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::collection::{Milestone, MilestoneGoal};
    use crate::data::player::{CryoCollectionRecord, OwnedCopy};

    fn catalog_entry(symbol: &str) -> CrewEntry {
        CrewEntry {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            max_rarity: 5,
            retrievable: true,
        }
    }

    fn fixture() -> (Vec<CollectionDefinition>, Vec<CrewEntry>, PlayerSnapshot) {
        let catalog: Vec<CrewEntry> = (0..10).map(|i| catalog_entry(&format!("crew_{i}"))).collect();
        let definitions = vec![CollectionDefinition {
            id: 7,
            name: "Frontier Medics".to_string(),
            description: String::new(),
            milestones: vec![Milestone {
                goal: MilestoneGoal::Goal(6),
                rewards: vec![],
                buffs: vec![],
            }],
            crew: catalog.iter().map(|entry| entry.symbol.clone()).collect(),
        }];
        let player = PlayerSnapshot {
            crew: vec![
                OwnedCopy {
                    symbol: "crew_0".to_string(),
                    rarity: 3,
                    level: 40,
                    equipped: 2,
                    favorite: false,
                },
                OwnedCopy {
                    symbol: "crew_4".to_string(),
                    rarity: 5,
                    level: 99,
                    equipped: 4,
                    favorite: true,
                },
            ],
            cryo_collections: vec![CryoCollectionRecord {
                id: Some(7),
                name: "Frontier Medics".to_string(),
                progress: MilestoneGoal::Goal(2),
                milestone: None,
                claimable_milestone_index: None,
            }],
        };
        (definitions, catalog, player)
    }

    #[test]
    fn evaluation_links_pool_and_collections() {
        let (definitions, catalog, player) = fixture();
        let view = evaluate_player(&definitions, &catalog, &player);

        assert_eq!(view.crew.len(), 10);
        assert_eq!(view.collections.len(), 1);
        assert_eq!(view.collections[0].needed, 4);
        assert_eq!(view.collections[0].owned, 2);
        assert!(view.crew.iter().all(|record| record.unmaxed_ids == [7]));
    }

    #[test]
    fn batched_scoring_matches_the_single_pass() {
        let (definitions, catalog, player) = fixture();
        let view = evaluate_player(&definitions, &catalog, &player);
        let filter = CrewFilter::default();

        let mut single = view.crew.clone();
        let single_summary = score_crew_pool(&mut single, &view.collections, &filter, false);

        let mut batched = view.crew.clone();
        let mut events = Vec::new();
        let batched_summary = score_crew_pool_with_progress(
            &mut batched,
            &view.collections,
            &filter,
            false,
            |done, total| events.push((done, total)),
        );

        assert_eq!(batched, single);
        assert_eq!(batched_summary, single_summary);
        assert_eq!(events.first(), Some(&(0, 10)));
        assert_eq!(events.last(), Some(&(10, 10)));
        assert!(events.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn empty_pool_reports_no_progress() {
        let mut crew: Vec<CrewRecord> = Vec::new();
        let mut calls = 0;
        let summary = score_crew_pool_with_progress(
            &mut crew,
            &[],
            &CrewFilter::default(),
            false,
            |_, _| calls += 1,
        );
        assert_eq!(summary, ScoreSummary::default());
        assert_eq!(calls, 0);
    }
}
