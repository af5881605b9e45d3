//! Collection state builder: turns static definitions plus the player's live
//! progress into per-collection runtime states, and annotates the crew pool
//! with collection membership in the same pass. Rebuilding is idempotent;
//! derived fields are reset, never accumulated.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::collection::{CollectionDefinition, Milestone, MilestoneGoal, Reward};
use crate::data::crew::CrewEntry;
use crate::data::player::{select_best_owned_copy, CryoCollectionRecord, OwnedCopy, PlayerSnapshot};
use crate::engine::score::StarScore;

/// Per-session crew view: the catalog row projected onto the player's best
/// owned copy, annotated by the state builder and the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewRecord {
    pub symbol: String,
    pub name: String,
    /// Rarity of the best owned copy; 0 when unowned.
    pub rarity: u8,
    pub max_rarity: u8,
    pub favorite: bool,
    pub retrievable: bool,
    pub highest_owned_rarity: u8,
    pub highest_owned_level: u16,
    #[serde(default)]
    pub collection_ids: Vec<u32>,
    #[serde(default)]
    pub unmaxed_ids: Vec<u32>,
    #[serde(default)]
    pub immortal_rewards: Vec<Reward>,
    #[serde(default)]
    pub collection_score: u32,
    #[serde(default)]
    pub star_score: StarScore,
}

impl CrewRecord {
    pub fn owned(&self) -> bool {
        self.highest_owned_rarity > 0
    }

    pub fn at_max_rarity(&self) -> bool {
        self.rarity >= self.max_rarity
    }

    /// Current rarity as the cost model sees it. The first copy of a crew
    /// arrives at one star, so unowned crew price their climb from rarity 1.
    pub fn fusion_rarity(&self) -> u8 {
        self.rarity.max(1)
    }

    fn reset_derived(&mut self) {
        self.collection_ids.clear();
        self.unmaxed_ids.clear();
        self.immortal_rewards.clear();
        self.collection_score = 0;
        self.star_score = StarScore::default();
    }
}

/// Runtime state of one collection for the current player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCollectionState {
    pub id: u32,
    pub name: String,
    pub progress: MilestoneGoal,
    pub milestone: Milestone,
    pub owned: u32,
    pub needed: u32,
    pub progress_pct: f64,
    pub needed_pct: f64,
    pub total_rewards: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needed_stars: Option<[u32; 6]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needed_cost: Option<u32>,
    pub description: String,
}

impl PlayerCollectionState {
    fn zeroed(definition: &CollectionDefinition) -> Self {
        Self {
            id: definition.id,
            name: definition.name.clone(),
            progress: MilestoneGoal::Goal(0),
            milestone: definition.milestones.first().cloned().unwrap_or_default(),
            owned: 0,
            needed: 0,
            progress_pct: 0.0,
            needed_pct: 0.0,
            total_rewards: 0,
            needed_stars: None,
            needed_cost: None,
            description: String::new(),
        }
    }

    /// The collection can still advance: current goal is numeric and positive.
    pub fn advancing(&self) -> bool {
        self.milestone.goal.is_positive()
    }

    /// Recompute needed, the progress fractions and the reward count from the
    /// current goal and progress. A non-numeric goal leaves zeroes in place.
    pub(crate) fn recompute_progress(&mut self) {
        self.needed = 0;
        self.progress_pct = 0.0;
        self.needed_pct = 0.0;
        self.total_rewards = self.milestone.rewards.len() + self.milestone.buffs.len();
        if let (Some(goal), Some(progress)) = (self.milestone.goal.count(), self.progress.count())
        {
            self.needed = goal.saturating_sub(progress);
            if goal > 0 {
                self.progress_pct = f64::from(progress) / f64::from(goal);
                self.needed_pct = 1.0 - self.progress_pct;
            }
        }
    }
}

/// Project the crew catalog onto the player's owned copies. One record per
/// catalog symbol; multiple owned copies collapse to the best one.
pub fn build_crew_pool(catalog: &[CrewEntry], player: &PlayerSnapshot) -> Vec<CrewRecord> {
    let mut copies_by_symbol: HashMap<&str, Vec<OwnedCopy>> = HashMap::new();
    for copy in &player.crew {
        copies_by_symbol
            .entry(copy.symbol.as_str())
            .or_default()
            .push(copy.clone());
    }

    catalog
        .iter()
        .map(|entry| {
            let owned = copies_by_symbol
                .get(entry.symbol.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let best = select_best_owned_copy(owned);
            let favorite = owned.iter().any(|copy| copy.favorite);
            CrewRecord {
                symbol: entry.symbol.clone(),
                name: entry.name.clone(),
                rarity: best.map(|copy| copy.rarity).unwrap_or(0),
                max_rarity: entry.max_rarity,
                favorite,
                retrievable: entry.retrievable,
                highest_owned_rarity: best.map(|copy| copy.rarity).unwrap_or(0),
                highest_owned_level: best.map(|copy| copy.level).unwrap_or(0),
                collection_ids: Vec::new(),
                unmaxed_ids: Vec::new(),
                immortal_rewards: Vec::new(),
                collection_score: 0,
                star_score: StarScore::default(),
            }
        })
        .collect()
}

/// Build every collection's state and annotate crew membership. The crew
/// pool's derived fields are cleared first so repeated rebuilds are
/// idempotent. Member symbols missing from the pool are skipped.
pub fn build_collection_states(
    definitions: &[CollectionDefinition],
    player: &PlayerSnapshot,
    crew: &mut [CrewRecord],
) -> Vec<PlayerCollectionState> {
    for record in crew.iter_mut() {
        record.reset_derived();
    }

    let mut crew_index: HashMap<String, usize> = HashMap::with_capacity(crew.len());
    for (index, record) in crew.iter().enumerate() {
        crew_index.insert(record.symbol.clone(), index);
    }

    let progress_by_name: HashMap<&str, &CryoCollectionRecord> = player
        .cryo_collections
        .iter()
        .map(|record| (record.name.as_str(), record))
        .collect();

    definitions
        .iter()
        .map(|definition| {
            let mut state = PlayerCollectionState::zeroed(definition);

            // Player progress merges by name; ids drift across game-data
            // versions, so the definition's id is forced back afterwards.
            if let Some(record) = progress_by_name.get(definition.name.as_str()) {
                state.progress = record.progress;
                if let Some(milestone) = &record.milestone {
                    state.milestone = milestone.clone();
                }
            }
            state.id = definition.id;

            state.recompute_progress();
            state.description = simplify_description(&definition.description);

            state.owned = 0;
            let one_away = matches!(
                (state.milestone.goal.count(), state.progress.count()),
                (Some(goal), Some(progress)) if goal as i64 - progress as i64 <= 1
            );

            for symbol in &definition.crew {
                let Some(&index) = crew_index.get(symbol.as_str()) else {
                    continue;
                };
                let record = &mut crew[index];

                record.collection_ids.push(definition.id);
                if state.milestone.goal.is_positive() {
                    record.unmaxed_ids.push(definition.id);
                }
                if record.owned() {
                    state.owned += 1;
                    if one_away && state.milestone.goal.is_positive() && !record.at_max_rarity() {
                        merge_immortal_rewards(record, &state.milestone);
                    }
                }
            }

            state
        })
        .collect()
}

/// Accumulate a milestone's rewards and buffs onto a crew record, matching by
/// symbol: quantities add, entries never duplicate.
fn merge_immortal_rewards(record: &mut CrewRecord, milestone: &Milestone) {
    for reward in milestone.rewards.iter().chain(milestone.buffs.iter()) {
        match record
            .immortal_rewards
            .iter_mut()
            .find(|existing| existing.symbol == reward.symbol)
        {
            Some(existing) => existing.quantity += reward.quantity,
            None => record.immortal_rewards.push(reward.clone()),
        }
    }
}

/// Resolve a user-supplied collection reference to an id. Accepts a numeric
/// id, an exact name (case-insensitive), or a substring that matches exactly
/// one collection. Ambiguous or unknown references resolve to `None`.
pub fn find_collection_id(states: &[PlayerCollectionState], query: &str) -> Option<u32> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(id) = trimmed.parse::<u32>() {
        if states.iter().any(|state| state.id == id) {
            return Some(id);
        }
    }

    let lowered = trimmed.to_lowercase();
    if let Some(state) = states
        .iter()
        .find(|state| state.name.to_lowercase() == lowered)
    {
        return Some(state.id);
    }

    let mut hits = states
        .iter()
        .filter(|state| state.name.to_lowercase().contains(&lowered));
    match (hits.next(), hits.next()) {
        (Some(only), None) => Some(only.id),
        _ => None,
    }
}

/// Cosmetic cleanup of collection descriptions: unescape HTML entities, strip
/// tags, drop the boilerplate lead-in, and normalize the sentence shell.
pub fn simplify_description(raw: &str) -> String {
    let unescaped = unescape_entities(raw);
    let stripped = strip_tags(&unescaped);
    let mut text = stripped.trim().to_string();

    if let Some(rest) = text.strip_prefix("Immortalize ") {
        text = rest.to_string();
    }
    if let Some(rest) = text.strip_prefix("the ") {
        text = rest.to_string();
    }
    if let Some(rest) = text.strip_suffix('.') {
        text = rest.to_string();
    }

    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => text,
    }
}

fn unescape_entities(raw: &str) -> String {
    raw.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(id: u32, name: &str, goal: u32, crew: &[&str]) -> CollectionDefinition {
        CollectionDefinition {
            id,
            name: name.to_string(),
            description: String::new(),
            milestones: vec![Milestone {
                goal: MilestoneGoal::Goal(goal),
                rewards: vec![],
                buffs: vec![],
            }],
            crew: crew.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn entry(symbol: &str, max_rarity: u8) -> CrewEntry {
        CrewEntry {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            max_rarity,
            retrievable: true,
        }
    }

    fn owned(symbol: &str, rarity: u8) -> OwnedCopy {
        OwnedCopy {
            symbol: symbol.to_string(),
            rarity,
            level: 1,
            equipped: 0,
            favorite: false,
        }
    }

    #[test]
    fn progress_fractions_complement_each_other() {
        let definitions = vec![definition(1, "Pioneers", 10, &["a"])];
        let player = PlayerSnapshot {
            crew: vec![],
            cryo_collections: vec![CryoCollectionRecord {
                id: Some(1),
                name: "Pioneers".to_string(),
                progress: MilestoneGoal::Goal(7),
                milestone: None,
                claimable_milestone_index: None,
            }],
        };
        let mut crew = build_crew_pool(&[entry("a", 5)], &player);
        let states = build_collection_states(&definitions, &player, &mut crew);

        assert_eq!(states[0].needed, 3);
        assert!((states[0].progress_pct - 0.7).abs() < 1e-12);
        assert!((states[0].needed_pct - 0.3).abs() < 1e-12);
        assert!((states[0].progress_pct + states[0].needed_pct - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stale_player_id_is_reconciled_to_definition() {
        let definitions = vec![definition(42, "Pioneers", 5, &[])];
        let player = PlayerSnapshot {
            crew: vec![],
            cryo_collections: vec![CryoCollectionRecord {
                id: Some(9000),
                name: "Pioneers".to_string(),
                progress: MilestoneGoal::Goal(1),
                milestone: None,
                claimable_milestone_index: None,
            }],
        };
        let mut crew: Vec<CrewRecord> = vec![];
        let states = build_collection_states(&definitions, &player, &mut crew);
        assert_eq!(states[0].id, 42);
        assert_eq!(states[0].progress, MilestoneGoal::Goal(1));
    }

    #[test]
    fn membership_registers_and_owned_counts_only_owned() {
        let definitions = vec![definition(7, "Pioneers", 3, &["a", "b", "ghost"])];
        let player = PlayerSnapshot {
            crew: vec![owned("a", 2)],
            cryo_collections: vec![],
        };
        let mut crew = build_crew_pool(&[entry("a", 5), entry("b", 4)], &player);
        let states = build_collection_states(&definitions, &player, &mut crew);

        assert_eq!(states[0].owned, 1, "only 'a' is owned; 'ghost' is skipped");
        assert_eq!(crew[0].collection_ids, vec![7]);
        assert_eq!(crew[0].unmaxed_ids, vec![7]);
        assert_eq!(crew[1].collection_ids, vec![7], "unowned members still register");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let definitions = vec![definition(7, "Pioneers", 3, &["a"])];
        let player = PlayerSnapshot {
            crew: vec![owned("a", 2)],
            cryo_collections: vec![],
        };
        let mut crew = build_crew_pool(&[entry("a", 5)], &player);
        let first = build_collection_states(&definitions, &player, &mut crew);
        let first_ids = crew[0].unmaxed_ids.clone();
        let second = build_collection_states(&definitions, &player, &mut crew);

        assert_eq!(first[0].owned, second[0].owned);
        assert_eq!(crew[0].unmaxed_ids, first_ids, "ids must not accumulate");
        assert_eq!(crew[0].collection_ids.len(), 1);
    }

    #[test]
    fn one_away_merges_rewards_by_symbol() {
        let reward = |id: u32, symbol: &str, quantity: u32| Reward {
            id,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            quantity,
            rarity: None,
        };
        let mut def = definition(7, "Pioneers", 3, &["a", "b"]);
        def.milestones[0].rewards = vec![reward(1, "honor", 50)];
        def.milestones[0].buffs = vec![reward(2, "honor", 25), reward(3, "chrons", 10)];

        let player = PlayerSnapshot {
            crew: vec![owned("a", 2), owned("b", 4)],
            cryo_collections: vec![CryoCollectionRecord {
                id: Some(7),
                name: "Pioneers".to_string(),
                progress: MilestoneGoal::Goal(2),
                milestone: None,
                claimable_milestone_index: None,
            }],
        };
        let mut crew = build_crew_pool(&[entry("a", 5), entry("b", 4)], &player);
        build_collection_states(&[def], &player, &mut crew);

        // 'a' (2/5) can be fused now; 'b' (4/4) is already at ceiling.
        let a = &crew[0];
        assert_eq!(a.immortal_rewards.len(), 2);
        let honor = a.immortal_rewards.iter().find(|r| r.symbol == "honor").unwrap();
        assert_eq!(honor.quantity, 75, "reward + buff quantities accumulate");
        assert!(crew[1].immortal_rewards.is_empty());
    }

    #[test]
    fn collection_lookup_accepts_id_name_and_unique_fragment() {
        let definitions = vec![
            definition(3, "Border Medics", 2, &["a"]),
            definition(9, "Deep Space Medics", 2, &["a"]),
            definition(12, "Gauntlet Legends", 2, &["a"]),
        ];
        let player = PlayerSnapshot::default();
        let mut crew = build_crew_pool(&[entry("a", 5)], &player);
        let states = build_collection_states(&definitions, &player, &mut crew);

        assert_eq!(find_collection_id(&states, "9"), Some(9));
        assert_eq!(find_collection_id(&states, "border medics"), Some(3));
        assert_eq!(find_collection_id(&states, "Gauntlet"), Some(12));
        assert_eq!(find_collection_id(&states, "Medics"), None, "ambiguous");
        assert_eq!(find_collection_id(&states, "404"), None);
        assert_eq!(find_collection_id(&states, "  "), None);
    }

    #[test]
    fn collection_lookup_prefers_exact_name_over_fragment() {
        let definitions = vec![
            definition(1, "Vulcan", 2, &["a"]),
            definition(2, "Vulcan Science Academy", 2, &["a"]),
        ];
        let player = PlayerSnapshot::default();
        let mut crew = build_crew_pool(&[entry("a", 5)], &player);
        let states = build_collection_states(&definitions, &player, &mut crew);

        assert_eq!(find_collection_id(&states, "vulcan"), Some(1));
    }

    #[test]
    fn description_simplification_round_trips() {
        let raw = "Immortalize the <b>crew</b> who said &quot;engage&quot; &amp; meant it.";
        assert_eq!(
            simplify_description(raw),
            "Crew who said \"engage\" & meant it"
        );
        assert_eq!(simplify_description(raw), simplify_description(raw));
    }

    #[test]
    fn description_handles_plain_text() {
        assert_eq!(simplify_description("already clean"), "Already clean");
        assert_eq!(simplify_description(""), "");
    }
}
