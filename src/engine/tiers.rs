//! Tier merge: collapse a claimable run of milestone tiers into one synthetic
//! super-milestone view. The per-tier data underneath is never altered.

use std::collections::BTreeMap;

use crate::data::collection::{Milestone, Reward};
use crate::engine::state::PlayerCollectionState;

/// Merge two reward lists by numeric id. The first occurrence of an id is
/// copied verbatim; later occurrences only add quantity. Output is id-ordered.
pub fn merge_quantities(existing: &[Reward], incoming: &[Reward]) -> Vec<Reward> {
    let mut merged: BTreeMap<u32, Reward> = BTreeMap::new();
    for reward in existing.iter().chain(incoming.iter()) {
        match merged.get_mut(&reward.id) {
            Some(entry) => entry.quantity += reward.quantity,
            None => {
                merged.insert(reward.id, reward.clone());
            }
        }
    }
    merged.into_values().collect()
}

/// Build a display copy of `state` whose milestone spans tiers
/// `[start, end]` (inclusive) of the collection's milestone list.
///
/// Rewards and buffs accumulate across the range via `merge_quantities`. The
/// merged goal is the last visited tier's goal, not a sum; tier goals are
/// already cumulative in game data. Out-of-range bounds clamp to the list and
/// an empty range returns the state unchanged.
pub fn merge_tier_range(
    state: &PlayerCollectionState,
    milestones: &[Milestone],
    start: usize,
    end: usize,
) -> PlayerCollectionState {
    let mut merged = state.clone();
    merged.needed_stars = None;
    merged.needed_cost = None;

    if milestones.is_empty() || start >= milestones.len() || start > end {
        return merged;
    }
    let end = end.min(milestones.len() - 1);

    let mut rewards: Vec<Reward> = Vec::new();
    let mut buffs: Vec<Reward> = Vec::new();
    let mut goal = merged.milestone.goal;
    for milestone in &milestones[start..=end] {
        rewards = merge_quantities(&rewards, &milestone.rewards);
        buffs = merge_quantities(&buffs, &milestone.buffs);
        goal = milestone.goal;
    }

    merged.milestone = Milestone {
        goal,
        rewards,
        buffs,
    };
    merged.recompute_progress();
    merged
}
