//! Citation cost model: what it costs, in honor-hall currency, to raise crew
//! from their current rarity to their ceiling. Pure functions, no I/O.

use serde::Serialize;

/// Citation cost per star, indexed by the crew's maximum rarity tier.
/// No citation item exists below rarity 2, so tiers 0 and 1 cost nothing.
pub const CITATION_COST: [u32; 6] = [0, 0, 500, 4_500, 18_000, 50_000];

/// During a citation sale the top tier drops; the lower tiers never change.
pub const CITATION_COST_SALE: [u32; 6] = [0, 0, 500, 4_500, 18_000, 40_000];

pub const RARITY_TIERS: usize = 6;

/// Active cost schedule for the given pricing mode.
pub fn citation_table(sale: bool) -> &'static [u32; RARITY_TIERS] {
    if sale {
        &CITATION_COST_SALE
    } else {
        &CITATION_COST
    }
}

/// Cost to raise one crew member from `rarity` to `max_rarity`. The per-star
/// price is keyed by the crew's maximum tier, not by each tier crossed; the
/// game prices the whole climb at the ceiling's rate.
pub fn citation_cost(rarity: u8, max_rarity: u8, table: &[u32; RARITY_TIERS]) -> u32 {
    let gap = max_rarity.saturating_sub(rarity) as u32;
    let tier = (max_rarity as usize).min(RARITY_TIERS - 1);
    gap * table[tier]
}

/// A crew subset's citation demand, bucketed by maximum rarity tier. Crew
/// already at their ceiling contribute nothing.
pub fn needed_star_vector<I>(crew: I, limit: Option<usize>) -> [u32; RARITY_TIERS]
where
    I: IntoIterator<Item = (u8, u8)>,
{
    let mut vector = [0u32; RARITY_TIERS];
    for (rarity, max_rarity) in bounded(crew, limit) {
        let tier = (max_rarity as usize).min(RARITY_TIERS - 1);
        vector[tier] += max_rarity.saturating_sub(rarity) as u32;
    }
    vector
}

/// Total currency cost to fuse every crew in the (optionally limited) list to
/// its ceiling, under the sale-aware schedule.
pub fn star_cost<I>(crew: I, limit: Option<usize>, sale: bool) -> u32
where
    I: IntoIterator<Item = (u8, u8)>,
{
    let table = citation_table(sale);
    bounded(crew, limit)
        .map(|(rarity, max_rarity)| citation_cost(rarity, max_rarity, table))
        .sum()
}

fn bounded<I>(crew: I, limit: Option<usize>) -> impl Iterator<Item = (u8, u8)>
where
    I: IntoIterator<Item = (u8, u8)>,
{
    crew.into_iter().take(limit.unwrap_or(usize::MAX))
}

/// One rarity tier's slot in the player's citation inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CitationSlot {
    pub rarity: u8,
    pub quantity: u32,
    pub cost: u32,
}

/// Build the 6-slot citation inventory from owned quantities per tier.
pub fn citation_inventory(owned: &[u32; RARITY_TIERS], sale: bool) -> [CitationSlot; RARITY_TIERS] {
    let table = citation_table(sale);
    let mut slots = [CitationSlot {
        rarity: 0,
        quantity: 0,
        cost: 0,
    }; RARITY_TIERS];
    for (tier, slot) in slots.iter_mut().enumerate() {
        *slot = CitationSlot {
            rarity: tier as u8,
            quantity: owned[tier],
            cost: table[tier],
        };
    }
    slots
}
