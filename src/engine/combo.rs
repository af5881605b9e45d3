//! Combo discovery: which other unfinished collections can be advanced
//! together with a focal collection, and the crew subset that closes them all
//! the cheapest. Pure over its inputs; each invocation builds its own memo
//! table and never mutates the canonical states.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::engine::cost::{
    citation_cost, citation_table, needed_star_vector, star_cost, RARITY_TIERS,
};
use crate::engine::filter::CrewFilter;
use crate::engine::state::{CrewRecord, PlayerCollectionState};

/// How strictly a partner collection must overlap the focal candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Partners must share crew with the filtered focal candidates; every
    /// feasible variation is reported.
    Normal,
    /// Normal overlap, but only variations that exactly consume the focal
    /// collection's remaining need.
    ExactOnly,
    /// Normal overlap, exact variations dropped.
    InexactOnly,
    /// Overlap is tested against every unmaxed focal member, ignoring the
    /// view filters; finds partners a narrow search would hide.
    Extended,
}

impl Default for MatchMode {
    fn default() -> Self {
        MatchMode::Normal
    }
}

impl MatchMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "normal" => Some(Self::Normal),
            "exact-only" | "exact" => Some(Self::ExactOnly),
            "inexact-only" | "inexact" => Some(Self::InexactOnly),
            "extended" => Some(Self::Extended),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::ExactOnly => "exact-only",
            Self::InexactOnly => "inexact-only",
            Self::Extended => "extended",
        }
    }
}

/// Enumeration bounds. Subset counts grow combinatorially, so the partner
/// pool and variation output are capped; partners are ranked by overlap size
/// before truncation so the cap drops the least-connected ones.
#[derive(Debug, Clone)]
pub struct ComboStrategy {
    pub max_partners: usize,
    pub partner_pool_limit: usize,
    pub max_variations: usize,
}

impl Default for ComboStrategy {
    fn default() -> Self {
        Self {
            max_partners: 4,
            partner_pool_limit: 12,
            max_variations: 24,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComboOptions {
    pub filter: CrewFilter,
    pub sale: bool,
    pub favor_favorites: bool,
    pub match_mode: MatchMode,
    pub strategy: ComboStrategy,
}

impl Default for ComboOptions {
    fn default() -> Self {
        Self {
            filter: CrewFilter::default(),
            sale: false,
            favor_favorites: true,
            match_mode: MatchMode::default(),
            strategy: ComboStrategy::default(),
        }
    }
}

/// One crew pick inside a combo group, with its own citation price tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboCrew {
    pub symbol: String,
    pub name: String,
    pub rarity: u8,
    pub max_rarity: u8,
    pub favorite: bool,
    pub citation_cost: u32,
}

/// A named combo: the focal collection plus zero or more partners, the crew
/// selected to close them, and the projected citation bill.
#[derive(Debug, Clone, Serialize)]
pub struct ComboGroup {
    pub name: String,
    /// Focal collection first, then partners in ranked order.
    pub collection_ids: Vec<u32>,
    pub crew: Vec<ComboCrew>,
    pub needed_stars: [u32; RARITY_TIERS],
    pub needed_cost: u32,
    /// The selection is exactly the focal collection's remaining need.
    pub exact: bool,
    /// Every collection in the group reaches its goal with this selection.
    pub satisfied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComboReport {
    /// Display copy of the focal state carrying the focal-only cost
    /// projection; the canonical state is never touched.
    pub focal: PlayerCollectionState,
    /// Focal-only group first, then partner variations by descending
    /// collection count.
    pub groups: Vec<ComboGroup>,
}

struct Partner {
    id: u32,
    name: String,
    needed: u32,
    members: Vec<usize>,
    overlap: usize,
}

#[derive(Clone)]
struct Selection {
    crew: Vec<usize>,
    satisfied: bool,
}

/// Discover combos for the collection with id `focal_id`. Returns `None`
/// when no such collection exists in the given states.
pub fn discover_combos(
    focal_id: u32,
    states: &[PlayerCollectionState],
    crew: &[CrewRecord],
    options: &ComboOptions,
) -> Option<ComboReport> {
    let focal = states.iter().find(|state| state.id == focal_id)?;
    let table = citation_table(options.sale);

    // Focal candidates: unmaxed members passing every view filter, search
    // included.
    let candidates: Vec<usize> = crew
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            record.unmaxed_ids.contains(&focal_id)
                && !record.at_max_rarity()
                && options.filter.matches_with_search(record)
        })
        .map(|(index, _)| index)
        .collect();

    let overlap_symbols: HashSet<&str> = match options.match_mode {
        MatchMode::Extended => crew
            .iter()
            .filter(|record| record.unmaxed_ids.contains(&focal_id) && !record.at_max_rarity())
            .map(|record| record.symbol.as_str())
            .collect(),
        _ => candidates
            .iter()
            .map(|&index| crew[index].symbol.as_str())
            .collect(),
    };

    let mut partners: Vec<Partner> = Vec::new();
    if focal.needed > 0 && focal.advancing() {
        for state in states {
            if state.id == focal_id || !state.advancing() || state.needed == 0 {
                continue;
            }
            let members: Vec<usize> = crew
                .iter()
                .enumerate()
                .filter(|(_, record)| {
                    record.unmaxed_ids.contains(&state.id)
                        && !record.at_max_rarity()
                        && options.filter.matches(record)
                })
                .map(|(index, _)| index)
                .collect();
            let overlap = members
                .iter()
                .filter(|&&index| overlap_symbols.contains(crew[index].symbol.as_str()))
                .count();
            if overlap > 0 {
                partners.push(Partner {
                    id: state.id,
                    name: state.name.clone(),
                    needed: state.needed,
                    members,
                    overlap,
                });
            }
        }
    }
    partners.sort_by(|a, b| b.overlap.cmp(&a.overlap).then_with(|| a.id.cmp(&b.id)));
    partners.truncate(options.strategy.partner_pool_limit);

    // Focal-only selection doubles as the report's headline cost projection.
    let focal_needs: BTreeMap<u32, u32> = [(focal_id, focal.needed)].into_iter().collect();
    let focal_selection = select_combo_crew(crew, &candidates, &focal_needs, options, table);

    let mut cost_map: HashMap<Vec<u32>, Selection> = HashMap::new();
    let mut variations: Vec<(Vec<usize>, Selection, bool)> = Vec::new();
    let size_cap = options.strategy.max_partners.min(partners.len());
    'sizes: for size in (1..=size_cap).rev() {
        for subset in combinations(partners.len(), size) {
            let key: Vec<u32> = subset.iter().map(|&p| partners[p].id).collect();
            let selection = cost_map.entry(key).or_insert_with(|| {
                let mut pool: BTreeSet<usize> = candidates.iter().copied().collect();
                let mut needs = focal_needs.clone();
                for &p in &subset {
                    pool.extend(partners[p].members.iter().copied());
                    needs.insert(partners[p].id, partners[p].needed);
                }
                let pool: Vec<usize> = pool.into_iter().collect();
                select_combo_crew(crew, &pool, &needs, options, table)
            });
            if !selection.satisfied {
                continue;
            }
            let exact = selection_is_exact(crew, selection, focal_id, focal.needed);
            match options.match_mode {
                MatchMode::ExactOnly if !exact => continue,
                MatchMode::InexactOnly if exact => continue,
                _ => {}
            }
            variations.push((subset, selection.clone(), exact));
            if variations.len() >= options.strategy.max_variations {
                break 'sizes;
            }
        }
    }

    let mut focal_view = focal.clone();
    focal_view.needed_stars = Some(needed_star_vector(
        selection_pairs(crew, &focal_selection.crew),
        None,
    ));
    focal_view.needed_cost = Some(star_cost(
        selection_pairs(crew, &focal_selection.crew),
        None,
        options.sale,
    ));

    let mut groups = Vec::with_capacity(variations.len() + 1);
    let focal_exact = selection_is_exact(crew, &focal_selection, focal_id, focal.needed);
    groups.push(build_group(
        focal.name.clone(),
        vec![focal_id],
        crew,
        &focal_selection,
        focal_exact,
        options.sale,
        table,
    ));
    for (subset, selection, exact) in &variations {
        let name = subset
            .iter()
            .map(|&p| partners[p].name.as_str())
            .collect::<Vec<_>>()
            .join(" + ");
        let mut ids = vec![focal_id];
        ids.extend(subset.iter().map(|&p| partners[p].id));
        groups.push(build_group(
            name,
            ids,
            crew,
            selection,
            *exact,
            options.sale,
            table,
        ));
    }

    Some(ComboReport {
        focal: focal_view,
        groups,
    })
}

/// Greedy crew pick over one pool. Sort order: search matches, favorites
/// (when favored), coverage of still-needed collections, ascending citation
/// cost, then symbol so full ties stay reproducible. The walk stops at the
/// first prefix satisfying every need; an insufficient pool returns whole.
fn select_combo_crew(
    crew: &[CrewRecord],
    pool: &[usize],
    needs: &BTreeMap<u32, u32>,
    options: &ComboOptions,
    table: &[u32; RARITY_TIERS],
) -> Selection {
    struct PoolEntry<'a> {
        index: usize,
        search: bool,
        favorite: bool,
        coverage: usize,
        cost: u32,
        symbol: &'a str,
    }

    let mut entries: Vec<PoolEntry<'_>> = pool
        .iter()
        .map(|&index| {
            let record = &crew[index];
            PoolEntry {
                index,
                search: options.filter.has_search() && options.filter.search_matches(record),
                favorite: options.favor_favorites && record.favorite,
                coverage: record
                    .unmaxed_ids
                    .iter()
                    .filter(|id| needs.contains_key(id))
                    .count(),
                cost: citation_cost(record.fusion_rarity(), record.max_rarity, table),
                symbol: record.symbol.as_str(),
            }
        })
        .collect();
    entries.sort_by(|a, b| {
        b.search
            .cmp(&a.search)
            .then_with(|| b.favorite.cmp(&a.favorite))
            .then_with(|| b.coverage.cmp(&a.coverage))
            .then_with(|| a.cost.cmp(&b.cost))
            .then_with(|| a.symbol.cmp(b.symbol))
    });

    let mut satisfied: BTreeMap<u32, u32> = needs.keys().map(|&id| (id, 0)).collect();
    let done =
        |satisfied: &BTreeMap<u32, u32>| needs.iter().all(|(id, need)| satisfied[id] >= *need);

    let mut picked: Vec<usize> = Vec::new();
    if done(&satisfied) {
        return Selection {
            crew: picked,
            satisfied: true,
        };
    }
    for entry in &entries {
        picked.push(entry.index);
        for id in &crew[entry.index].unmaxed_ids {
            if let Some(count) = satisfied.get_mut(id) {
                *count += 1;
            }
        }
        if done(&satisfied) {
            return Selection {
                crew: picked,
                satisfied: true,
            };
        }
    }
    Selection {
        crew: picked,
        satisfied: false,
    }
}

fn selection_is_exact(
    crew: &[CrewRecord],
    selection: &Selection,
    focal_id: u32,
    focal_needed: u32,
) -> bool {
    focal_needed > 0
        && selection.satisfied
        && selection.crew.len() as u32 == focal_needed
        && selection
            .crew
            .iter()
            .all(|&index| crew[index].unmaxed_ids.contains(&focal_id))
}

fn selection_pairs(crew: &[CrewRecord], picked: &[usize]) -> Vec<(u8, u8)> {
    picked
        .iter()
        .map(|&index| (crew[index].fusion_rarity(), crew[index].max_rarity))
        .collect()
}

fn build_group(
    name: String,
    collection_ids: Vec<u32>,
    crew: &[CrewRecord],
    selection: &Selection,
    exact: bool,
    sale: bool,
    table: &[u32; RARITY_TIERS],
) -> ComboGroup {
    let picks: Vec<ComboCrew> = selection
        .crew
        .iter()
        .map(|&index| {
            let record = &crew[index];
            ComboCrew {
                symbol: record.symbol.clone(),
                name: record.name.clone(),
                rarity: record.rarity,
                max_rarity: record.max_rarity,
                favorite: record.favorite,
                citation_cost: citation_cost(record.fusion_rarity(), record.max_rarity, table),
            }
        })
        .collect();
    let pairs = selection_pairs(crew, &selection.crew);
    let needed_stars = needed_star_vector(pairs.clone(), None);
    let needed_cost = star_cost(pairs, None, sale);
    ComboGroup {
        name,
        collection_ids,
        crew: picks,
        needed_stars,
        needed_cost,
        exact,
        satisfied: selection.satisfied,
    }
}

/// All `size`-element index subsets of `0..count`, in lexicographic order.
fn combinations(count: usize, size: usize) -> Vec<Vec<usize>> {
    fn walk(count: usize, size: usize, start: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        let remaining = size - current.len();
        for index in start..count {
            if count - index < remaining {
                break;
            }
            current.push(index);
            walk(count, size, index + 1, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    if size > 0 && size <= count {
        walk(count, size, 0, &mut Vec::new(), &mut out);
    }
    out
}
