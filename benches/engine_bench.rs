//! Engine throughput benchmarks: crew scored per second and combo sweeps.
//!
//! Run with: `cargo bench`
//! Results show mean time per pass and throughput (crew/s, sweeps/s).

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use cryodex::data::collection::{Milestone, MilestoneGoal};
use cryodex::engine::combo::{discover_combos, ComboOptions, MatchMode};
use cryodex::engine::filter::CrewFilter;
use cryodex::engine::score::{score_crew_pool, StarScore};
use cryodex::engine::state::{CrewRecord, PlayerCollectionState};

const COLLECTION_COUNT: u32 = 24;
const MEMBERSHIPS_PER_CREW: u32 = 3;

fn synthetic_states() -> Vec<PlayerCollectionState> {
    (1..=COLLECTION_COUNT)
        .map(|id| {
            let goal = 2 + id % 7;
            let needed = 1 + id % goal;
            PlayerCollectionState {
                id,
                name: format!("collection-{id}"),
                progress: MilestoneGoal::Goal(goal - needed),
                milestone: Milestone {
                    goal: MilestoneGoal::Goal(goal),
                    rewards: vec![],
                    buffs: vec![],
                },
                owned: goal - needed,
                needed,
                progress_pct: 0.0,
                needed_pct: 0.0,
                total_rewards: 0,
                needed_stars: None,
                needed_cost: None,
                description: String::new(),
            }
        })
        .collect()
}

fn synthetic_pool(size: usize) -> Vec<CrewRecord> {
    (0..size)
        .map(|index| {
            let seed = index as u32;
            let max_rarity = 1 + (seed % 5) as u8;
            let rarity = (seed % u32::from(max_rarity)) as u8;
            let memberships: Vec<u32> = (0..MEMBERSHIPS_PER_CREW)
                .map(|step| 1 + (seed * 7 + step * 11) % COLLECTION_COUNT)
                .collect();
            CrewRecord {
                symbol: format!("crew_{index}"),
                name: format!("Crew {index}"),
                rarity,
                max_rarity,
                favorite: seed % 13 == 0,
                retrievable: seed % 3 != 0,
                highest_owned_rarity: rarity,
                highest_owned_level: 1,
                collection_ids: memberships.clone(),
                unmaxed_ids: memberships,
                immortal_rewards: vec![],
                collection_score: 0,
                star_score: StarScore::default(),
            }
        })
        .collect()
}

fn bench_scoring(c: &mut Criterion) {
    let states = synthetic_states();

    let mut group = c.benchmark_group("scoring");
    group.sample_size(100);

    for size in [100usize, 1_000, 5_000] {
        let pool = synthetic_pool(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(format!("pool_{size}"), &size, |b, _| {
            b.iter_batched(
                || pool.clone(),
                |mut crew| {
                    black_box(score_crew_pool(
                        &mut crew,
                        &states,
                        &CrewFilter::default(),
                        false,
                    ))
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_combo_discovery(c: &mut Criterion) {
    let states = synthetic_states();
    let crew = synthetic_pool(1_000);

    let mut group = c.benchmark_group("combos");
    group.sample_size(60);
    group.throughput(Throughput::Elements(1));

    group.bench_function("normal", |b| {
        b.iter(|| {
            black_box(discover_combos(
                black_box(1),
                &states,
                &crew,
                &ComboOptions::default(),
            ))
        });
    });

    let extended = ComboOptions {
        match_mode: MatchMode::Extended,
        ..ComboOptions::default()
    };
    group.bench_function("extended", |b| {
        b.iter(|| black_box(discover_combos(black_box(1), &states, &crew, &extended)));
    });

    group.finish();
}

criterion_group!(benches, bench_scoring, bench_combo_discovery);
criterion_main!(benches);
