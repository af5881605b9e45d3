//! Batch distribution for parallel engine passes.
//!
//! Splits work into batches for progress reporting. The scoring pass fans out
//! one crew record per parallel task; this module provides the batch
//! boundaries the progress-reporting surfaces slice the pool with.

use crate::engine::filter::CrewFilter;
use crate::engine::score::{score_crew_pool, ScoreSummary};
use crate::engine::state::{CrewRecord, PlayerCollectionState};
use crate::parallel::pool::WorkerPool;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use cryodex::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Run one scoring pass on this worker pool. Convenience wrapper that calls
/// [crate::engine::score::score_crew_pool] inside
/// [crate::parallel::pool::WorkerPool::install] when a custom worker count is
/// set.
pub fn run_scoring_pass(
    crew: &mut [CrewRecord],
    states: &[PlayerCollectionState],
    filter: &CrewFilter,
    sale: bool,
    pool: &WorkerPool,
) -> ScoreSummary {
    pool.install(|| score_crew_pool(crew, states, filter, sale))
}
