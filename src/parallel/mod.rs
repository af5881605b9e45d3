pub mod batch;
pub mod pool;

pub use batch::{batch_ranges, run_scoring_pass};
pub use pool::WorkerPool;
