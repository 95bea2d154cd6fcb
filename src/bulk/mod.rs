mod dispatcher;
mod executor;
mod planner;
mod reconciler;
mod types;

pub use dispatcher::dispatch;
pub use executor::{
    BATCH_READ_SIZE, BATCH_WRITE_SIZE, BulkExecutor, BulkExecutorBuilder, TRANSACT_WRITE_SIZE,
};
pub use planner::plan_chunks;
pub use reconciler::{BestEffortMerge, merge_best_effort, merge_transactional};
pub use types::{
    BulkReadOutput, BulkWriteOutput, Chunk, ChunkOutcome, ChunkResponse, Item, Key,
};
