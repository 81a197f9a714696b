mod aggregate;
mod engine;
mod variants;

pub use aggregate::AggregatedSuggestion;
pub use engine::{
    BulkError, BulkRequest, DEFAULT_BATCH_SIZE, DEFAULT_INTER_BATCH_DELAY, Progress, RunResult,
    run,
};
pub use variants::{Alphabet, QueryVariant};
