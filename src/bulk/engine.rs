use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::suggest::{Source, SuggestionSource};

use super::aggregate::{AggregatedSuggestion, Aggregator, FetchOutcome};
use super::variants::{Alphabet, QueryVariant};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("batch size must be at least 1")]
    InvalidBatchSize,
}

/// Parameters for one bulk run.
#[derive(Debug, Clone)]
pub struct BulkRequest<'a> {
    pub query: &'a str,
    pub source: Source,
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    pub alphabet: Alphabet,
}

impl<'a> BulkRequest<'a> {
    pub fn new(query: &'a str, source: Source) -> Self {
        Self {
            query,
            source,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            alphabet: Alphabet::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug)]
pub struct RunResult {
    pub suggestions: Vec<AggregatedSuggestion>,
    pub progress: Progress,
}

/// Expand the base query and fetch suggestions for every variant in
/// sequential batches, merging as batches complete.
///
/// Within a batch the fetches run concurrently; batches never overlap, and
/// `inter_batch_delay` is slept between consecutive batches (never after the
/// last). `on_progress` fires once per completed batch. `cancelled` is
/// polled between batches only; a cancelled run returns the partial result
/// accumulated so far.
pub async fn run(
    client: &impl SuggestionSource,
    request: &BulkRequest<'_>,
    mut on_progress: impl FnMut(Progress),
    cancelled: impl Fn() -> bool,
) -> Result<RunResult, BulkError> {
    if request.query.trim().is_empty() {
        return Err(BulkError::EmptyQuery);
    }
    if request.batch_size == 0 {
        return Err(BulkError::InvalidBatchSize);
    }

    let variants = request.alphabet.expand(request.query);
    let total = variants.len();
    let mut aggregator = Aggregator::default();
    let mut progress = Progress { completed: 0, total };
    let mut failed_variants = 0;

    for (index, batch) in variants.chunks(request.batch_size).enumerate() {
        if index > 0 {
            sleep(request.inter_batch_delay).await;
            if cancelled() {
                debug!(
                    completed = progress.completed,
                    total, "bulk run cancelled between batches"
                );
                break;
            }
        }

        let outcomes = join_all(
            batch
                .iter()
                .map(|variant| fetch_outcome(client, request.source, variant)),
        )
        .await;

        failed_variants += outcomes.iter().filter(|o| o.failed).count();
        aggregator.merge(request.source, &outcomes);

        progress.completed += outcomes.len();
        on_progress(progress);
    }

    let suggestions = aggregator.into_items();
    debug!(
        unique = suggestions.len(),
        failed_variants,
        completed = progress.completed,
        total,
        "bulk run finished"
    );
    Ok(RunResult {
        suggestions,
        progress,
    })
}

async fn fetch_outcome(
    client: &impl SuggestionSource,
    source: Source,
    variant: &QueryVariant,
) -> FetchOutcome {
    match client.suggestions(source, &variant.text()).await {
        Ok(suggestions) => FetchOutcome::success(variant.clone(), suggestions),
        Err(e) => {
            warn!(variant = %variant.text(), error = %e, "variant fetch failed");
            FetchOutcome::failure(variant.clone())
        }
    }
}
