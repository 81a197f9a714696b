use std::collections::HashSet;

use crate::suggest::Source;

use super::variants::QueryVariant;

/// Result of fetching one variant. Failure is total: a failed outcome
/// carries no suggestions.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub variant: QueryVariant,
    pub suggestions: Vec<String>,
    pub failed: bool,
}

impl FetchOutcome {
    pub fn success(variant: QueryVariant, suggestions: Vec<String>) -> Self {
        Self {
            variant,
            suggestions,
            failed: false,
        }
    }

    pub fn failure(variant: QueryVariant) -> Self {
        Self {
            variant,
            suggestions: Vec::new(),
            failed: true,
        }
    }
}

/// A deduplicated suggestion plus the variant that first produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSuggestion {
    pub text: String,
    pub source: Source,
    pub variant: QueryVariant,
}

/// Accumulates suggestions across batches, keeping the first occurrence of
/// each `(text, source)` pair in encounter order.
#[derive(Debug, Default)]
pub struct Aggregator {
    seen: HashSet<(String, Source)>,
    items: Vec<AggregatedSuggestion>,
}

impl Aggregator {
    /// Fold a completed batch into the accumulated set, in outcome order.
    pub fn merge(&mut self, source: Source, outcomes: &[FetchOutcome]) {
        for outcome in outcomes {
            for text in &outcome.suggestions {
                if self.seen.insert((text.clone(), source)) {
                    self.items.push(AggregatedSuggestion {
                        text: text.clone(),
                        source,
                        variant: outcome.variant.clone(),
                    });
                }
            }
        }
    }

    pub fn into_items(self) -> Vec<AggregatedSuggestion> {
        self.items
    }
}
