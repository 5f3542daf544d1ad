//! Graph construction from an entity set.

use indexmap::IndexSet;
use std::time::Instant;

use super::{pair_batches, pair_count, RelationLookup, Triplet};
use crate::entity::EntityId;
use crate::error::{Result, WikigraphError};
use crate::retry::RetryPolicy;

/// Default number of pairs per lookup request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Snapshot handed to progress callbacks after each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    pub batches_done: usize,
    pub batches_total: usize,
    pub pairs_done: usize,
    pub pairs_total: usize,
    pub triplets_found: usize,
}

/// Keep the cached triplets whose head and tail are both in `entities`,
/// in cached order. Never touches the network.
pub fn build_from_cache(entities: &IndexSet<EntityId>, cached: &[Triplet]) -> Vec<Triplet> {
    cached.iter().filter(|t| t.within(entities)).cloned().collect()
}

/// Builds a graph over a set of entities.
///
/// Batches are queried strictly one after another in pair-generation order,
/// so the output order only depends on the entity order and the lookup.
pub struct GraphBuilder<L> {
    lookup: L,
    retry: RetryPolicy,
    batch_size: usize,
}

impl<L: RelationLookup> GraphBuilder<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Ask the lookup about every ordered pair of distinct entities.
    pub async fn build_by_query(&self, entities: &IndexSet<EntityId>) -> Result<Vec<Triplet>> {
        self.build_by_query_with_progress(entities, |_| {}).await
    }

    /// [`build_by_query`](Self::build_by_query) reporting after every batch.
    ///
    /// Throttled batches are retried according to the retry policy; any
    /// other error aborts the whole build and nothing is returned.
    pub async fn build_by_query_with_progress<F>(
        &self,
        entities: &IndexSet<EntityId>,
        mut on_progress: F,
    ) -> Result<Vec<Triplet>>
    where
        F: FnMut(BuildProgress),
    {
        if self.batch_size == 0 {
            return Err(WikigraphError::InvalidInput(
                "batch size must be greater than 0".to_string(),
            ));
        }

        let entities: Vec<EntityId> = entities.iter().cloned().collect();
        let pairs_total = pair_count(entities.len());
        let batches_total = pairs_total.div_ceil(self.batch_size);
        let start = Instant::now();

        log::info!(
            "Searching for relations among {} entities ({} pairs, {} batches of up to {})",
            entities.len(),
            pairs_total,
            batches_total,
            self.batch_size
        );

        let mut triplets = Vec::new();
        let mut pairs_done = 0;

        for (idx, batch) in pair_batches(&entities, self.batch_size).enumerate() {
            let (lookup, heads, tails) = (&self.lookup, &batch.heads, &batch.tails);
            let relations = self
                .retry
                .run(move || lookup.lookup_relations(heads, tails))
                .await?;

            if relations.len() != batch.len() {
                return Err(WikigraphError::ResponseLengthMismatch {
                    expected: batch.len(),
                    actual: relations.len(),
                });
            }

            for ((head, tail), relation) in batch.pairs().zip(relations) {
                if let Some(relation) = relation {
                    triplets.push(Triplet {
                        head: head.clone(),
                        relation,
                        tail: tail.clone(),
                    });
                }
            }

            pairs_done += batch.len();
            log::info!(
                "Searching for relations in Wikidata ({}/{})",
                pairs_done,
                pairs_total
            );
            on_progress(BuildProgress {
                batches_done: idx + 1,
                batches_total,
                pairs_done,
                pairs_total,
                triplets_found: triplets.len(),
            });
        }

        log::info!(
            "Found {} triplets in {:?}",
            triplets.len(),
            start.elapsed()
        );

        Ok(triplets)
    }
}
