//! Batched metadata fetching with resume and periodic checkpoints.

use std::path::Path;

use super::{MetadataKind, MetadataLookup, MetadataStore};
use crate::entity::EntityId;
use crate::error::{Result, WikigraphError};
use crate::retry::RetryPolicy;

/// Fetches labels, descriptions or redirections for entities not yet in a store.
pub struct MetadataFetcher<M> {
    lookup: M,
    retry: RetryPolicy,
    batch_size: usize,
    checkpoint_every: usize,
}

impl<M: MetadataLookup> MetadataFetcher<M> {
    pub fn new(lookup: M) -> Self {
        Self {
            lookup,
            retry: RetryPolicy::default(),
            batch_size: 20,
            checkpoint_every: 10,
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

    /// Dump the store every `batches` batches; 0 disables checkpoints.
    pub fn with_checkpoint_every(mut self, batches: usize) -> Self {
        self.checkpoint_every = batches;
        self
    }

    pub fn lookup(&self) -> &M {
        &self.lookup
    }

    async fn query(&self, kind: MetadataKind, entities: &[EntityId]) -> Result<Vec<Option<String>>> {
        let lookup = &self.lookup;
        let values = self
            .retry
            .run(move || lookup.lookup_values(kind, entities))
            .await?;

        if values.len() != entities.len() {
            return Err(WikigraphError::ResponseLengthMismatch {
                expected: entities.len(),
                actual: values.len(),
            });
        }
        Ok(values)
    }

    /// Fill `store` with `kind` values for every entity it does not know yet.
    ///
    /// Entities already present are skipped, new entries are appended in
    /// `entities` order. When `checkpoint` is given the store is written
    /// there every `checkpoint_every` batches. Returns the number of entities
    /// fetched.
    pub async fn fetch(
        &self,
        kind: MetadataKind,
        entities: &[EntityId],
        store: &mut MetadataStore,
        checkpoint: Option<&Path>,
    ) -> Result<usize> {
        if self.batch_size == 0 {
            return Err(WikigraphError::InvalidInput(
                "batch size must be greater than 0".to_string(),
            ));
        }

        let missing = store.missing(entities);
        let known = entities.len() - missing.len();
        log::info!(
            "Collecting {}: {} known, {} to fetch",
            kind,
            known,
            missing.len()
        );

        for (idx, batch) in missing.chunks(self.batch_size).enumerate() {
            let mut values = self.query(kind, batch).await?;

            if kind != MetadataKind::Redirection {
                self.resolve_through_redirections(kind, batch, &mut values).await?;
            }

            store.put_batch(batch.iter().cloned().zip(values));

            let done = known + (idx * self.batch_size + batch.len());
            log::info!("Collecting {} ({}/{})", kind, done, entities.len());

            if let Some(path) = checkpoint {
                if self.checkpoint_every > 0 && (idx + 1) % self.checkpoint_every == 0 {
                    store.dump(path)?;
                    log::debug!("Checkpointed {} {} to {}", store.len(), kind, path.display());
                }
            }
        }

        Ok(missing.len())
    }

    /// Re-query values that came back absent under the entity's canonical id.
    ///
    /// One level only: the canonical id is not itself chased further.
    async fn resolve_through_redirections(
        &self,
        kind: MetadataKind,
        batch: &[EntityId],
        values: &mut [Option<String>],
    ) -> Result<()> {
        let absent: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| kind.needs_fallback(v.as_deref()))
            .map(|(i, _)| i)
            .collect();
        if absent.is_empty() {
            return Ok(());
        }

        let absent_ids: Vec<EntityId> = absent.iter().map(|&i| batch[i].clone()).collect();
        let targets = self.query(MetadataKind::Redirection, &absent_ids).await?;

        let (positions, canonical): (Vec<usize>, Vec<EntityId>) = absent
            .into_iter()
            .zip(targets)
            .filter_map(|(i, target)| {
                let target = EntityId::from(target?);
                (target != batch[i] && target.is_well_formed()).then_some((i, target))
            })
            .unzip();
        if canonical.is_empty() {
            return Ok(());
        }

        log::debug!("Following {} redirections for {}", canonical.len(), kind);
        let redirected = self.query(kind, &canonical).await?;
        for (i, value) in positions.into_iter().zip(redirected) {
            if value.is_some() {
                values[i] = value;
            }
        }

        Ok(())
    }
}
