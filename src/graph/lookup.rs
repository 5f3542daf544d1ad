use async_trait::async_trait;

use super::Relation;
use crate::entity::EntityId;
use crate::error::Result;

/// Source of relations between entity pairs.
///
/// Given equal-length `heads` and `tails`, returns one entry per pair, in
/// the same order: the relation found between `heads[i]` and `tails[i]`, or
/// `None`. Rate limiting must surface as
/// [`WikigraphError::Throttled`](crate::WikigraphError::Throttled) so callers
/// can retry; anything else is treated as fatal.
#[async_trait]
pub trait RelationLookup: Send + Sync {
    async fn lookup_relations(
        &self,
        heads: &[EntityId],
        tails: &[EntityId],
    ) -> Result<Vec<Option<Relation>>>;
}
