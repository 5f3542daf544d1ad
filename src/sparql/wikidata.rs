use async_trait::async_trait;

use super::query::{self, RELATION_VAR};
use super::SparqlClient;
use crate::entity::EntityId;
use crate::error::{Result, WikigraphError};
use crate::graph::{Relation, RelationLookup};
use crate::metadata::{MetadataKind, MetadataLookup};

/// Prefix stripped from `owl:sameAs` targets.
pub const ENTITY_URI_PREFIX: &str = "http://www.wikidata.org/entity/";

/// Wikidata-backed relation and metadata lookups over one [`SparqlClient`].
pub struct WikidataClient {
    sparql: SparqlClient,
}

impl WikidataClient {
    pub fn new(sparql: SparqlClient) -> Self {
        Self { sparql }
    }
}

/// Identifiers are spliced into query text, so only `Q`/`P` ids get through.
fn check_ids<'a>(ids: impl IntoIterator<Item = &'a EntityId>) -> Result<()> {
    for id in ids {
        if !id.is_well_formed() {
            return Err(WikigraphError::InvalidInput(format!(
                "not a Wikidata identifier: {:?}",
                id.as_str()
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl RelationLookup for WikidataClient {
    async fn lookup_relations(
        &self,
        heads: &[EntityId],
        tails: &[EntityId],
    ) -> Result<Vec<Option<Relation>>> {
        if heads.len() != tails.len() {
            return Err(WikigraphError::BatchLengthMismatch {
                heads: heads.len(),
                tails: tails.len(),
            });
        }
        if heads.is_empty() {
            return Ok(Vec::new());
        }
        check_ids(heads.iter().chain(tails))?;

        let response = self.sparql.select(&query::relations_query(heads, tails)).await?;

        Ok(response
            .first_values(RELATION_VAR, heads.len())
            .into_iter()
            .map(|value| value.map(Relation::from))
            .collect())
    }
}

#[async_trait]
impl MetadataLookup for WikidataClient {
    async fn lookup_values(
        &self,
        kind: MetadataKind,
        entities: &[EntityId],
    ) -> Result<Vec<Option<String>>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        check_ids(entities)?;

        let response = self.sparql.select(&query::metadata_query(kind, entities)).await?;
        let values = response.first_values(query::metadata_var(kind), entities.len());

        if kind == MetadataKind::Redirection {
            return Ok(values
                .into_iter()
                .map(|v| v.map(|uri| uri.strip_prefix(ENTITY_URI_PREFIX).unwrap_or(&uri).to_string()))
                .collect());
        }

        Ok(values)
    }
}
