//! Entity metadata: labels, descriptions and redirections.
//!
//! Values are fetched in batches through a [`MetadataLookup`] and collected
//! in a [`MetadataStore`], which doubles as the resume point for
//! interrupted runs.

mod fetcher;
mod store;

pub use fetcher::MetadataFetcher;
pub use store::MetadataStore;

use async_trait::async_trait;
use std::fmt;

use crate::entity::EntityId;
use crate::error::Result;

/// Which piece of metadata to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// English `rdfs:label`
    Label,
    /// English `schema:description`
    Description,
    /// `owl:sameAs` target of a merged entity
    Redirection,
}

impl MetadataKind {
    /// File name used for this kind's value file.
    pub fn file_name(&self) -> &'static str {
        match self {
            MetadataKind::Label => "labels.txt",
            MetadataKind::Description => "descriptions.txt",
            MetadataKind::Redirection => "redirections.txt",
        }
    }

    /// Whether a fetched value should be treated as absent and chased
    /// through a redirection. Descriptions of disambiguation or category
    /// pages ("Wikimedia ...") count as absent.
    pub fn needs_fallback(&self, value: Option<&str>) -> bool {
        match self {
            MetadataKind::Redirection => false,
            MetadataKind::Label => value.is_none(),
            MetadataKind::Description => value.map_or(true, |v| v.contains("Wikimedia")),
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataKind::Label => "labels",
            MetadataKind::Description => "descriptions",
            MetadataKind::Redirection => "redirections",
        };
        f.write_str(name)
    }
}

/// Source of per-entity metadata values.
///
/// Returns one entry per entity, in order. Rate limiting must surface as
/// [`WikigraphError::Throttled`](crate::WikigraphError::Throttled).
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup_values(
        &self,
        kind: MetadataKind,
        entities: &[EntityId],
    ) -> Result<Vec<Option<String>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_rules() {
        assert!(MetadataKind::Label.needs_fallback(None));
        assert!(!MetadataKind::Label.needs_fallback(Some("Wikimedia Commons")));
        assert!(MetadataKind::Description.needs_fallback(None));
        assert!(MetadataKind::Description.needs_fallback(Some("Wikimedia disambiguation page")));
        assert!(!MetadataKind::Description.needs_fallback(Some("capital of France")));
        assert!(!MetadataKind::Redirection.needs_fallback(None));
    }
}
