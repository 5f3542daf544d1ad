pub mod config;
pub mod correct;
pub mod entity;
pub mod error;
pub mod flatfile;
pub mod graph;
pub mod metadata;
pub mod prepare;
pub mod retry;
pub mod sparql;

pub use config::Config;
pub use entity::EntityId;
pub use error::{Result, WikigraphError};
pub use graph::{build_from_cache, Graph, GraphBuilder, Relation, RelationLookup, Triplet};
pub use metadata::{MetadataFetcher, MetadataKind, MetadataLookup, MetadataStore};
pub use prepare::{prepare_captions, PreparedEntity};
pub use retry::{Backoff, RetryPolicy};
pub use sparql::{SparqlClient, WikidataClient};
