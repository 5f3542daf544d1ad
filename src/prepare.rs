//! Repackaging of corrected entities for downstream consumers.
//!
//! Every entity becomes a record keyed by its id whose caption is the English
//! description, or the label when no description exists.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::entity::EntityId;
use crate::error::Result;
use crate::flatfile::write_atomic;
use crate::metadata::MetadataStore;

/// One entry of the prepared entity file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedEntity {
    pub wikidata_id: EntityId,
    pub caption: Option<String>,
    pub entity_id: EntityId,
}

/// Default output path: the entity file name with `_prepared` appended.
pub fn prepared_path(entities: &Path) -> PathBuf {
    let mut name = entities.as_os_str().to_os_string();
    name.push("_prepared");
    PathBuf::from(name)
}

/// Build one record per entity, in entity order.
///
/// Entities with neither a description nor a label keep a `null` caption.
pub fn prepare_captions(
    entity_ids: &[EntityId],
    labels: &MetadataStore,
    descriptions: &MetadataStore,
) -> IndexMap<EntityId, PreparedEntity> {
    let mut prepared = IndexMap::with_capacity(entity_ids.len());

    for id in entity_ids {
        let caption = descriptions
            .value(id.as_str())
            .or_else(|| labels.value(id.as_str()))
            .map(str::to_string);
        if caption.is_none() {
            log::warn!("Entity {} has neither a description nor a label", id);
        }

        prepared.insert(
            id.clone(),
            PreparedEntity {
                wikidata_id: id.clone(),
                caption,
                entity_id: id.clone(),
            },
        );
    }

    prepared
}

pub fn dump_prepared(path: &Path, prepared: &IndexMap<EntityId, PreparedEntity>) -> Result<()> {
    let json = serde_json::to_string_pretty(prepared)?;
    write_atomic(path, &json)
}

pub fn load_prepared(path: &Path) -> Result<IndexMap<EntityId, PreparedEntity>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
