use indexmap::IndexMap;
use std::path::Path;

use crate::entity::EntityId;
use crate::error::Result;
use crate::flatfile;

/// Known metadata values keyed by entity, in insertion order.
///
/// An entry with a `None` value means "asked, nothing found", which is
/// different from an entity that was never asked about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    values: IndexMap<EntityId, Option<String>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: IndexMap<EntityId, Option<String>>) -> Self {
        Self { values }
    }

    /// Load a value file.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_map(flatfile::load_values(path)?))
    }

    /// Load a value file, or start empty when it does not exist yet.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        Self::load(path)
    }

    pub fn dump(&self, path: &Path) -> Result<usize> {
        flatfile::dump_values(path, self.iter())
    }

    /// `None` if the entity was never recorded.
    pub fn get(&self, id: &str) -> Option<Option<&str>> {
        self.values.get(id).map(|v| v.as_deref())
    }

    /// Recorded value, if any.
    pub fn value(&self, id: &str) -> Option<&str> {
        self.values.get(id).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn insert(&mut self, id: EntityId, value: Option<String>) -> Option<Option<String>> {
        self.values.insert(id, value)
    }

    /// Record a batch of results. Existing entries are overwritten in place.
    pub fn put_batch<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (EntityId, Option<String>)>,
    {
        self.values.extend(entries);
    }

    /// Entities from `entities` that have no entry yet, in the given order.
    pub fn missing<'a, I>(&self, entities: I) -> Vec<EntityId>
    where
        I: IntoIterator<Item = &'a EntityId>,
    {
        entities
            .into_iter()
            .filter(|e| !self.values.contains_key(*e))
            .cloned()
            .collect()
    }

    pub fn remove(&mut self, id: &str) -> Option<Option<String>> {
        self.values.shift_remove(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k, v.as_deref()))
    }

    pub fn as_map(&self) -> &IndexMap<EntityId, Option<String>> {
        &self.values
    }

    pub fn into_map(self) -> IndexMap<EntityId, Option<String>> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_distinguishes_unknown_and_missing() {
        let mut store = MetadataStore::new();
        store.put_batch(vec![
            (EntityId::from("Q1"), Some("Paris".to_string())),
            (EntityId::from("Q2"), None),
        ]);
        assert_eq!(store.get("Q1"), Some(Some("Paris")));
        assert_eq!(store.get("Q2"), Some(None));
        assert_eq!(store.get("Q3"), None);
        assert_eq!(store.value("Q2"), None);
    }

    #[test]
    fn test_missing_preserves_order() {
        let mut store = MetadataStore::new();
        store.insert(EntityId::from("Q2"), None);
        let wanted: Vec<EntityId> = ["Q3", "Q2", "Q1"].into_iter().map(EntityId::from).collect();
        let missing: Vec<String> = store.missing(&wanted).into_iter().map(EntityId::into_string).collect();
        assert_eq!(missing, vec!["Q3", "Q1"]);
    }

    #[test]
    fn test_load_or_empty_and_dump() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.txt");
        assert!(MetadataStore::load_or_empty(&path).unwrap().is_empty());

        let mut store = MetadataStore::new();
        store.put_batch(vec![
            (EntityId::from("Q90"), Some("Paris".to_string())),
            (EntityId::from("Q0"), None),
        ]);
        store.dump(&path).unwrap();

        let reloaded = MetadataStore::load_or_empty(&path).unwrap();
        assert_eq!(reloaded, store);
    }
}
