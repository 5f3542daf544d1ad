//! Redirection correction for entity lists, value files and disambiguation
//! samples.
//!
//! Wikidata merges duplicate items and leaves the old id as a redirect. This
//! module rewrites everything keyed by entity id onto canonical ids and
//! drops entities that no longer exist.

use indexmap::{IndexMap, IndexSet};
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::entity::EntityId;
use crate::error::{Result, WikigraphError};
use crate::metadata::MetadataStore;

/// Old id → canonical id.
#[derive(Debug, Clone, Default)]
pub struct Redirections {
    targets: HashMap<EntityId, EntityId>,
}

impl Redirections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirections recorded in a store; entries without a target and
    /// self-redirects are ignored.
    pub fn from_store(store: &MetadataStore) -> Self {
        let mut redirections = Self::new();
        for (id, target) in store.iter() {
            if let Some(target) = target {
                redirections.insert(id.clone(), EntityId::from(target));
            }
        }
        redirections
    }

    pub fn insert(&mut self, from: EntityId, to: EntityId) {
        if from != to {
            self.targets.insert(from, to);
        } else {
            self.targets.remove(&from);
        }
    }

    pub fn target(&self, id: &EntityId) -> Option<&EntityId> {
        self.targets.get(id)
    }

    /// Canonical id for `id` (itself when not redirected).
    pub fn resolve<'a>(&'a self, id: &'a EntityId) -> &'a EntityId {
        self.targets.get(id).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Rewrite an ordered id collection. Redirected ids are replaced in
    /// place; if an id collapses onto one already emitted, the later one is
    /// dropped.
    pub fn apply_to_ids(&self, ids: &[EntityId]) -> Vec<EntityId> {
        let mut seen = IndexSet::with_capacity(ids.len());
        for id in ids {
            seen.insert(self.resolve(id).clone());
        }
        seen.into_iter().collect()
    }

    /// Re-key a map onto canonical ids. When an old id and its canonical id
    /// are both present, the value carried by the redirected entry wins and
    /// the canonical key keeps its position.
    pub fn apply_to_map<V>(&self, map: IndexMap<EntityId, V>) -> IndexMap<EntityId, V> {
        let mut out: IndexMap<EntityId, V> = IndexMap::with_capacity(map.len());
        for (id, value) in map {
            match self.targets.get(&id) {
                Some(target) => {
                    out.insert(target.clone(), value);
                }
                None => {
                    out.entry(id).or_insert(value);
                }
            }
        }
        out
    }
}

/// Hand-curated replacement metadata for one entity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Override {
    pub label: String,
    pub description: String,
    #[serde(default)]
    pub alternative_id: Option<EntityId>,
}

/// Manual fixes keyed by entity, read from JSON.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Overrides(pub IndexMap<EntityId, Override>);

impl Overrides {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the overrides into the stores, warning on every value replaced.
    pub fn apply(
        &self,
        labels: &mut MetadataStore,
        descriptions: &mut MetadataStore,
        redirections: &mut Redirections,
    ) {
        for (entity, fix) in &self.0 {
            if let Some(alt) = &fix.alternative_id {
                if let Some(existing) = redirections.target(entity) {
                    log::warn!(
                        "Found an existing redirection for entity {}: {}, overwriting it with {}",
                        entity,
                        existing,
                        alt
                    );
                }
                redirections.insert(entity.clone(), alt.clone());
            }
            if let Some(existing) = labels.value(entity.as_str()) {
                log::warn!(
                    "Found an existing label for entity {}: {}, overwriting it with {}",
                    entity,
                    existing,
                    fix.label
                );
            }
            labels.insert(entity.clone(), Some(fix.label.clone()));
            if let Some(existing) = descriptions.value(entity.as_str()) {
                log::warn!(
                    "Found an existing description for entity {}: {}, overwriting it with {}",
                    entity,
                    existing,
                    fix.description
                );
            }
            descriptions.insert(entity.clone(), Some(fix.description.clone()));
        }
    }
}

/// Entity ids, labels and descriptions after correction.
#[derive(Debug, Clone)]
pub struct CorrectedEntities {
    pub entity_ids: Vec<EntityId>,
    pub labels: MetadataStore,
    pub descriptions: MetadataStore,
    /// Canonical ids dropped for having no label.
    pub removed: IndexSet<EntityId>,
}

impl CorrectedEntities {
    pub fn valid_ids(&self) -> IndexSet<EntityId> {
        self.entity_ids.iter().cloned().collect()
    }
}

/// Move ids, labels and descriptions onto canonical ids and drop entities
/// whose label is missing.
pub fn correct_entities(
    entity_ids: &[EntityId],
    labels: MetadataStore,
    descriptions: MetadataStore,
    redirections: &Redirections,
) -> CorrectedEntities {
    let ids = redirections.apply_to_ids(entity_ids);
    let mut labels = MetadataStore::from_map(redirections.apply_to_map(labels.into_map()));
    let mut descriptions = MetadataStore::from_map(redirections.apply_to_map(descriptions.into_map()));

    let removed: IndexSet<EntityId> = ids
        .iter()
        .filter(|id| labels.value(id.as_str()).is_none())
        .cloned()
        .collect();

    for id in &removed {
        labels.remove(id.as_str());
        descriptions.remove(id.as_str());
    }

    let entity_ids: Vec<EntityId> = ids.into_iter().filter(|id| !removed.contains(id)).collect();

    log::info!(
        "Corrected {} entities ({} redirected, {} removed)",
        entity_ids.len(),
        redirections.len(),
        removed.len()
    );

    CorrectedEntities {
        entity_ids,
        labels,
        descriptions,
        removed,
    }
}

/// One disambiguation example; unknown fields pass through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisambiguationSample {
    pub correct_id: EntityId,
    pub wrong_id: EntityId,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub fn load_samples(path: &Path) -> Result<Vec<DisambiguationSample>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn dump_samples(path: &Path, samples: &[DisambiguationSample]) -> Result<()> {
    let json = serde_json::to_string_pretty(samples)?;
    crate::flatfile::write_atomic(path, &json)
}

/// Redirect sample ids onto `valid` entities.
///
/// Samples whose correct id is not valid are dropped. A wrong id that is
/// invalid or collapses onto the correct id is replaced by a random valid
/// entity different from the correct one.
pub fn correct_samples<R: Rng + ?Sized>(
    samples: Vec<DisambiguationSample>,
    redirections: &Redirections,
    valid: &IndexSet<EntityId>,
    rng: &mut R,
) -> Result<Vec<DisambiguationSample>> {
    let mut corrected = Vec::with_capacity(samples.len());

    for mut sample in samples {
        let correct = redirections.resolve(&sample.correct_id).clone();
        if !valid.contains(&correct) {
            log::debug!("Dropping sample for non-existing entity {}", sample.correct_id);
            continue;
        }

        let mut wrong = redirections.resolve(&sample.wrong_id).clone();
        if wrong == correct || !valid.contains(&wrong) {
            wrong = valid
                .iter()
                .filter(|id| **id != correct)
                .choose(rng)
                .cloned()
                .ok_or_else(|| {
                    WikigraphError::InvalidInput(format!(
                        "no replacement wrong id available for {}",
                        correct
                    ))
                })?;
        }

        sample.correct_id = correct;
        sample.wrong_id = wrong;
        corrected.push(sample);
    }

    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|s| EntityId::from(*s)).collect()
    }

    fn redirections(pairs: &[(&str, &str)]) -> Redirections {
        let mut r = Redirections::new();
        for (from, to) in pairs {
            r.insert(EntityId::from(*from), EntityId::from(*to));
        }
        r
    }

    fn store(pairs: &[(&str, Option<&str>)]) -> MetadataStore {
        let mut s = MetadataStore::new();
        s.put_batch(pairs.iter().map(|(k, v)| (EntityId::from(*k), v.map(str::to_string))));
        s
    }

    fn sample(correct: &str, wrong: &str) -> DisambiguationSample {
        DisambiguationSample {
            correct_id: EntityId::from(correct),
            wrong_id: EntityId::from(wrong),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_from_store_skips_missing_and_self() {
        let r = Redirections::from_store(&store(&[("Q1", Some("Q10")), ("Q2", None), ("Q3", Some("Q3"))]));
        assert_eq!(r.len(), 1);
        assert_eq!(r.resolve(&EntityId::from("Q1")).as_str(), "Q10");
        assert_eq!(r.resolve(&EntityId::from("Q3")).as_str(), "Q3");
    }

    #[test]
    fn test_apply_to_ids_in_place_and_dedup() {
        let r = redirections(&[("Q1", "Q10"), ("Q3", "Q2")]);
        let out = r.apply_to_ids(&ids(&["Q1", "Q2", "Q3", "Q4"]));
        assert_eq!(out, ids(&["Q10", "Q2", "Q4"]));
    }

    #[test]
    fn test_apply_to_map_redirected_value_wins() {
        let r = redirections(&[("Q3", "Q2")]);
        let mut map = IndexMap::new();
        map.insert(EntityId::from("Q2"), "canonical");
        map.insert(EntityId::from("Q3"), "redirected");
        map.insert(EntityId::from("Q4"), "other");

        let out = r.apply_to_map(map);
        let entries: Vec<(&str, &str)> = out.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(entries, vec![("Q2", "redirected"), ("Q4", "other")]);
    }

    #[test]
    fn test_apply_to_map_canonical_after_redirected() {
        let r = redirections(&[("Q3", "Q2")]);
        let mut map = IndexMap::new();
        map.insert(EntityId::from("Q3"), "redirected");
        map.insert(EntityId::from("Q2"), "canonical");

        let out = r.apply_to_map(map);
        assert_eq!(out.len(), 1);
        assert_eq!(out["Q2"], "redirected");
    }

    #[test]
    fn test_overrides_apply() {
        let json = r#"{"Q7": {"label": "Seven", "description": "a number", "alternative_id": "Q70"}}"#;
        let overrides: Overrides = serde_json::from_str(json).unwrap();
        let mut labels = store(&[("Q7", None)]);
        let mut descriptions = store(&[("Q7", Some("old"))]);
        let mut r = Redirections::new();

        overrides.apply(&mut labels, &mut descriptions, &mut r);

        assert_eq!(labels.value("Q7"), Some("Seven"));
        assert_eq!(descriptions.value("Q7"), Some("a number"));
        assert_eq!(r.resolve(&EntityId::from("Q7")).as_str(), "Q70");
    }

    #[test]
    fn test_correct_entities_drops_unlabelled() {
        let r = redirections(&[("Q1", "Q10")]);
        let corrected = correct_entities(
            &ids(&["Q1", "Q2", "Q3"]),
            store(&[("Q10", Some("ten")), ("Q2", Some("two")), ("Q3", None)]),
            store(&[("Q1", Some("the tenth")), ("Q2", Some("second")), ("Q3", Some("gone"))]),
            &r,
        );

        assert_eq!(corrected.entity_ids, ids(&["Q10", "Q2"]));
        assert_eq!(corrected.removed.iter().map(EntityId::as_str).collect::<Vec<_>>(), vec!["Q3"]);
        assert_eq!(corrected.labels.value("Q10"), Some("ten"));
        assert_eq!(corrected.descriptions.value("Q10"), Some("the tenth"));
        assert!(!corrected.descriptions.contains("Q3"));
    }

    #[test]
    fn test_correct_samples() {
        let r = redirections(&[("Q1", "Q10"), ("Q5", "Q10")]);
        let valid: IndexSet<EntityId> = ids(&["Q10", "Q2", "Q3"]).into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        let samples = vec![
            sample("Q1", "Q2"),  // correct redirected
            sample("Q9", "Q2"),  // correct missing: dropped
            sample("Q1", "Q5"),  // both collapse to Q10
            sample("Q2", "Q99"), // wrong missing
        ];
        let out = correct_samples(samples, &r, &valid, &mut rng).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], sample("Q10", "Q2"));
        assert_eq!(out[1].correct_id.as_str(), "Q10");
        assert_ne!(out[1].wrong_id.as_str(), "Q10");
        assert!(valid.contains(&out[1].wrong_id));
        assert_eq!(out[2].correct_id.as_str(), "Q2");
        assert_ne!(out[2].wrong_id.as_str(), "Q2");
        assert!(valid.contains(&out[2].wrong_id));
    }

    #[test]
    fn test_sample_extra_fields_preserved() {
        let json = r#"[{"correct_id": "Q1", "wrong_id": "Q2", "string": "Paris", "text": "..."}]"#;
        let samples: Vec<DisambiguationSample> = serde_json::from_str(json).unwrap();
        let valid: IndexSet<EntityId> = ids(&["Q1", "Q2"]).into_iter().collect();
        let out = correct_samples(samples, &Redirections::new(), &valid, &mut StdRng::seed_from_u64(1)).unwrap();
        let back = serde_json::to_value(&out).unwrap();
        assert_eq!(back[0]["string"], "Paris");
        assert_eq!(back[0]["correct_id"], "Q1");
    }

    #[test]
    fn test_no_replacement_available() {
        let valid: IndexSet<EntityId> = ids(&["Q1"]).into_iter().collect();
        let result = correct_samples(
            vec![sample("Q1", "Q1")],
            &Redirections::new(),
            &valid,
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(WikigraphError::InvalidInput(_))));
    }
}
