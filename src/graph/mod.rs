//! Knowledge graph module: triplets, pair generation and graph construction.
//!
//! A graph is built once per run, either by replaying a cached triplet list
//! filtered to an entity set, or by asking a [`RelationLookup`] about every
//! ordered entity pair, batch by batch.

mod builder;
mod lookup;
mod pairs;

pub use builder::{build_from_cache, BuildProgress, GraphBuilder, DEFAULT_BATCH_SIZE};
pub use lookup::RelationLookup;
pub use pairs::{ordered_pairs, pair_batches, pair_count, EntityPairBatch};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::EntityId;

/// Predicate between two entities, e.g. `http://www.wikidata.org/prop/direct/P31`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relation(String);

impl Relation {
    pub fn new(relation: impl Into<String>) -> Self {
        Self(relation.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Relation {
    fn from(relation: &str) -> Self {
        Self(relation.to_string())
    }
}

impl From<String> for Relation {
    fn from(relation: String) -> Self {
        Self(relation)
    }
}

/// A single fact in the graph (head --relation--> tail).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triplet {
    pub head: EntityId,
    pub relation: Relation,
    pub tail: EntityId,
}

impl Triplet {
    pub fn new(head: impl Into<EntityId>, relation: impl Into<Relation>, tail: impl Into<EntityId>) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }

    /// Whether both endpoints belong to `entities`.
    pub fn within(&self, entities: &IndexSet<EntityId>) -> bool {
        entities.contains(&self.head) && entities.contains(&self.tail)
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.head, self.relation, self.tail)
    }
}

/// Set of triplets that remembers insertion order.
///
/// Uniqueness is by full (head, relation, tail) value, so the same pair may
/// appear once per distinct relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triplets: IndexSet<Triplet>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the triplet was already present.
    pub fn insert(&mut self, triplet: Triplet) -> bool {
        self.triplets.insert(triplet)
    }

    /// Append every triplet not yet present, keeping first-seen order.
    /// Returns the number of triplets actually added.
    pub fn merge<I>(&mut self, other: I) -> usize
    where
        I: IntoIterator<Item = Triplet>,
    {
        let before = self.triplets.len();
        self.triplets.extend(other);
        self.triplets.len() - before
    }

    pub fn contains(&self, triplet: &Triplet) -> bool {
        self.triplets.contains(triplet)
    }

    pub fn len(&self) -> usize {
        self.triplets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triplets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triplet> {
        self.triplets.iter()
    }

    /// Distinct endpoints in order of first appearance.
    pub fn entities(&self) -> IndexSet<EntityId> {
        let mut entities = IndexSet::new();
        for t in &self.triplets {
            entities.insert(t.head.clone());
            entities.insert(t.tail.clone());
        }
        entities
    }

    pub fn into_vec(self) -> Vec<Triplet> {
        self.triplets.into_iter().collect()
    }
}

impl FromIterator<Triplet> for Graph {
    fn from_iter<I: IntoIterator<Item = Triplet>>(iter: I) -> Self {
        Self {
            triplets: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Graph {
    type Item = Triplet;
    type IntoIter = indexmap::set::IntoIter<Triplet>;

    fn into_iter(self) -> Self::IntoIter {
        self.triplets.into_iter()
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triplet;
    type IntoIter = indexmap::set::Iter<'a, Triplet>;

    fn into_iter(self) -> Self::IntoIter {
        self.triplets.iter()
    }
}
