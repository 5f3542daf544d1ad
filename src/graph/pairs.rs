//! Ordered pair generation and batching.

use crate::entity::EntityId;

/// Up to `batch_size` (head, tail) pairs sent in one lookup round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPairBatch {
    pub heads: Vec<EntityId>,
    pub tails: Vec<EntityId>,
}

impl EntityPairBatch {
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&EntityId, &EntityId)> {
        self.heads.iter().zip(self.tails.iter())
    }
}

/// Number of ordered pairs of distinct positions among `n` entities.
pub fn pair_count(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1))
}

/// Every permutation of size two, in lexicographic order of positions:
/// for `[a, b, c]` that is `ab ac ba bc ca cb`.
///
/// Positions, not values, decide self-pairs, so callers hand in a
/// duplicate-free sequence.
pub fn ordered_pairs(entities: &[EntityId]) -> impl Iterator<Item = (&EntityId, &EntityId)> {
    entities.iter().enumerate().flat_map(move |(i, head)| {
        entities
            .iter()
            .enumerate()
            .filter(move |(j, _)| *j != i)
            .map(move |(_, tail)| (head, tail))
    })
}

/// [`ordered_pairs`] cut into consecutive batches of at most `batch_size`.
///
/// Batches are produced on demand; only the current one is held in memory.
pub fn pair_batches(
    entities: &[EntityId],
    batch_size: usize,
) -> impl Iterator<Item = EntityPairBatch> + '_ {
    let batch_size = batch_size.max(1);
    let mut pairs = ordered_pairs(entities);

    std::iter::from_fn(move || {
        let (heads, tails): (Vec<EntityId>, Vec<EntityId>) = pairs
            .by_ref()
            .take(batch_size)
            .map(|(h, t)| (h.clone(), t.clone()))
            .unzip();
        (!heads.is_empty()).then_some(EntityPairBatch { heads, tails })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|s| EntityId::from(*s)).collect()
    }

    fn numbered(n: usize) -> Vec<EntityId> {
        (0..n).map(|i| EntityId::new(format!("Q{}", i))).collect()
    }

    #[test]
    fn test_pairs_follow_permutation_order() {
        let entities = ids(&["Q1", "Q2", "Q3"]);
        let pairs: Vec<(&str, &str)> = ordered_pairs(&entities)
            .map(|(h, t)| (h.as_str(), t.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Q1", "Q2"),
                ("Q1", "Q3"),
                ("Q2", "Q1"),
                ("Q2", "Q3"),
                ("Q3", "Q1"),
                ("Q3", "Q2"),
            ]
        );
    }

    #[test]
    fn test_pair_count_and_no_self_pairs() {
        for n in 0..8 {
            let entities = numbered(n);
            assert_eq!(ordered_pairs(&entities).count(), pair_count(n));
            assert_eq!(pair_count(n), n * n.saturating_sub(1));
            assert!(ordered_pairs(&entities).all(|(h, t)| h != t));
        }
    }

    #[test]
    fn test_batches_are_exhaustive_and_ordered() {
        let entities = numbered(6);
        let expected: Vec<(&EntityId, &EntityId)> = ordered_pairs(&entities).collect();

        for batch_size in [1, 4, 7, 30, 31] {
            let batches: Vec<EntityPairBatch> = pair_batches(&entities, batch_size).collect();
            assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= batch_size));
            assert_eq!(batches.len(), pair_count(6).div_ceil(batch_size));

            let rejoined: Vec<(&EntityId, &EntityId)> =
                batches.iter().flat_map(|b| b.pairs()).collect();
            assert_eq!(rejoined, expected);
        }
    }

    #[test]
    fn test_batches_are_produced_lazily() {
        let entities = numbered(100);
        let mut batches = pair_batches(&entities, 10);

        let first = batches.next().unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.heads.iter().map(EntityId::as_str).collect::<Vec<_>>(), vec!["Q0"; 10]);
        assert_eq!(first.tails[0].as_str(), "Q1");
        assert_eq!(batches.next().unwrap().heads[0].as_str(), "Q0");
    }

    #[test]
    fn test_last_batch_may_be_shorter() {
        let entities = ids(&["Q1", "Q2", "Q3"]);
        let sizes: Vec<usize> = pair_batches(&entities, 4).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![4, 2]);
    }

    #[test]
    fn test_no_pairs_no_batches() {
        assert_eq!(pair_batches(&ids(&["Q1"]), 10).count(), 0);
        assert_eq!(pair_batches(&[], 10).count(), 0);
    }
}
