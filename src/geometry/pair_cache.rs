use std::mem;

use ahash::AHashSet;

/// Canonical index pair, `proxy0 < proxy1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BroadphasePair {
    pub proxy0: usize,
    pub proxy1: usize,
}

/// Collects overlapping pairs without duplicates.
#[derive(Default)]
pub struct OverlappingPairCache {
    overlapping_pair_array: Vec<BroadphasePair>,
    hash_table: AHashSet<(usize, usize)>,
}

impl OverlappingPairCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            overlapping_pair_array: Vec::with_capacity(capacity),
            hash_table: AHashSet::with_capacity(capacity),
        }
    }

    /// Adds the pair unless it is already present. Self pairs are ignored.
    pub fn add_overlapping_pair(&mut self, mut proxy0: usize, mut proxy1: usize) {
        if proxy0 == proxy1 {
            return;
        }

        if proxy0 > proxy1 {
            mem::swap(&mut proxy0, &mut proxy1);
        }

        if self.hash_table.insert((proxy0, proxy1)) {
            self.overlapping_pair_array
                .push(BroadphasePair { proxy0, proxy1 });
        }
    }

    #[inline]
    pub fn contains_pair(&self, proxy0: usize, proxy1: usize) -> bool {
        self.hash_table
            .contains(&(proxy0.min(proxy1), proxy0.max(proxy1)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.overlapping_pair_array.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.overlapping_pair_array.is_empty()
    }

    /// Drains the cache into a sorted pair list.
    pub fn into_sorted_pairs(mut self) -> Vec<(usize, usize)> {
        self.overlapping_pair_array.sort_unstable();
        self.overlapping_pair_array
            .into_iter()
            .map(|pair| (pair.proxy0, pair.proxy1))
            .collect()
    }
}
