//! Bucket array: owns one chain head per slot and maps hashes to slots.
//!
//! Invariant: every entry reachable from slot `i` satisfies
//! `entry.hash % capacity == i`. Growing the capacity changes the target
//! slot of (almost) every entry, so `rehash` relinks entries one by one
//! into a freshly allocated array instead of copying slots.

use crate::chain::{Chain, Entry};
use crate::config::MapConfig;
use crate::error::{ChainMapError, Result};

/// Distribution snapshot of a bucket array.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ChainStats {
    /// Slots holding at least one entry.
    pub occupied: usize,
    /// Slots holding no entry.
    pub empty: usize,
    /// Length of the longest chain.
    pub longest: usize,
}

pub(crate) struct BucketArray<K, V> {
    slots: Vec<Chain<K, V>>,
}

impl<K, V> BucketArray<K, V> {
    /// Infallible constructor for the public `new`/`with_capacity` paths.
    /// Zero is clamped to one slot.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Chain::new);
        Self { slots }
    }

    /// Allocate `capacity` empty slots, reporting allocator failure instead
    /// of aborting.
    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ChainMapError::invalid_capacity(0));
        }
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| ChainMapError::allocation_failed(capacity))?;
        slots.resize_with(capacity, Chain::new);
        Ok(Self { slots })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// `hash mod capacity`. Capacity is never zero.
    #[inline]
    pub(crate) fn index_for(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    #[inline]
    pub(crate) fn chain(&self, hash: u64) -> &Chain<K, V> {
        &self.slots[self.index_for(hash)]
    }

    #[inline]
    pub(crate) fn chain_mut(&mut self, hash: u64) -> &mut Chain<K, V> {
        let i = self.index_for(hash);
        &mut self.slots[i]
    }

    /// Head-insert a detached entry into the slot its cached hash selects.
    #[inline]
    pub(crate) fn link(&mut self, entry: Box<Entry<K, V>>) {
        let hash = entry.hash;
        self.chain_mut(hash).push_front(entry);
    }

    pub(crate) fn slots(&self) -> &[Chain<K, V>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Chain<K, V>] {
        &mut self.slots
    }

    /// Move every entry into a new array of `new_capacity` slots.
    ///
    /// The only fallible step, allocating the new array, happens before any
    /// entry moves; on error `self` is untouched. Relinking reads the cached
    /// hash and cannot fail or call user code, so once it starts it runs to
    /// completion and the old array is replaced in one assignment.
    pub(crate) fn rehash(&mut self, new_capacity: usize) -> Result<()> {
        let mut fresh = Self::try_with_capacity(new_capacity)?;
        for chain in self.slots.iter_mut() {
            while let Some(entry) = chain.pop_front() {
                fresh.link(entry);
            }
        }
        *self = fresh;
        Ok(())
    }

    /// Largest slot count whose allocation size fits in `isize`.
    #[inline]
    pub(crate) fn max_buckets() -> usize {
        isize::MAX as usize / core::mem::size_of::<Chain<K, V>>().max(1)
    }

    /// Rehash onto the growth tier that keeps `len` entries under the load
    /// factor. Returns whether the array was replaced.
    pub(crate) fn grow_to_fit(&mut self, config: &MapConfig, len: usize) -> Result<bool> {
        let old = self.capacity();
        let target = config.capacity_for(len, old, Self::max_buckets())?;
        if target == old {
            return Ok(false);
        }
        self.rehash(target)?;
        log::debug!("rehashed {} entries: {} -> {} buckets", len, old, target);
        Ok(true)
    }

    pub(crate) fn clear(&mut self) {
        for chain in self.slots.iter_mut() {
            chain.clear();
        }
    }

    pub(crate) fn stats(&self) -> ChainStats {
        self.slots
            .iter()
            .fold(ChainStats::default(), |mut stats, chain| {
                if chain.is_empty() {
                    stats.empty += 1;
                } else {
                    stats.occupied += 1;
                    stats.longest = stats.longest.max(chain.len());
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, hashes: &[u64]) -> BucketArray<u64, u64> {
        let mut b = BucketArray::with_capacity(capacity);
        for &h in hashes {
            b.link(Entry::new(h, h * 10, h));
        }
        b
    }

    fn entries(b: &BucketArray<u64, u64>) -> Vec<(u64, u64)> {
        let mut out: Vec<(u64, u64)> = b
            .slots()
            .iter()
            .flat_map(|c| c.iter().map(|e| (e.key, e.value)))
            .collect();
        out.sort();
        out
    }

    fn assert_addressing(b: &BucketArray<u64, u64>) {
        for (i, chain) in b.slots().iter().enumerate() {
            for e in chain.iter() {
                assert_eq!(b.index_for(e.hash), i, "entry {} in wrong slot", e.key);
            }
        }
    }

    #[test]
    fn zero_capacity_is_clamped_or_rejected() {
        let b: BucketArray<u8, u8> = BucketArray::with_capacity(0);
        assert_eq!(b.capacity(), 1);
        assert!(matches!(
            BucketArray::<u8, u8>::try_with_capacity(0),
            Err(ChainMapError::InvalidCapacity { requested: 0 })
        ));
    }

    #[test]
    fn index_is_hash_mod_capacity() {
        let b: BucketArray<u8, u8> = BucketArray::with_capacity(16);
        assert_eq!(b.index_for(0), 0);
        assert_eq!(b.index_for(17), 1);
        assert_eq!(b.index_for(u64::MAX), (u64::MAX % 16) as usize);
    }

    #[test]
    fn rehash_moves_every_entry_to_its_new_slot() {
        let hashes: Vec<u64> = (0..40).collect();
        let mut b = filled(8, &hashes);
        let before = entries(&b);

        b.rehash(13).unwrap();
        assert_eq!(b.capacity(), 13);
        assert_eq!(entries(&b), before);
        assert_addressing(&b);

        // Shrinking below the entry count is allowed; chains just get longer.
        b.rehash(2).unwrap();
        assert_eq!(entries(&b), before);
        assert_addressing(&b);
        assert_eq!(b.stats().longest, 20);
    }

    #[test]
    fn failed_allocation_leaves_array_untouched() {
        let mut b = filled(4, &[1, 2, 3]);
        let before = entries(&b);
        let err = b.rehash(usize::MAX).unwrap_err();
        assert_eq!(err, ChainMapError::AllocationFailed { buckets: usize::MAX });
        assert_eq!(b.capacity(), 4);
        assert_eq!(entries(&b), before);
        assert_addressing(&b);
    }

    #[test]
    fn grow_to_fit_follows_config() {
        let cfg = MapConfig::default();
        let mut b = filled(16, &(0..12).collect::<Vec<_>>());
        assert!(!b.grow_to_fit(&cfg, 12).unwrap());
        assert_eq!(b.capacity(), 16);

        b.link(Entry::new(12, 120, 12));
        assert!(b.grow_to_fit(&cfg, 13).unwrap());
        assert_eq!(b.capacity(), 32);
        assert_addressing(&b);
    }

    #[test]
    fn stats_and_clear() {
        let mut b = filled(4, &[0, 4, 8, 1]);
        assert_eq!(
            b.stats(),
            ChainStats {
                occupied: 2,
                empty: 2,
                longest: 3
            }
        );
        b.clear();
        assert!(entries(&b).is_empty());
        assert_eq!(b.stats().empty, 4);
        assert_eq!(b.capacity(), 4);
    }
}
