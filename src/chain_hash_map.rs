//! ChainHashMap: separate-chaining map with load-factor driven rehashing.

use crate::buckets::{BucketArray, ChainStats};
use crate::chain::{Chain, ChainIter, ChainIterMut, Entry};
use crate::config::{MapConfig, DEFAULT_INITIAL_CAPACITY};
use crate::error::{ChainMapError, Result};
use crate::reentrancy::{Op, ReentrancyCheck};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// A hash map from unique keys to values, resolving collisions by chaining.
///
/// Keys hash through `S` once, on insertion; the hash is cached in the
/// entry and reused whenever the table is rebuilt. Iteration order is
/// unspecified and changes across rehashes.
///
/// ```
/// use chain_hashmap::ChainHashMap;
///
/// let mut m = ChainHashMap::new();
/// assert!(m.insert("a", 1));
/// assert!(!m.insert("a", 3));
/// assert_eq!(m.find("a"), Some(&3));
/// assert!(m.erase("a"));
/// assert_eq!(m.find("a"), None);
/// ```
pub struct ChainHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: BucketArray<K, V>,
    len: usize,
    config: MapConfig,
    reentrancy: ReentrancyCheck,
}

impl<K, V> ChainHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with 16 buckets.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Empty map with `capacity` buckets. Zero is clamped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    /// Empty map tuned by `config`; rejects an invalid config.
    pub fn with_config(config: MapConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for ChainHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_INITIAL_CAPACITY, hasher)
    }

    /// Zero `capacity` is clamped to one bucket.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let capacity = capacity.max(1);
        Self {
            hasher,
            buckets: BucketArray::with_capacity(capacity),
            len: 0,
            config: MapConfig::default().initial_capacity(capacity),
            reentrancy: ReentrancyCheck::new(),
        }
    }

    pub fn with_config_and_hasher(config: MapConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hasher,
            buckets: BucketArray::try_with_capacity(config.initial_capacity)?,
            len: 0,
            config,
            reentrancy: ReentrancyCheck::new(),
        })
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Slot that `q` currently addresses: `hash(q) mod capacity`.
    pub fn bucket_index<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buckets.index_for(self.make_hash(q))
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Same as [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets. Always at least one.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn chain_stats(&self) -> ChainStats {
        self.buckets.stats()
    }

    /// Insert `key -> value`, or overwrite the value if `key` is present.
    ///
    /// Returns `true` when a new key was added and `false` when an existing
    /// value was overwritten (size unchanged). Adding a key that pushes the
    /// load factor past the configured maximum rehashes to the next growth
    /// tier before returning. If that allocation fails, the insert still
    /// succeeds and the table stays at its current capacity.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.replace(key, value).is_none()
    }

    /// Like [`insert`](Self::insert), returning the overwritten value.
    pub fn replace(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter(Op::Insert);
        let hash = self.make_hash(&key);
        if let Some(entry) = self.buckets.chain_mut(hash).find_mut(hash, &key) {
            return Some(core::mem::replace(&mut entry.value, value));
        }

        self.buckets.link(Entry::new(key, value, hash));
        self.len += 1;
        log::trace!("linked new entry at bucket {}", self.buckets.index_for(hash));

        if self.config.exceeds_load(self.len, self.buckets.capacity()) {
            if let Err(err) = self.buckets.grow_to_fit(&self.config, self.len) {
                log::warn!(
                    "growth skipped, staying at {} buckets for {} entries: {}",
                    self.buckets.capacity(),
                    self.len,
                    err
                );
            }
        }
        None
    }

    /// Like [`insert`](Self::insert), but all-or-nothing with respect to
    /// growth: when the new key would need a larger bucket array and that
    /// array cannot be allocated, nothing is inserted and the error is
    /// returned.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool> {
        // The overwritten value drops here, after the guard is released.
        self.try_replace(key, value).map(|old| old.is_none())
    }

    fn try_replace(&mut self, key: K, value: V) -> Result<Option<V>> {
        let _g = self.reentrancy.enter(Op::Insert);
        let hash = self.make_hash(&key);
        if let Some(entry) = self.buckets.chain_mut(hash).find_mut(hash, &key) {
            return Ok(Some(core::mem::replace(&mut entry.value, value)));
        }

        let grown_len = self.len.checked_add(1).ok_or(ChainMapError::CapacityOverflow)?;
        self.buckets.grow_to_fit(&self.config, grown_len)?;

        self.buckets.link(Entry::new(key, value, hash));
        self.len = grown_len;
        Ok(None)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn find_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter(Op::Find);
        let hash = self.make_hash(q);
        self.buckets
            .chain_mut(hash)
            .find_mut(hash, q)
            .map(|e| &mut e.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter(Op::Find);
        let hash = self.make_hash(q);
        self.buckets
            .chain(hash)
            .find(hash, q)
            .map(|e| (&e.key, &e.value))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).is_some()
    }

    /// Remove `q` if present. Returns whether an entry was removed. The
    /// bucket array never shrinks.
    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Unlink and return the stored pair. The pair is handed back after the
    /// chain is consistent again, so dropping it may safely run user code.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter(Op::Erase);
        let hash = self.make_hash(q);
        let entry = self.buckets.chain_mut(hash).remove(hash, q)?;
        self.len -= 1;
        log::trace!("unlinked entry from bucket {}", self.buckets.index_for(hash));
        Some(entry.into_pair())
    }

    /// Rebuild the table with exactly `new_capacity` buckets.
    ///
    /// Any capacity of at least one is accepted, including one below
    /// [`len`](Self::len) (longer chains, same contents). On error the map is
    /// unchanged.
    pub fn rehash(&mut self, new_capacity: usize) -> Result<()> {
        let _g = self.reentrancy.enter(Op::Rehash);
        if new_capacity == 0 {
            return Err(ChainMapError::invalid_capacity(0));
        }
        let old = self.buckets.capacity();
        self.buckets.rehash(new_capacity)?;
        log::debug!(
            "rehashed {} entries: {} -> {} buckets",
            self.len,
            old,
            new_capacity
        );
        Ok(())
    }

    /// Grow so that `additional` more keys fit without crossing the load
    /// factor.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let _g = self.reentrancy.enter(Op::Rehash);
        let needed = self
            .len
            .checked_add(additional)
            .ok_or(ChainMapError::CapacityOverflow)?;
        self.buckets.grow_to_fit(&self.config, needed)?;
        Ok(())
    }

    /// Drop every entry; capacity is kept.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut slots = self.buckets.slots().iter();
        let chain = slots.next().map(Chain::iter);
        Iter {
            slots,
            chain,
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let mut slots = self.buckets.slots_mut().iter_mut();
        let chain = slots.next().map(Chain::iter_mut);
        IterMut {
            slots,
            chain,
            remaining: self.len,
        }
    }

    /// Panic unless every structural invariant holds: each entry sits in
    /// the slot its hash addresses, its cached hash matches a fresh one,
    /// `len` counts the reachable entries and no chain holds a key twice.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut counted = 0;
        for (i, chain) in self.buckets.slots().iter().enumerate() {
            let entries: Vec<&Entry<K, V>> = chain.iter().collect();
            for (j, e) in entries.iter().enumerate() {
                assert_eq!(self.buckets.index_for(e.hash), i, "entry in wrong bucket");
                assert_eq!(self.make_hash(&e.key), e.hash, "stale cached hash");
                assert!(
                    entries[j + 1..].iter().all(|other| other.key != e.key),
                    "duplicate key in bucket {i}"
                );
            }
            counted += entries.len();
        }
        assert_eq!(counted, self.len, "len out of sync with reachable entries");
        assert!(self.capacity() >= 1);
    }
}

impl<K, V, S> fmt::Debug for ChainHashMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(&K, &V)` in unspecified order.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Chain<K, V>>,
    chain: Option<ChainIter<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain.as_mut()?.next() {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            self.chain = self.slots.next().map(Chain::iter);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in unspecified order.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Chain<K, V>>,
    chain: Option<ChainIterMut<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.chain.as_mut()?.next() {
                self.remaining -= 1;
                return Some(item);
            }
            self.chain = self.slots.next().map(Chain::iter_mut);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
