//! chain-hashmap: a single-threaded hash map built on separate chaining,
//! with exclusively owned chains and load-factor driven rehashing.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an embeddable O(1)-average key/value container whose structural
//!   invariants are easy to state and check, layer by layer.
//! - Layers:
//!   - Chain<K, V>: singly-linked list of boxed entries. The slot owns the
//!     head, each entry owns its successor. Head insertion, lookup and
//!     unlink-by-key.
//!   - BucketArray<K, V>: one chain per slot, `hash mod capacity`
//!     addressing, fallible allocation and the relinking rehash.
//!   - ChainHashMap<K, V, S>: public API. Hashes keys through `S`, keeps
//!     the size counter, applies the growth policy from `MapConfig`, and
//!     guards user-code callbacks with a debug-only reentrancy check.
//!
//! Invariants
//! - Addressing: every entry reachable from slot `i` has
//!   `hash % capacity == i`. Rehash therefore relinks each entry into a new
//!   array; it never copies slots.
//! - Ownership is a tree (map -> array -> head -> successors). Entries move
//!   between owners through `Option::take`, so nothing is owned twice and
//!   nothing is dropped while moving.
//! - `len()` equals the number of reachable entries; no two entries hold
//!   equal keys anywhere in the table.
//! - `capacity() >= 1` always, so `mod capacity` is defined.
//!
//! Hasher and rehashing
//! - Each entry caches the `u64` hash computed at insertion and all later
//!   addressing uses it. `K: Hash` never runs during rehash, which is what
//!   makes rehash all-or-nothing: the new array is allocated fallibly up
//!   front, and the relinking that follows cannot fail.
//!
//! Growth
//! - An insert that adds a key and leaves `len / capacity` above the max
//!   load factor (default 0.75) rehashes to the next tier (`Growth::Double`
//!   by default, or `Growth::NextPrime`). `insert` keeps the entry and stays
//!   at the current capacity if that allocation fails; `try_insert` instead
//!   refuses and leaves the map untouched.
//! - Erase never shrinks.
//!
//! Errors
//! - `ChainMapError` covers invalid configuration, bucket allocation
//!   failure and capacity overflow. A missing key is a normal `None`/`false`.
//! - `with_capacity(0)` clamps to one bucket; `with_config` rejects a zero
//!   capacity.
//!
//! Logging
//! - Uses the `log` facade: `debug` per rehash, `trace` per link/unlink,
//!   `warn` when automatic growth is skipped. No logger is installed here.
//!
//! Notes and non-goals
//! - Single-threaded: no internal locking; the map is `!Sync`.
//! - Iteration order is unspecified and not stable across rehash.
//! - No `IntoIterator`/`FromIterator`/`Extend`/`Index` impls; use
//!   `iter()`/`iter_mut()` and the named methods.

mod buckets;
mod chain;
mod chain_hash_map;
mod chain_hash_map_proptest;
mod config;
mod error;
mod reentrancy;

// Public surface
pub use buckets::ChainStats;
pub use chain_hash_map::{ChainHashMap, Iter, IterMut};
pub use config::{Growth, MapConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_LOAD_FACTOR};
pub use error::{ChainMapError, Result};
