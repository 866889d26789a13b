#![cfg(test)]

// Property tests for ChainHashMap kept inside the crate so they can call the
// internal invariant checker after every step.

use crate::chain_hash_map::ChainHashMap;
use crate::config::{Growth, MapConfig};
use core::hash::BuildHasher;
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    TryInsert(usize, i32),
    Erase(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Rehash(usize),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::TryInsert(i, v)),
            3 => idx.clone().prop_map(OpI::Erase),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (1usize..64).prop_map(OpI::Rehash),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against hashbrown::HashMap. After every op:
// - the structural invariants hold (bucket addressing, cached hashes, len,
//   per-table key uniqueness),
// - `len`/`is_empty` match the model,
// - the load factor is within the configured bound unless a manual rehash
//   deliberately undersized the table.
fn run_scenario<S: BuildHasher>(
    mut sut: ChainHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut undersized = false;

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let added = sut.insert(k.clone(), v);
                prop_assert_eq!(added, !already, "insert reports new keys only");
                model.insert(k, v);
                // Adding a key regrows an undersized table; updating does not.
                undersized &= !added;
            }
            OpI::TryInsert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let added = sut.try_insert(k.clone(), v).expect("small tables always grow");
                prop_assert_eq!(added, !already);
                model.insert(k, v);
                undersized &= !added;
            }
            OpI::Erase(i) => {
                let k = key_from(pool, i);
                let before = sut.len();
                let removed = sut.erase(&k);
                prop_assert_eq!(removed, model.remove(&k).is_some());
                if removed {
                    prop_assert_eq!(sut.len(), before - 1);
                }
                prop_assert!(sut.find(&k).is_none());
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.find(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.find_mut(&k), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "find_mut presence differs from model"),
                }
            }
            OpI::Rehash(cap) => {
                let before: BTreeSet<(Key, i32)> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                sut.rehash(cap).expect("small rehash succeeds");
                prop_assert_eq!(sut.capacity(), cap);
                let after: BTreeSet<(Key, i32)> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(before, after);
                undersized = sut.load_factor() > sut.config().get_max_load_factor();
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap);
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        if !undersized {
            prop_assert!(sut.load_factor() <= sut.config().get_max_load_factor());
        }
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.find(k), Some(v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(ChainHashMap::with_capacity(1), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_next_prime((pool, ops) in arb_scenario()) {
        let cfg = MapConfig::new().initial_capacity(3).growth(Growth::NextPrime);
        run_scenario(ChainHashMap::with_config(cfg).unwrap(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Weak hasher: only the first byte of input matters, so unequal keys often
// share both hash and bucket without collapsing into one chain.
#[derive(Clone, Default)]
struct FirstByteBuildHasher;
#[derive(Default)]
struct FirstByteHasher(Option<u8>);
impl std::hash::BuildHasher for FirstByteBuildHasher {
    type Hasher = FirstByteHasher;
    fn build_hasher(&self) -> Self::Hasher {
        FirstByteHasher::default()
    }
}
impl Hasher for FirstByteHasher {
    fn write(&mut self, bytes: &[u8]) {
        if self.0.is_none() {
            self.0 = bytes.first().copied();
        }
    }
    fn finish(&self) -> u64 {
        self.0.map_or(0, u64::from)
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ChainHashMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_weak_hasher((pool, ops) in arb_scenario()) {
        run_scenario(ChainHashMap::with_hasher(FirstByteBuildHasher), &pool, ops)?;
    }
}

// Last-write-wins over arbitrary insert sequences with a small key space.
proptest! {
    #[test]
    fn prop_last_write_wins(pairs in proptest::collection::vec((0u16..200, any::<u32>()), 0..400)) {
        let mut sut: ChainHashMap<u16, u32> = ChainHashMap::new();
        let mut last: HashMap<u16, u32> = HashMap::new();
        for (k, v) in pairs {
            sut.insert(k, v);
            last.insert(k, v);
        }
        prop_assert_eq!(sut.len(), last.len());
        for (k, v) in &last {
            prop_assert_eq!(sut.find(k), Some(v));
        }
        sut.assert_invariants();
    }
}

// Keys that hash and compare equal must be found no matter which bucket
// tier the table is on.
#[test]
fn key_hash_is_stable_across_tiers() {
    #[derive(PartialEq, Eq)]
    struct Pair(u8, u8);
    impl Hash for Pair {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.0.hash(state);
            self.1.hash(state);
        }
    }

    let mut m: ChainHashMap<Pair, u16> = ChainHashMap::with_capacity(1);
    for a in 0..16u8 {
        for b in 0..16u8 {
            m.insert(Pair(a, b), u16::from(a) * 16 + u16::from(b));
        }
    }
    m.assert_invariants();
    for a in 0..16u8 {
        for b in 0..16u8 {
            assert_eq!(m.find(&Pair(a, b)), Some(&(u16::from(a) * 16 + u16::from(b))));
        }
    }
}
