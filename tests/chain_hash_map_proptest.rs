use chain_hashmap::ChainHashMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

// Model insert/erase sequences over a small key space and check the map
// agrees with an ordered model after every step.
proptest! {
    #[test]
    fn prop_insert_erase_matches_model(keys in 1u32..=64, ops in proptest::collection::vec((any::<bool>(), 0u32..1000, any::<i64>()), 1..300)) {
        let mut m: ChainHashMap<u32, i64> = ChainHashMap::with_capacity(2);
        let mut model: BTreeMap<u32, i64> = BTreeMap::new();

        for (is_insert, raw_k, v) in ops {
            let k = raw_k % keys;
            if is_insert {
                let added = m.insert(k, v);
                prop_assert_eq!(added, model.insert(k, v).is_none());
            } else {
                let before = m.len();
                let removed = m.erase(&k);
                prop_assert_eq!(removed, model.remove(&k).is_some());
                prop_assert_eq!(m.len(), if removed { before - 1 } else { before });
                prop_assert!(m.find(&k).is_none());
            }
            prop_assert_eq!(m.len(), model.len());
            prop_assert_eq!(m.find(&k), model.get(&k));
        }

        // Iteration agrees with the model once sorted.
        let mut seen: Vec<(u32, i64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        seen.sort();
        let expected: Vec<(u32, i64)> = model.into_iter().collect();
        prop_assert_eq!(seen, expected);
    }

    // Inserting the same pair twice: the second call reports an update and
    // leaves the size alone.
    #[test]
    fn prop_repeat_insert_is_idempotent(pairs in proptest::collection::vec((any::<u16>(), any::<u16>()), 1..100)) {
        let mut m: ChainHashMap<u16, u16> = ChainHashMap::new();
        for (k, v) in pairs {
            m.insert(k, v);
            let len = m.len();
            prop_assert!(!m.insert(k, v));
            prop_assert_eq!(m.len(), len);
            prop_assert_eq!(m.find(&k), Some(&v));
        }
    }
}
