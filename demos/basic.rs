//! Walks through the map's life cycle: upsert, growth, lookup and erase.

use chain_hashmap::{ChainHashMap, ChainMapError, Growth, MapConfig};

fn main() -> Result<(), ChainMapError> {
    let mut scores: ChainHashMap<String, i32> = ChainHashMap::new();
    println!(
        "created map: {} entries, {} buckets",
        scores.len(),
        scores.capacity()
    );

    scores.insert("a".to_string(), 1);
    scores.insert("b".to_string(), 2);
    let added = scores.insert("a".to_string(), 3);
    println!("re-inserting \"a\" added a key: {added}; map = {scores:?}");

    for i in 0..13 {
        scores.insert(format!("player-{i}"), i * 10);
    }
    println!(
        "after 15 keys: {} buckets, load factor {:.3}, {:?}",
        scores.capacity(),
        scores.load_factor(),
        scores.chain_stats()
    );

    match scores.find("player-7") {
        Some(v) => println!("player-7 -> {v}"),
        None => println!("player-7 missing"),
    }
    println!("erase \"b\": {}", scores.erase("b"));
    println!("find \"b\": {:?}", scores.find("b"));

    let cfg = MapConfig::new().initial_capacity(5).growth(Growth::NextPrime);
    let mut primes: ChainHashMap<u32, u32> = ChainHashMap::with_config(cfg)?;
    for i in 0..20 {
        primes.insert(i, i * i);
    }
    println!("prime-tier map: {} buckets for {} entries", primes.capacity(), primes.len());

    primes.rehash(3)?;
    println!("manual rehash to 3 buckets: {:?}", primes.chain_stats());
    Ok(())
}
