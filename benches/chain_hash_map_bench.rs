use chain_hashmap::{ChainHashMap, Growth, MapConfig};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("chain_hash_map_insert_10k", |b| {
        b.iter_batched(
            ChainHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_next_prime(c: &mut Criterion) {
    c.bench_function("chain_hash_map_insert_10k_next_prime", |b| {
        let cfg = MapConfig::new().growth(Growth::NextPrime);
        b.iter_batched(
            || ChainHashMap::<String, u64>::with_config(cfg).unwrap(),
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit(c: &mut Criterion) {
    c.bench_function("chain_hash_map_find_hit", |b| {
        let mut m = ChainHashMap::new();
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().cloned().enumerate() {
            m.insert(k, i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.find(k.as_str()));
        })
    });
}

fn bench_find_miss(c: &mut Criterion) {
    c.bench_function("chain_hash_map_find_miss", |b| {
        let mut m = ChainHashMap::new();
        for (i, x) in lcg(11).take(10_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.find(k.as_str()));
        })
    });
}

fn bench_insert_erase_cycle(c: &mut Criterion) {
    c.bench_function("chain_hash_map_insert_erase", |b| {
        let mut m = ChainHashMap::new();
        for (i, x) in lcg(3).take(1_000).enumerate() {
            m.insert(x, i as u64);
        }
        let mut fresh = lcg(0x5eed);
        b.iter(|| {
            let k = fresh.next().unwrap();
            m.insert(k, 1);
            black_box(m.erase(&k));
        })
    });
}

fn bench_rehash(c: &mut Criterion) {
    c.bench_function("chain_hash_map_rehash_10k", |b| {
        let mut m = ChainHashMap::new();
        for (i, x) in lcg(5).take(10_000).enumerate() {
            m.insert(x, i as u64);
        }
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let target = if flip { 32_768 } else { 16_384 };
            m.rehash(target).unwrap();
            black_box(m.capacity());
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_insert_next_prime, bench_find_hit, bench_find_miss,
        bench_insert_erase_cycle, bench_rehash
}
criterion_main!(benches);
