//! Construction-time tuning: initial bucket count, max load factor and the
//! growth policy applied when the load factor is exceeded.

use crate::error::{ChainMapError, Result};

/// Bucket count used by `ChainHashMap::new`.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Load factor (`len / capacity`) above which an insert triggers a rehash.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// How the next capacity tier is chosen when the map grows.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Growth {
    /// `capacity * 2`.
    #[default]
    Double,
    /// Smallest prime `>= capacity * 2`. Spreads keys whose hashes share
    /// low-order structure more evenly than a power-of-two modulus.
    NextPrime,
}

impl Growth {
    /// Capacity tier that follows `current`.
    pub fn next_capacity(self, current: usize) -> Result<usize> {
        let doubled = current
            .max(1)
            .checked_mul(2)
            .ok_or(ChainMapError::CapacityOverflow)?;
        match self {
            Growth::Double => Ok(doubled),
            Growth::NextPrime => next_prime(doubled).ok_or(ChainMapError::CapacityOverflow),
        }
    }
}

/// Smallest prime `>= n`, or `None` if it does not fit in `usize`.
pub(crate) fn next_prime(n: usize) -> Option<usize> {
    let mut candidate = n.max(2);
    loop {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_add(1)?;
    }
}

// Deterministic Miller-Rabin: these witnesses are exact for every `u64`,
// so a prime tier near the top of the address space costs microseconds.
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

fn is_prime(n: usize) -> bool {
    let n = n as u64;
    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    'witness: for a in WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[inline]
fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) % u128::from(m)) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut acc = 1;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}

/// Tunables for a `ChainHashMap`.
///
/// Built with chained setters and checked by [`MapConfig::validate`] when
/// passed to `ChainHashMap::with_config`:
///
/// ```
/// use chain_hashmap::{Growth, MapConfig};
///
/// let cfg = MapConfig::new()
///     .initial_capacity(64)
///     .max_load_factor(0.9)
///     .growth(Growth::NextPrime);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapConfig {
    pub(crate) initial_capacity: usize,
    pub(crate) max_load_factor: f64,
    pub(crate) growth: Growth,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth: Growth::Double,
        }
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn max_load_factor(mut self, load_factor: f64) -> Self {
        self.max_load_factor = load_factor;
        self
    }

    pub fn growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    pub fn get_initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn get_max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    pub fn get_growth(&self) -> Growth {
        self.growth
    }

    /// Reject a zero capacity and any load factor that is not a finite
    /// positive number.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(ChainMapError::invalid_capacity(0));
        }
        if !self.max_load_factor.is_finite() || self.max_load_factor <= 0.0 {
            return Err(ChainMapError::InvalidLoadFactor {
                value: self.max_load_factor,
            });
        }
        Ok(())
    }

    /// True when `len` entries in `capacity` buckets exceed the threshold.
    #[inline]
    pub(crate) fn exceeds_load(&self, len: usize, capacity: usize) -> bool {
        len as f64 > self.max_load_factor * capacity as f64
    }

    /// Smallest capacity on this config's growth tiers, at least `current`,
    /// that holds `len` entries without exceeding the load factor.
    ///
    /// Tiers above `max_buckets` are never produced. When even that many
    /// buckets would be over the load factor the request fails up front,
    /// before any tier is computed.
    pub(crate) fn capacity_for(
        &self,
        len: usize,
        current: usize,
        max_buckets: usize,
    ) -> Result<usize> {
        if self.exceeds_load(len, max_buckets) {
            return Err(ChainMapError::CapacityOverflow);
        }
        let mut capacity = current.max(1);
        while self.exceeds_load(len, capacity) {
            capacity = self.growth.next_capacity(capacity)?;
            if capacity > max_buckets {
                return Err(ChainMapError::CapacityOverflow);
            }
        }
        Ok(capacity)
    }
}
