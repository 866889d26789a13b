//! Error type shared by construction, rehash and fallible insertion.
//!
//! A missing key is never an error: lookups return `None` and `erase`
//! returns `false`.

use thiserror::Error;

/// Failures reported by `ChainHashMap`.
///
/// Every operation returning one of these leaves the map exactly as it was
/// before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainMapError {
    /// A bucket array must have at least one slot.
    #[error("invalid capacity: {requested} (must be at least 1)")]
    InvalidCapacity {
        /// The rejected capacity
        requested: usize,
    },

    /// The max load factor must be finite and strictly positive.
    #[error("invalid load factor: {value} (must be finite and > 0)")]
    InvalidLoadFactor {
        /// The rejected load factor
        value: f64,
    },

    /// The allocator could not provide a new bucket array.
    #[error("bucket array allocation failed: requested {buckets} buckets")]
    AllocationFailed {
        /// Number of buckets requested
        buckets: usize,
    },

    /// Computing the next capacity tier overflowed `usize`.
    #[error("capacity overflow")]
    CapacityOverflow,
}

impl ChainMapError {
    pub(crate) fn invalid_capacity(requested: usize) -> Self {
        Self::InvalidCapacity { requested }
    }

    pub(crate) fn allocation_failed(buckets: usize) -> Self {
        Self::AllocationFailed { buckets }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ChainMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let e = ChainMapError::invalid_capacity(0);
        assert_eq!(e.to_string(), "invalid capacity: 0 (must be at least 1)");

        let e = ChainMapError::allocation_failed(1 << 40);
        assert!(e.to_string().contains(&(1usize << 40).to_string()));

        let e = ChainMapError::InvalidLoadFactor { value: -1.0 };
        assert!(e.to_string().contains("-1"));
    }
}
