//! Debug-only reentrancy check.
//!
//! `ChainHashMap` calls user code (`K: Hash`, `K: Eq`) while a chain is
//! borrowed mid-scan. Safe code cannot reach the map again from there, but a
//! key holding a raw pointer back to its map can. This tracker records which
//! operation is in flight and panics when a mutating operation overlaps any
//! other. Nested read-only lookups are allowed. Release builds compile it
//! away.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;

/// Map operations that run user `Hash`/`Eq` code or reshape the table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Op {
    Insert,
    Find,
    Erase,
    Rehash,
}

impl Op {
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    fn mutates(self) -> bool {
        !matches!(self, Op::Find)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Insert => "insert",
            Op::Find => "find",
            Op::Erase => "erase",
            Op::Rehash => "rehash",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub(crate) struct ReentrancyCheck {
    #[cfg(debug_assertions)]
    active: Cell<Option<Op>>,
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
    // Single-threaded: Send, never Sync.
    _not_sync: PhantomData<Cell<()>>,
}

impl ReentrancyCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
            _not_sync: PhantomData,
        }
    }

    /// Mark `op` as running until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, op: Op) -> OpGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                assert!(
                    !outer.mutates() && !op.mutates(),
                    "reentrant {op} during {outer}: key Hash/Eq must not access the map"
                );
            } else {
                self.active.set(Some(op));
            }
            self.depth.set(self.depth.get() + 1);
            return OpGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return OpGuard { _z: PhantomData };
        }
    }
}

impl Default for ReentrancyCheck {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct OpGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ReentrancyCheck,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let depth = self.owner.depth.get();
            debug_assert!(depth > 0);
            self.owner.depth.set(depth - 1);
            if depth == 1 {
                self.owner.active.set(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_operations_are_fine() {
        let r = ReentrancyCheck::new();
        {
            let _g = r.enter(Op::Insert);
        }
        let _g = r.enter(Op::Erase);
    }

    #[test]
    fn nested_lookups_are_allowed() {
        let r = ReentrancyCheck::new();
        let _outer = r.enter(Op::Find);
        let _inner = r.enter(Op::Find);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn mutation_inside_lookup_panics() {
        let r = ReentrancyCheck::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = r.enter(Op::Find);
            let _inner = r.enter(Op::Insert);
        }));
        assert!(res.is_err(), "insert during find must panic in debug builds");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn lookup_inside_mutation_panics_and_state_recovers() {
        let r = ReentrancyCheck::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = r.enter(Op::Rehash);
            let _inner = r.enter(Op::Find);
        }));
        assert!(res.is_err());
        // The outer guard unwound, so the tracker is idle again.
        let _g = r.enter(Op::Insert);
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn release_build_is_a_no_op() {
        let r = ReentrancyCheck::new();
        let _g1 = r.enter(Op::Insert);
        let _g2 = r.enter(Op::Erase);
    }
}
