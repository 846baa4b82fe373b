// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Define context: the registry plus a lazily evaluated value cache.
//!
//! The [`DefineContext`] is the lookup that bench cases and define
//! evaluators read from. Selecting a permutation does not evaluate
//! anything; it records, per slot, which define owns the slot and which
//! sub-index to evaluate it with. The first read of a slot evaluates and
//! memoizes it.
//!
//! # Mutual Recursion
//!
//! Defines may read each other in any order, e.g. `BLOCK_COUNT` reads
//! `DISK_SIZE` and `BLOCK_SIZE`. Each slot is evaluated on first read, so no
//! evaluation order is computed up front. A define that (transitively) reads
//! itself recurses without bound; there is no cycle detection.
//!
//! # Example
//!
//! ```
//! use bench_runner::context::DefineContext;
//! use bench_runner::define::implicit::{BLOCK_COUNT, BLOCK_SIZE};
//! use bench_runner::define::{DefineLookup, Override};
//!
//! let mut ctx = DefineContext::default();
//! ctx.registry_mut()
//!     .set_overrides(vec![Override::parse("BLOCK_SIZE=512").unwrap()])
//!     .unwrap();
//! ctx.select_permutation(0);
//!
//! assert_eq!(ctx.value(BLOCK_SIZE).unwrap(), 512);
//! // derived from the overridden BLOCK_SIZE
//! assert_eq!(ctx.value(BLOCK_COUNT).unwrap(), 2048);
//! ```

use crate::define::{Define, DefineLookup};
use crate::error::{BenchError, Result};
use crate::registry::DefineRegistry;

/// Cache state of one slot for the selected permutation.
#[derive(Debug, Clone, Default)]
enum CacheEntry {
    /// No layer owns this slot.
    #[default]
    Undefined,
    /// Owned, not yet evaluated.
    Pending { define: Define, permutation: usize },
    /// Evaluated.
    Resolved(i64),
}

/// Registry plus per-slot memoization for the selected permutation.
#[derive(Debug, Default)]
pub struct DefineContext {
    registry: DefineRegistry,
    cache: Vec<CacheEntry>,
}

impl DefineContext {
    /// Context over `registry` with nothing selected.
    pub fn new(registry: DefineRegistry) -> Self {
        Self {
            registry,
            cache: Vec::new(),
        }
    }

    /// The layers backing this context.
    pub fn registry(&self) -> &DefineRegistry {
        &self.registry
    }

    /// Mutable access to the layers.
    ///
    /// Changing layers does not touch the cache; call
    /// [`select_permutation`](Self::select_permutation) afterwards.
    pub fn registry_mut(&mut self) -> &mut DefineRegistry {
        &mut self.registry
    }

    /// Select flat permutation `perm` of the current layers.
    ///
    /// `perm` is decomposed in mixed radix over the owned slots, slot 0
    /// least significant. Every cache entry is rebuilt.
    pub fn select_permutation(&mut self, mut perm: usize) {
        let count = self.registry.define_count();
        if self.cache.capacity() < count {
            self.cache.reserve(count.next_power_of_two() - self.cache.len());
        }
        self.cache.clear();

        for slot in 0..count {
            let entry = match self.registry.resolve(slot) {
                Some(define) => {
                    let permutations = define.permutations().max(1);
                    let entry = CacheEntry::Pending {
                        define: define.clone(),
                        permutation: perm % permutations,
                    };
                    perm /= permutations;
                    entry
                }
                None => CacheEntry::Undefined,
            };
            self.cache.push(entry);
        }
    }

    /// Sub-index selected for `slot`, if it is owned and not yet evaluated.
    pub fn selected(&self, slot: usize) -> Option<usize> {
        match self.cache.get(slot) {
            Some(CacheEntry::Pending { permutation, .. }) => Some(*permutation),
            _ => None,
        }
    }

    /// Value of `slot`, or `None` if no layer owns it.
    pub fn try_value(&mut self, slot: usize) -> Result<Option<i64>> {
        match self.cache.get(slot) {
            Some(CacheEntry::Resolved(value)) => Ok(Some(*value)),
            Some(CacheEntry::Pending {
                define,
                permutation,
            }) => {
                let define = define.clone();
                let permutation = *permutation;
                let value = define.eval(self, permutation)?;
                self.cache[slot] = CacheEntry::Resolved(value);
                Ok(Some(value))
            }
            Some(CacheEntry::Undefined) | None => Ok(None),
        }
    }
}

impl DefineLookup for DefineContext {
    fn value(&mut self, slot: usize) -> Result<i64> {
        self.try_value(slot)?
            .ok_or_else(|| BenchError::UndefinedDefine {
                slot,
                name: self.registry.name(slot).map(str::to_owned),
            })
    }
}
