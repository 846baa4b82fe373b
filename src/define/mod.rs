// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Bench defines: named integer parameters evaluated on demand.
//!
//! A [`Define`] is an evaluator callback plus the number of distinct
//! sub-indices ("permutations") it accepts. Defines are grouped into
//! [`DefineMap`]s, one per [`Layer`], and resolved by the
//! [`DefineRegistry`](crate::registry::DefineRegistry).
//!
//! Evaluators receive a [`DefineLookup`] so they can read other defines.
//! Nothing orders these reads ahead of time: a define may refer forward to
//! any other slot, and the lookup memoizes each slot on first read.
//!
//! # Example
//!
//! ```
//! use bench_runner::define::{Define, DefineLookup};
//!
//! // BLOCK_COUNT = DISK_SIZE / BLOCK_SIZE, read lazily
//! let block_count = Define::new(1, |defines: &mut dyn DefineLookup, _| {
//!     Ok(defines.value(4)? / defines.value(2)?)
//! });
//! assert_eq!(block_count.permutations(), 1);
//! ```

pub mod implicit;
pub mod overrides;

pub use implicit::{implicit_defines, implicit_names, BenchConfig, ImplicitDefine};
pub use overrides::{Override, OverrideValue, OverrideValues};

use crate::error::{BenchError, Result};
use std::fmt;
use std::rc::Rc;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};

/// Read access to the current value of any define slot.
pub trait DefineLookup {
    /// Current value of `slot`, evaluating it if needed.
    fn value(&mut self, slot: usize) -> Result<i64>;
}

/// Evaluator signature: `(lookup, sub-index) -> value`.
pub type EvalFn = dyn Fn(&mut dyn DefineLookup, usize) -> Result<i64>;

/// One define: an evaluator and its permutation count.
///
/// A permutation count of 0 means "declared without permutations" and is
/// treated as 1 by the registry.
#[derive(Clone)]
pub struct Define {
    eval: Rc<EvalFn>,
    permutations: usize,
}

impl Define {
    /// Create a define from an evaluator accepting sub-indices `0..permutations`.
    pub fn new<F>(permutations: usize, eval: F) -> Self
    where
        F: Fn(&mut dyn DefineLookup, usize) -> Result<i64> + 'static,
    {
        Self {
            eval: Rc::new(eval),
            permutations,
        }
    }

    /// A constant define.
    pub fn lit(value: i64) -> Self {
        Self::new(1, move |_, _| Ok(value))
    }

    /// A define that permutes over a fixed list of values.
    ///
    /// An empty list declares no permutations and fails to evaluate.
    pub fn values(values: Vec<i64>) -> Self {
        let permutations = values.len();
        Self::new(permutations, move |_, i| {
            values.get(i).copied().ok_or_else(|| {
                BenchError::InvalidDefine(format!("no value at index {i} of {}", values.len()))
            })
        })
    }

    /// Number of sub-indices this define accepts.
    pub fn permutations(&self) -> usize {
        self.permutations
    }

    /// Evaluate sub-index `i`.
    pub fn eval(&self, lookup: &mut dyn DefineLookup, i: usize) -> Result<i64> {
        (self.eval)(lookup, i)
    }
}

impl fmt::Debug for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Define")
            .field("permutations", &self.permutations)
            .finish_non_exhaustive()
    }
}

/// Resolution layers, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCountMacro, EnumIter)]
#[repr(u8)]
pub enum Layer {
    /// Command-line overrides, kept for the whole run.
    Override,
    /// Defines decoded from a replayed identity.
    Explicit,
    /// The current static row of the current case.
    Case,
    /// Built-in defaults.
    Implicit,
}

/// Per-slot defines for one layer. `None` leaves the slot to lower layers.
#[derive(Debug, Clone, Default)]
pub struct DefineMap {
    defines: Vec<Option<Define>>,
}

impl DefineMap {
    /// Empty map covering no slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map covering `len` slots, all unset.
    pub fn with_len(len: usize) -> Self {
        Self {
            defines: vec![None; len],
        }
    }

    /// Number of slots this map covers.
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    /// True if this map covers no slots.
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Define for `slot`, if this map covers it with a non-null entry.
    pub fn get(&self, slot: usize) -> Option<&Define> {
        self.defines.get(slot).and_then(Option::as_ref)
    }

    /// Set `slot`, growing the map if needed.
    pub fn set(&mut self, slot: usize, define: Define) {
        if slot >= self.defines.len() {
            self.defines.resize(slot + 1, None);
        }
        self.defines[slot] = Some(define);
    }

    /// Grow the map to cover at least `len` slots.
    pub fn grow(&mut self, len: usize) {
        if len > self.defines.len() {
            self.defines.resize(len, None);
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, slot: usize, define: Define) -> Self {
        self.set(slot, define);
        self
    }
}

impl FromIterator<Option<Define>> for DefineMap {
    fn from_iter<I: IntoIterator<Item = Option<Define>>>(iter: I) -> Self {
        Self {
            defines: iter.into_iter().collect(),
        }
    }
}
