// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Layered define resolution.
//!
//! The [`DefineRegistry`] owns one [`DefineMap`] per [`Layer`] and resolves
//! each slot through them in fixed priority order:
//!
//! 1. Override (from the command line, kept for the whole run)
//! 2. Explicit (decoded from a replayed identity)
//! 3. Case (the current static row of the current case)
//! 4. Implicit (built-in defaults)
//!
//! The first layer with a non-null define for a slot owns it. Layers are
//! never merged per slot.
//!
//! # Example
//!
//! ```
//! use bench_runner::define::{Define, DefineMap, Override, OverrideValues};
//! use bench_runner::define::implicit::BLOCK_SIZE;
//! use bench_runner::registry::DefineRegistry;
//!
//! let mut registry = DefineRegistry::new();
//! assert!(!registry.is_varying(BLOCK_SIZE));
//!
//! registry
//!     .set_overrides(vec![Override::new(
//!         "BLOCK_SIZE",
//!         OverrideValues::parse("512,4096").unwrap(),
//!     )])
//!     .unwrap();
//! assert!(registry.is_varying(BLOCK_SIZE));
//! assert_eq!(registry.total_permutation_count(), 2);
//! ```

use crate::define::{implicit_defines, implicit_names, Define, DefineMap, Layer, Override};
use crate::error::{BenchError, Result};
use strum::{EnumCount, IntoEnumIterator};
use tracing::debug;

/// Owner of the four define layers and the slot name tables.
#[derive(Debug, Clone)]
pub struct DefineRegistry {
    /// One map per layer, indexed by `Layer as usize`.
    maps: [DefineMap; Layer::COUNT],

    /// Names declared by the current suite; `None` defers to the implicit names.
    suite_names: Vec<Option<String>>,

    /// Names of the reserved implicit slots.
    implicit_names: Vec<String>,

    /// Overrides as given, re-mapped onto slots whenever a suite is installed.
    overrides: Vec<Override>,

    /// Number of slots in play: max(suite count, implicit count).
    define_count: usize,
}

impl DefineRegistry {
    /// Registry with the built-in implicit layer and no suite installed.
    pub fn new() -> Self {
        Self::with_implicit(implicit_defines(), implicit_names())
    }

    /// Registry with a custom implicit layer.
    ///
    /// Useful for isolated fixtures that do not want the storage defaults.
    pub fn with_implicit(defines: DefineMap, names: Vec<String>) -> Self {
        let define_count = defines.len().max(names.len());
        let mut maps: [DefineMap; Layer::COUNT] = Default::default();
        maps[Layer::Implicit as usize] = defines;
        Self {
            maps,
            suite_names: Vec::new(),
            implicit_names: names,
            overrides: Vec::new(),
            define_count,
        }
    }

    /// Number of implicit slots.
    pub fn implicit_count(&self) -> usize {
        self.maps[Layer::Implicit as usize]
            .len()
            .max(self.implicit_names.len())
    }

    /// Number of slots in play for the current suite.
    pub fn define_count(&self) -> usize {
        self.define_count
    }

    /// Install a suite's slot names.
    ///
    /// Recomputes the slot count and re-maps any overrides onto the new
    /// slots by exact name. An override naming no slot of this suite is
    /// left inert, so one override set can serve suites with different
    /// parameters.
    pub fn install_suite(&mut self, names: &[Option<String>]) {
        self.suite_names = names.to_vec();
        self.define_count = names.len().max(self.implicit_count());
        debug!(
            slots = self.define_count,
            suite_slots = names.len(),
            "installed suite defines"
        );
        self.map_overrides();
    }

    /// Set the command-line overrides and map them onto the current slots.
    ///
    /// Fails with [`BenchError::InvalidDefine`], leaving the previous
    /// overrides in place, if the overrides together have more permutations
    /// than fit in a `usize`. Only the first override of each name counts.
    pub fn set_overrides(&mut self, overrides: Vec<Override>) -> Result<()> {
        let mut names: Vec<&str> = Vec::with_capacity(overrides.len());
        let mut total = 1usize;
        for o in &overrides {
            if names.contains(&o.name()) {
                continue;
            }
            names.push(o.name());
            total = total
                .checked_mul(o.values().permutations().max(1))
                .ok_or_else(|| overflow(o.name()))?;
        }

        self.overrides = overrides;
        self.map_overrides();
        Ok(())
    }

    fn map_overrides(&mut self) {
        if self.overrides.is_empty() {
            self.maps[Layer::Override as usize] = DefineMap::new();
            return;
        }

        let mut map = DefineMap::with_len(self.define_count);
        for slot in 0..self.define_count {
            let Some(name) = self.name(slot) else {
                continue;
            };
            if let Some(o) = self.overrides.iter().find(|o| o.name() == name) {
                map.set(slot, o.define());
            }
        }

        for o in &self.overrides {
            let used = (0..self.define_count).any(|slot| self.name(slot) == Some(o.name()));
            if !used {
                debug!(name = o.name(), "override matches no define in this suite");
            }
        }

        self.maps[Layer::Override as usize] = map;
    }

    /// Install one static row of a case.
    pub fn set_case_row(&mut self, row: DefineMap) {
        self.maps[Layer::Case as usize] = row;
    }

    /// Remove the case layer.
    pub fn clear_case(&mut self) {
        self.maps[Layer::Case as usize] = DefineMap::new();
    }

    /// Install an explicit layer decoded from an identity.
    pub fn set_explicit(&mut self, defines: DefineMap) {
        self.maps[Layer::Explicit as usize] = defines;
    }

    /// Remove the explicit layer.
    pub fn clear_explicit(&mut self) {
        self.maps[Layer::Explicit as usize] = DefineMap::new();
    }

    /// Drop all overrides.
    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
        self.map_overrides();
    }

    /// The layer that owns `slot`, if any.
    pub fn owner(&self, slot: usize) -> Option<Layer> {
        Layer::iter().find(|&layer| self.maps[layer as usize].get(slot).is_some())
    }

    /// The define that owns `slot`, if any.
    pub fn resolve(&self, slot: usize) -> Option<&Define> {
        self.maps.iter().find_map(|map| map.get(slot))
    }

    /// Name of `slot`, suite names first.
    pub fn name(&self, slot: usize) -> Option<&str> {
        self.suite_names
            .get(slot)
            .and_then(Option::as_deref)
            .or_else(|| self.implicit_names.get(slot).map(String::as_str))
    }

    /// True if `slot` is owned by anything other than the implicit layer.
    pub fn is_varying(&self, slot: usize) -> bool {
        matches!(
            self.owner(slot),
            Some(Layer::Override | Layer::Explicit | Layer::Case)
        )
    }

    /// Permutations of `slot`: 0 if undefined, at least 1 otherwise.
    pub fn permutation_count(&self, slot: usize) -> usize {
        self.resolve(slot)
            .map_or(0, |define| define.permutations().max(1))
    }

    /// Product of every defined slot's permutation count, saturating at
    /// `usize::MAX`.
    pub fn total_permutation_count(&self) -> usize {
        self.checked_total_permutation_count().unwrap_or(usize::MAX)
    }

    /// Product of every defined slot's permutation count, or
    /// [`BenchError::InvalidDefine`] naming the slot where it overflows.
    pub fn checked_total_permutation_count(&self) -> Result<usize> {
        let mut total = 1usize;
        for slot in 0..self.define_count {
            let count = self.permutation_count(slot);
            if count > 0 {
                total = total.checked_mul(count).ok_or_else(|| {
                    overflow(self.name(slot).unwrap_or("(unknown)"))
                })?;
            }
        }
        Ok(total)
    }
}

fn overflow(name: &str) -> BenchError {
    BenchError::InvalidDefine(format!("too many permutations at {name}"))
}

impl Default for DefineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
