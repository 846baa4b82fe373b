// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Bench suites and cases, as provided to the runner.
//!
//! A [`Suite`] declares its define names and a list of [`Case`]s. Suite
//! specific defines are numbered after the implicit block, so the first
//! name passed to [`Suite::with_defines`] is slot `IMPLICIT_DEFINE_COUNT`.
//!
//! # Example
//!
//! ```
//! use bench_runner::define::{Define, DefineLookup};
//! use bench_runner::suite::{Case, Suite};
//!
//! let suite = Suite::new("bench_example", "benches/bench_example.toml")
//!     .with_defines(&["N"])
//!     .with_case(
//!         Case::new("bench_example_sum", |ctx| {
//!             let n = ctx.define(16)?;
//!             ctx.result("sum", 0, n as u64, (0..n as u64).sum())
//!         })
//!         .with_slot(16, Define::values(vec![10, 100])),
//!     );
//! assert_eq!(suite.define_count(), 17);
//! ```

use crate::define::implicit::IMPLICIT_DEFINE_COUNT;
use crate::define::{Define, DefineLookup, DefineMap};
use crate::error::Result;
use crate::runner::RunContext;
use bitflags::bitflags;
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// Flags attached to suites and cases.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BenchFlags: u8 {
        /// Tests runner internals rather than the storage layer.
        const INTERNAL = 0x1;
    }
}

impl BenchFlags {
    /// Flag column as shown in listings: `i` for internal, `-` for none.
    pub fn label(self) -> &'static str {
        if self.contains(BenchFlags::INTERNAL) {
            "i"
        } else if self.is_empty() {
            "-"
        } else {
            ""
        }
    }
}

/// Case filter: decides, per permutation, whether the case applies.
pub type FilterFn = dyn Fn(&mut dyn DefineLookup) -> Result<bool>;

/// Case body, run once per selected permutation.
pub type RunFn = dyn Fn(&mut RunContext<'_>) -> Result<()>;

/// One bench case.
#[derive(Clone)]
pub struct Case {
    name: String,
    path: String,
    flags: BenchFlags,
    rows: Vec<DefineMap>,
    filter: Option<Rc<FilterFn>>,
    run: Rc<RunFn>,
}

impl Case {
    /// Case `name` running `run` for each permutation.
    pub fn new<F>(name: &str, run: F) -> Self
    where
        F: Fn(&mut RunContext<'_>) -> Result<()> + 'static,
    {
        Self {
            name: name.to_owned(),
            path: String::new(),
            flags: BenchFlags::empty(),
            rows: Vec::new(),
            filter: None,
            run: Rc::new(run),
        }
    }

    /// Source location reported by `--list-case-paths`.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_owned();
        self
    }

    /// Set flags.
    pub fn with_flags(mut self, flags: BenchFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Append a static permutation row.
    pub fn with_row(mut self, row: DefineMap) -> Self {
        self.rows.push(row);
        self
    }

    /// Set `slot` in every row, creating a single row if there are none.
    pub fn with_slot(mut self, slot: usize, define: Define) -> Self {
        if self.rows.is_empty() {
            self.rows.push(DefineMap::new());
        }
        for row in &mut self.rows {
            row.set(slot, define.clone());
        }
        self
    }

    /// Only run permutations for which `filter` returns true.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&mut dyn DefineLookup) -> Result<bool> + 'static,
    {
        self.filter = Some(Rc::new(filter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn flags(&self) -> BenchFlags {
        self.flags
    }

    /// Static permutation rows. Empty means one row with no case defines.
    pub fn rows(&self) -> &[DefineMap] {
        &self.rows
    }

    /// Evaluate the filter for the selected permutation.
    pub fn accepts(&self, defines: &mut dyn DefineLookup) -> Result<bool> {
        match &self.filter {
            Some(filter) => filter(defines),
            None => Ok(true),
        }
    }

    /// Run the case body.
    pub fn run(&self, ctx: &mut RunContext<'_>) -> Result<()> {
        (self.run)(ctx)
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("flags", &self.flags)
            .field("rows", &self.rows.len())
            .field("filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

/// A named group of cases sharing define names.
#[derive(Debug, Clone)]
pub struct Suite {
    name: String,
    path: String,
    flags: BenchFlags,
    define_names: Vec<Option<String>>,
    cases: Vec<Case>,
}

impl Suite {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_owned(),
            path: path.to_owned(),
            flags: BenchFlags::empty(),
            define_names: Vec::new(),
            cases: Vec::new(),
        }
    }

    /// Declare suite defines, numbered from `IMPLICIT_DEFINE_COUNT`.
    pub fn with_defines(mut self, names: &[&str]) -> Self {
        self.define_names = vec![None; IMPLICIT_DEFINE_COUNT];
        self.define_names
            .extend(names.iter().map(|&name| Some(name.to_owned())));
        self
    }

    pub fn with_flags(mut self, flags: BenchFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_case(mut self, case: Case) -> Self {
        self.cases.push(case);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn flags(&self) -> BenchFlags {
        self.flags
    }

    /// Slot names, indexed by slot. Implicit slots are `None`.
    pub fn define_names(&self) -> &[Option<String>] {
        &self.define_names
    }

    /// Number of slots this suite declares, including the implicit block.
    pub fn define_count(&self) -> usize {
        self.define_names.len()
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }
}
