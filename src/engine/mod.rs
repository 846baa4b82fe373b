// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Permutation enumeration for one bench case.
//!
//! The engine walks every permutation a case runs under and hands each to a
//! [`PermutationVisitor`]. The order is fixed and observable in the output:
//!
//! 1. Rows outermost: each static row of the case is installed as the case
//!    layer in turn (a case with no rows has one empty row)
//! 2. Flat permutation index innermost: `0..total_permutation_count()` for
//!    the layers as they stand with that row installed
//! 3. Within a flat index, slot 0 is the least significant digit
//!
//! # Deduplication
//!
//! Rows often differ only in defines that an override then replaces, so
//! distinct (row, index) pairs can resolve to identical values. Each
//! resolved tuple of varying defines is recorded in a [`SeenTrie`] and
//! repeats are skipped. The first permutation of a case always runs.
//!
//! # Replay
//!
//! When an explicit layer is given (decoded from an identity), rows are not
//! used: the explicit layer is installed once and its permutations are
//! visited without deduplication.
//!
//! # Example
//!
//! ```
//! use bench_runner::context::DefineContext;
//! use bench_runner::define::{Define, DefineMap};
//! use bench_runner::engine::PermutationEngine;
//! use bench_runner::error::Result;
//! use bench_runner::suite::{Case, Suite};
//!
//! let suite = Suite::new("s", "s.toml").with_defines(&["N"]);
//! let case = Case::new("c", |_| Ok(()))
//!     .with_row(DefineMap::new().with(16, Define::values(vec![1, 2])))
//!     .with_row(DefineMap::new().with(16, Define::lit(2)));
//!
//! let mut ctx = DefineContext::default();
//! ctx.registry_mut().install_suite(suite.define_names());
//!
//! let mut engine = PermutationEngine::new();
//! let mut count = 0;
//! engine
//!     .for_each_permutation(&mut ctx, &suite, &case, None, &mut |_: &mut DefineContext, _: &Suite, _: &Case| -> Result<()> {
//!         count += 1;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! // the second row repeats N=2
//! assert_eq!(count, 2);
//! assert_eq!(engine.statistics(), (2, 1));
//! ```

pub mod visitor;

pub use visitor::PermutationVisitor;

use crate::context::DefineContext;
use crate::define::{DefineLookup, DefineMap};
use crate::error::Result;
use crate::identity::BenchId;
use crate::seen::SeenTrie;
use crate::suite::{Case, Suite};
use tracing::{debug, trace};

/// Value recorded for defines that do not vary, so they never split tuples.
const UNVARIED: i64 = 0;

/// Enumerates case permutations and tracks how many were visited.
#[derive(Debug, Default)]
pub struct PermutationEngine {
    /// Statistics: permutations handed to a visitor.
    yielded: u64,

    /// Statistics: permutations skipped as repeats.
    deduplicated: u64,
}

impl PermutationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit every permutation of `case`.
    ///
    /// The suite's names must already be installed in `ctx`. With a
    /// non-empty `explicit`, replays exactly the permutations of that layer
    /// instead of the case's rows.
    pub fn for_each_permutation(
        &mut self,
        ctx: &mut DefineContext,
        suite: &Suite,
        case: &Case,
        explicit: Option<&DefineMap>,
        visitor: &mut dyn PermutationVisitor,
    ) -> Result<()> {
        match explicit.filter(|explicit| !explicit.is_empty()) {
            Some(explicit) => self.replay(ctx, suite, case, explicit, visitor),
            None => self.enumerate_rows(ctx, suite, case, visitor),
        }
    }

    fn replay(
        &mut self,
        ctx: &mut DefineContext,
        suite: &Suite,
        case: &Case,
        explicit: &DefineMap,
        visitor: &mut dyn PermutationVisitor,
    ) -> Result<()> {
        ctx.registry_mut().clear_case();
        ctx.registry_mut().set_explicit(explicit.clone());

        let total = ctx.registry().checked_total_permutation_count()?;
        debug!(case = case.name(), total, visitor = visitor.name(), "replaying explicit defines");
        for perm in 0..total {
            ctx.select_permutation(perm);
            self.yielded += 1;
            visitor.visit(ctx, suite, case)?;
        }

        ctx.registry_mut().clear_explicit();
        Ok(())
    }

    fn enumerate_rows(
        &mut self,
        ctx: &mut DefineContext,
        suite: &Suite,
        case: &Case,
        visitor: &mut dyn PermutationVisitor,
    ) -> Result<()> {
        let mut seen = SeenTrie::new();
        let rows = case.rows().len().max(1);

        for row in 0..rows {
            match case.rows().get(row) {
                Some(defines) => ctx.registry_mut().set_case_row(defines.clone()),
                None => ctx.registry_mut().clear_case(),
            }

            let total = ctx.registry().checked_total_permutation_count()?;
            debug!(case = case.name(), row, total, visitor = visitor.name(), "enumerating row");
            for perm in 0..total {
                ctx.select_permutation(perm);

                let was_seen = seen.insert(varying_values(ctx)?);
                if !(row == 0 && perm == 0) && was_seen {
                    trace!(case = case.name(), row, perm, "skipping repeated permutation");
                    self.deduplicated += 1;
                    continue;
                }

                self.yielded += 1;
                visitor.visit(ctx, suite, case)?;
            }
        }

        ctx.registry_mut().clear_case();
        Ok(())
    }

    /// Get statistics about enumeration so far.
    ///
    /// Returns (yielded, deduplicated).
    pub fn statistics(&self) -> (u64, u64) {
        (self.yielded, self.deduplicated)
    }
}

/// Install each suite in turn for each bench id and hand it to `f`.
///
/// Ids are outermost, so a suite selected by two ids is visited twice. No
/// ids selects everything once.
pub fn for_each_suite<F>(
    ctx: &mut DefineContext,
    suites: &[Suite],
    ids: &[BenchId],
    mut f: F,
) -> Result<()>
where
    F: FnMut(&mut DefineContext, &Suite, &BenchId) -> Result<()>,
{
    let all = [BenchId::all()];
    let ids = if ids.is_empty() { &all[..] } else { ids };
    for id in ids {
        for suite in suites {
            ctx.registry_mut().install_suite(suite.define_names());
            f(ctx, suite, id)?;
        }
    }
    Ok(())
}

/// Values of every slot for the selected permutation, with non-varying
/// slots replaced by a fixed placeholder.
pub fn varying_values(ctx: &mut DefineContext) -> Result<Vec<i64>> {
    (0..ctx.registry().define_count())
        .map(|slot| {
            if ctx.registry().is_varying(slot) {
                ctx.value(slot)
            } else {
                Ok(UNVARIED)
            }
        })
        .collect()
}

/// Recover the flat permutation index from the selected sub-indices.
///
/// Inverse of [`DefineContext::select_permutation`] for slots that have not
/// been evaluated yet.
pub fn flat_index(ctx: &DefineContext) -> usize {
    let registry = ctx.registry();
    (0..registry.define_count())
        .rev()
        .filter(|&slot| registry.permutation_count(slot) > 0)
        .fold(0, |perm, slot| {
            perm * registry.permutation_count(slot) + ctx.selected(slot).unwrap_or(0)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define::implicit::{IMPLICIT_DEFINE_COUNT, READ_SIZE};
    use crate::define::{Define, Override};
    use proptest::prelude::*;

    const N: usize = IMPLICIT_DEFINE_COUNT;

    fn suite() -> Suite {
        Suite::new("suite", "suite.toml").with_defines(&["N"])
    }

    fn collect(
        ctx: &mut DefineContext,
        suite: &Suite,
        case: &Case,
        explicit: Option<&DefineMap>,
    ) -> Vec<i64> {
        let mut values = Vec::new();
        let mut visitor = |ctx: &mut DefineContext, _: &Suite, _: &Case| -> Result<()> {
            values.push(ctx.value(N)?);
            Ok(())
        };
        PermutationEngine::new()
            .for_each_permutation(ctx, suite, case, explicit, &mut visitor)
            .unwrap();
        values
    }

    fn context(suite: &Suite) -> DefineContext {
        let mut ctx = DefineContext::default();
        ctx.registry_mut().install_suite(suite.define_names());
        ctx
    }

    #[test]
    fn test_rows_outermost() {
        let suite = suite();
        let case = Case::new("c", |_| Ok(()))
            .with_row(DefineMap::new().with(N, Define::values(vec![1, 2])))
            .with_row(DefineMap::new().with(N, Define::values(vec![3, 4])));
        let mut ctx = context(&suite);
        assert_eq!(collect(&mut ctx, &suite, &case, None), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_repeated_rows_skipped() {
        let suite = suite();
        let case = Case::new("c", |_| Ok(()))
            .with_row(DefineMap::new().with(N, Define::lit(1)))
            .with_row(DefineMap::new().with(N, Define::lit(1)));
        let mut ctx = context(&suite);
        assert_eq!(collect(&mut ctx, &suite, &case, None), vec![1]);
    }

    #[test]
    fn test_override_collapses_rows() {
        let suite = suite();
        let case = Case::new("c", |_| Ok(()))
            .with_row(DefineMap::new().with(N, Define::lit(1)))
            .with_row(DefineMap::new().with(N, Define::lit(2)));
        let mut ctx = context(&suite);
        ctx.registry_mut()
            .set_overrides(vec![Override::parse("N=5,6").unwrap()])
            .unwrap();
        ctx.registry_mut().install_suite(suite.define_names());
        assert_eq!(collect(&mut ctx, &suite, &case, None), vec![5, 6]);
    }

    #[test]
    fn test_first_permutation_always_runs() {
        // nothing varies, so the only tuple is empty and "already seen"
        let suite = Suite::new("bare", "bare.toml");
        let case = Case::new("c", |_| Ok(()));
        let mut ctx = context(&suite);
        let mut engine = PermutationEngine::new();
        let mut runs = 0;
        let mut visitor = |_: &mut DefineContext, _: &Suite, _: &Case| -> Result<()> {
            runs += 1;
            Ok(())
        };
        engine
            .for_each_permutation(&mut ctx, &suite, &case, None, &mut visitor)
            .unwrap();
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_replay_ignores_rows() {
        let suite = suite();
        let case = Case::new("c", |_| Ok(()))
            .with_row(DefineMap::new().with(N, Define::lit(1)))
            .with_row(DefineMap::new().with(N, Define::lit(2)));
        let explicit = DefineMap::new().with(N, Define::lit(9));
        let mut ctx = context(&suite);
        assert_eq!(collect(&mut ctx, &suite, &case, Some(&explicit)), vec![9]);
        // explicit layer does not leak past the replay
        assert!(!ctx.registry().is_varying(N));
    }

    #[test]
    fn test_empty_explicit_enumerates_rows() {
        let suite = suite();
        let case = Case::new("c", |_| Ok(()))
            .with_row(DefineMap::new().with(N, Define::values(vec![1, 2])));
        let mut ctx = context(&suite);
        assert_eq!(collect(&mut ctx, &suite, &case, Some(&DefineMap::new())), vec![1, 2]);
    }

    #[test]
    fn test_visitor_error_stops() {
        let suite = suite();
        let case = Case::new("c", |_| Ok(()));
        let mut ctx = context(&suite);
        // N is declared but never defined
        let mut visitor = |ctx: &mut DefineContext, _: &Suite, _: &Case| ctx.value(N).map(drop);
        let result = PermutationEngine::new().for_each_permutation(&mut ctx, &suite, &case, None, &mut visitor);
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn prop_selection_is_bijective(a in 1usize..4, b in 1usize..4, c in 1usize..4) {
            let mut ctx = DefineContext::default();
            ctx.registry_mut()
                .set_overrides(vec![
                    Override::parse(&format!("READ_SIZE=range({a})")).unwrap(),
                    Override::parse(&format!("BLOCK_SIZE=range(1,{})", b + 1)).unwrap(),
                    Override::parse(&format!("LOOKAHEAD_SIZE=range({c})")).unwrap(),
                ])
                .unwrap();
            let total = ctx.registry().total_permutation_count();
            prop_assert_eq!(total, a * b * c);

            let mut tuples = std::collections::HashSet::new();
            for perm in 0..total {
                ctx.select_permutation(perm);
                prop_assert_eq!(flat_index(&ctx), perm);
                tuples.insert(varying_values(&mut ctx).unwrap());
            }
            prop_assert_eq!(tuples.len(), total);
        }
    }

    #[test]
    fn test_for_each_suite_order() {
        let suites = [Suite::new("a", "a.toml"), Suite::new("b", "b.toml")];
        let ids = [BenchId::parse("x"), BenchId::parse("y")];
        let mut visits = Vec::new();
        for_each_suite(&mut DefineContext::default(), &suites, &ids, |_, suite, id| {
            visits.push(format!("{}/{}", id.name().unwrap_or("*"), suite.name()));
            Ok(())
        })
        .unwrap();
        assert_eq!(visits, vec!["x/a", "x/b", "y/a", "y/b"]);

        let mut count = 0;
        for_each_suite(&mut DefineContext::default(), &suites, &[], |_, _, id| {
            assert!(id.name().is_none());
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_unvaried_slots_use_placeholder() {
        let mut ctx = DefineContext::default();
        ctx.select_permutation(0);
        assert!(varying_values(&mut ctx).unwrap().iter().all(|&v| v == UNVARIED));
        assert_eq!(ctx.selected(READ_SIZE), Some(0));
    }
}
