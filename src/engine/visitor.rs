// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Visitor trait for enumerated permutations.
//!
//! The [`PermutationEngine`](super::PermutationEngine) selects each
//! permutation of a case and hands the resolved context to a visitor.
//! Running, counting and listing are all visitors over the same
//! enumeration, so they agree on which permutations exist.
//!
//! # Example
//!
//! ```
//! use bench_runner::context::DefineContext;
//! use bench_runner::engine::PermutationVisitor;
//! use bench_runner::error::Result;
//! use bench_runner::suite::{Case, Suite};
//!
//! #[derive(Debug, Default)]
//! struct Count(usize);
//!
//! impl PermutationVisitor for Count {
//!     fn visit(&mut self, _ctx: &mut DefineContext, _suite: &Suite, _case: &Case) -> Result<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//! ```

use crate::context::DefineContext;
use crate::error::Result;
use crate::suite::{Case, Suite};

/// Receives each permutation the engine yields.
///
/// # Lifecycle
///
/// 1. The engine installs the case's row (or the explicit layer)
/// 2. It selects a flat permutation index on the context
/// 3. Unless the permutation repeats an earlier one, it calls `visit`
///
/// The context is only valid for the duration of the call. Visitors must not
/// start another enumeration from inside `visit`.
pub trait PermutationVisitor {
    /// Handle the permutation currently selected in `ctx`.
    ///
    /// Returning an error stops the enumeration.
    fn visit(&mut self, ctx: &mut DefineContext, suite: &Suite, case: &Case) -> Result<()>;

    /// Optional: a name for this visitor (for logging).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> PermutationVisitor for F
where
    F: FnMut(&mut DefineContext, &Suite, &Case) -> Result<()>,
{
    fn visit(&mut self, ctx: &mut DefineContext, suite: &Suite, case: &Case) -> Result<()> {
        self(ctx, suite, case)
    }
}
