// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Parameterized bench runner.
//!
//! Bench cases read their configuration from numbered *defines*: sixteen
//! implicit storage parameters (`READ_SIZE`, `BLOCK_SIZE`, ...) followed by
//! each suite's own names. A case runs once for every permutation of the
//! defines it varies, and each run is labelled with a compact identity that
//! can be passed back to replay exactly that permutation.
//!
//! # Architecture
//!
//! ## Layered Resolution
//!
//! Each slot is resolved through four layers, highest priority first:
//!
//! 1. **Override**: `-D NAME=VALUES` from the command line, mapped by name
//! 2. **Explicit**: decoded from a replay identity
//! 3. **Case**: the static row of the case being enumerated
//! 4. **Implicit**: built-in defaults, which may derive from each other
//!
//! A slot owned by any layer but the implicit one is *varying*. Only varying
//! slots appear in identities and deduplication keys.
//!
//! ## Lazy Evaluation
//!
//! [`DefineContext`] decomposes a flat permutation index in mixed radix over
//! the owned slots (slot 0 least significant) and evaluates each slot on
//! first read. Defines read each other through [`DefineLookup`], in whatever
//! order they need.
//!
//! ## Enumeration
//!
//! [`PermutationEngine`] walks rows outermost and flat indices innermost,
//! skipping permutations whose varying values repeat an earlier one, and
//! hands each to a [`PermutationVisitor`]. Running, counting and listing are
//! all visitors.
//!
//! # Output
//!
//! ```text
//! running bench_file_write:g1ggg1h11
//! benched write 0 4096 0 4096 4096
//! finished bench_file_write:g1ggg1h11
//! ```
//!
//! Identities are `case:` followed by [`leb16`](identity::leb16) encoded
//! `(slot, value)` pairs.

pub mod cli;
pub mod context;
pub mod define;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod identity;
pub mod measure;
pub mod registry;
pub mod report;
pub mod runner;
pub mod seen;
pub mod suite;
pub mod trace;

// Re-export commonly used types
pub use context::DefineContext;
pub use define::{Define, DefineLookup, DefineMap};
pub use engine::{PermutationEngine, PermutationVisitor};
pub use error::{BenchError, Result};
pub use runner::{RunContext, RunnerConfig};
pub use suite::{Case, Suite};
