// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Compact reversible identities for single permutations.
//!
//! An identity names exactly one permutation of one case:
//!
//! ```text
//! <case>:<slot><value><slot><value>...
//! ```
//!
//! Each slot index and value is a [`leb16`] integer. Only varying slots
//! appear, in increasing slot order, so a permutation that varies nothing
//! is just `case:`.
//!
//! Decoding an identity yields a [`DefineMap`] of literal defines. Installed
//! as the explicit layer, it replays that one permutation.
//!
//! # Example
//!
//! ```
//! use bench_runner::define::DefineLookup;
//! use bench_runner::identity::{decode_identity, encode};
//!
//! let text = format!("{}{}", encode(16), encode(-3));
//! let defines = decode_identity(&text);
//! assert_eq!(defines.len(), 32);
//! assert!(defines.get(16).is_some());
//! ```

pub mod leb16;

pub use leb16::{decode, encode, encode_into};

use crate::context::DefineContext;
use crate::define::{Define, DefineLookup, DefineMap};
use crate::error::Result;
use crate::suite::{Case, Suite};
use tracing::debug;

/// Highest slot index accepted while decoding an identity.
pub const MAX_DECODED_SLOT: i64 = u16::MAX as i64;

/// Render the identity of the permutation selected in `ctx`.
///
/// Evaluates every varying slot.
pub fn identity(case_name: &str, ctx: &mut DefineContext) -> Result<String> {
    let mut text = String::with_capacity(case_name.len() + 1);
    text.push_str(case_name);
    text.push(':');
    append_defines(&mut text, ctx)?;
    Ok(text)
}

/// Append `(slot, value)` pairs for every varying slot of `ctx`.
pub fn append_defines(text: &mut String, ctx: &mut DefineContext) -> Result<()> {
    for slot in 0..ctx.registry().define_count() {
        if ctx.registry().is_varying(slot) {
            let value = ctx.value(slot)?;
            encode_into(slot as i64, text);
            encode_into(value, text);
        }
    }
    Ok(())
}

/// Decode the define part of an identity into a layer of literals.
///
/// Decoding stops silently at the first pair that does not parse, keeping
/// every pair before it. The returned map is sized to a power of two that
/// covers the largest decoded slot.
pub fn decode_identity(text: &str) -> DefineMap {
    let mut defines = DefineMap::new();
    let mut rest = text;

    while !rest.is_empty() {
        let (slot, tail) = decode(rest);
        if tail.len() == rest.len() || !(0..=MAX_DECODED_SLOT).contains(&slot) {
            break;
        }
        let (value, tail2) = decode(tail);
        if tail2.len() == tail.len() {
            break;
        }

        let slot = slot as usize;
        defines.grow((slot + 1).next_power_of_two());
        defines.set(slot, Define::lit(value));
        rest = tail2;
    }

    if !rest.is_empty() {
        debug!(unparsed = rest, "ignoring trailing identity text");
    }
    defines
}

/// A bench selection from the command line: `[path/]name[.toml][:defines]`.
#[derive(Debug, Clone, Default)]
pub struct BenchId {
    /// Suite or case name; `None` matches everything.
    name: Option<String>,

    /// Decoded explicit layer, if a define part was given.
    defines: Option<DefineMap>,
}

impl BenchId {
    /// Select every case of every suite.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a bench id.
    ///
    /// Any leading directory and a `.toml` suffix are stripped from the
    /// name, so a suite's source path can be passed directly. A define
    /// suffix that decodes to no pairs selects the case's rows as if it
    /// were absent.
    pub fn parse(text: &str) -> Self {
        let (name, defines) = match text.split_once(':') {
            Some((name, defines)) => (name, Some(decode_identity(defines))),
            None => (text, None),
        };
        let defines = defines.filter(|defines| !defines.is_empty());
        let name = name.rsplit_once('/').map_or(name, |(_, base)| base);
        let name = name.strip_suffix(".toml").unwrap_or(name);

        Self {
            name: Some(name.to_owned()),
            defines,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Explicit layer to replay instead of enumerating rows.
    pub fn defines(&self) -> Option<&DefineMap> {
        self.defines.as_ref()
    }

    /// Does this id select the suite as a whole?
    pub fn matches_suite(&self, suite: &Suite) -> bool {
        self.name.as_deref().map_or(true, |name| name == suite.name())
    }

    /// Does this id select `case` of `suite`?
    ///
    /// A suite name selects all of its cases.
    pub fn matches(&self, suite: &Suite, case: &Case) -> bool {
        self.matches_suite(suite) || self.name.as_deref() == Some(case.name())
    }

    /// Does this id select any case of `suite`?
    pub fn matches_any(&self, suite: &Suite) -> bool {
        suite.cases().iter().any(|case| self.matches(suite, case))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define::implicit::READ_SIZE;
    use crate::define::Override;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identity_without_varying_slots() {
        let mut ctx = DefineContext::default();
        ctx.select_permutation(0);
        assert_eq!(identity("case", &mut ctx).unwrap(), "case:");
    }

    #[test]
    fn test_identity_with_override() {
        let mut ctx = DefineContext::default();
        ctx.registry_mut()
            .set_overrides(vec![Override::parse("READ_SIZE=range(0,3)").unwrap()])
            .unwrap();
        let ids: Vec<String> = (0..3)
            .map(|perm| {
                ctx.select_permutation(perm);
                identity("case", &mut ctx).unwrap()
            })
            .collect();
        assert_eq!(ids, vec!["case:00", "case:01", "case:02"]);
    }

    #[test]
    fn test_decode_round_trip() {
        let mut ctx = DefineContext::default();
        ctx.registry_mut()
            .set_overrides(vec![Override::parse("READ_SIZE=-70000").unwrap()])
            .unwrap();
        ctx.select_permutation(0);
        let text = identity("case", &mut ctx).unwrap();
        let (_, defines) = text.split_once(':').unwrap();

        let explicit = decode_identity(defines);
        let mut replay = DefineContext::default();
        replay.registry_mut().set_explicit(explicit);
        replay.select_permutation(0);
        assert_eq!(replay.value(READ_SIZE).unwrap(), -70000);
    }

    #[test]
    fn test_decode_stops_at_garbage() {
        let text = format!("{}{}{}xyz", encode(17), encode(5), encode(18));
        let defines = decode_identity(&text);
        assert!(defines.get(17).is_some());
        assert!(defines.get(18).is_none());
        assert_eq!(defines.len(), 32);
    }

    #[test]
    fn test_decode_rejects_negative_slot() {
        let text = format!("{}{}", encode(-1), encode(5));
        assert!(decode_identity(&text).is_empty());
    }

    #[test]
    fn test_bench_id_strips_path() {
        let id = BenchId::parse("benches/bench_alloc.toml");
        assert_eq!(id.name(), Some("bench_alloc"));
        assert!(id.defines().is_none());

        let id = BenchId::parse("bench_alloc_many:");
        assert_eq!(id.name(), Some("bench_alloc_many"));
        assert!(id.defines().is_none());
    }

    #[test]
    fn test_bench_id_without_pairs_enumerates_rows() {
        // nothing decodes, so there is no explicit layer to replay
        assert!(BenchId::parse("bench_alloc_many:zz").defines().is_none());
        assert!(BenchId::parse("bench_alloc_many:w").defines().is_none());
        assert!(BenchId::parse("bench_alloc_many:g1").defines().is_none());

        let id = BenchId::parse("bench_alloc_many:g11");
        assert!(id.defines().is_some_and(|defines| defines.get(16).is_some()));
    }

    #[test]
    fn test_bench_id_matches() {
        let suite = Suite::new("bench_alloc", "benches/bench_alloc.toml")
            .with_case(Case::new("bench_alloc_one", |_| Ok(())))
            .with_case(Case::new("bench_alloc_two", |_| Ok(())));
        let one = &suite.cases()[0];
        let two = &suite.cases()[1];

        assert!(BenchId::all().matches(&suite, one));
        assert!(BenchId::parse("bench_alloc").matches(&suite, two));
        assert!(BenchId::parse("bench_alloc_one").matches(&suite, one));
        assert!(!BenchId::parse("bench_alloc_one").matches(&suite, two));
        assert!(!BenchId::parse("bench_other").matches_any(&suite));
    }
}
