// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use bench_runner::context::DefineContext;
use bench_runner::define::implicit::IMPLICIT_DEFINE_COUNT;
use bench_runner::identity::identity;
use bench_runner::runner::{run, RunnerConfig};
use bench_runner::suite::{Case, Suite};
use bench_runner::{PermutationEngine, Result};

/// First suite-specific slot.
pub const X: usize = IMPLICIT_DEFINE_COUNT;

/// Second suite-specific slot.
pub const Y: usize = IMPLICIT_DEFINE_COUNT + 1;

/// A suite named `suite` declaring `X` and `Y`, holding `cases`.
pub fn suite_with(cases: Vec<Case>) -> Suite {
    cases.into_iter().fold(
        Suite::new("suite", "benches/suite.toml").with_defines(&["X", "Y"]),
        Suite::with_case,
    )
}

/// A case that does nothing.
pub fn noop(name: &str) -> Case {
    Case::new(name, |_| Ok(()))
}

/// Context with `suite` installed and `overrides` applied.
pub fn context(suite: &Suite, overrides: &[&str]) -> DefineContext {
    let config = config(overrides);
    let mut ctx = config.context().expect("overrides should install");
    ctx.registry_mut().install_suite(suite.define_names());
    ctx
}

/// Runner configuration with `overrides`.
pub fn config(overrides: &[&str]) -> RunnerConfig {
    RunnerConfig {
        overrides: overrides
            .iter()
            .map(|o| bench_runner::define::Override::parse(o))
            .collect::<Result<Vec<_>>>()
            .expect("overrides should parse"),
        ..RunnerConfig::default()
    }
}

/// Identities of every permutation the engine yields for the first case.
pub fn identities(suite: &Suite, overrides: &[&str]) -> Vec<String> {
    let mut ctx = context(suite, overrides);
    let case = &suite.cases()[0];
    let mut ids = Vec::new();
    let mut visitor = |ctx: &mut DefineContext, _: &Suite, case: &Case| -> Result<()> {
        ids.push(identity(case.name(), ctx)?);
        Ok(())
    };
    PermutationEngine::new()
        .for_each_permutation(&mut ctx, suite, case, None, &mut visitor)
        .expect("enumeration should succeed");
    ids
}

/// Stdout of a run.
pub fn run_output(config: &RunnerConfig, suites: &[Suite]) -> String {
    let mut out = Vec::new();
    run(config, suites, &mut out).expect("run should succeed");
    String::from_utf8(out).expect("output is utf-8")
}
