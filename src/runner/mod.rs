// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The run operation.
//!
//! Every permutation the engine yields advances one global step counter,
//! across all bench ids, suites and cases. Only steps inside the configured
//! [`StepRange`] execute, which lets a long run be split into shards or
//! resumed part way:
//!
//! ```text
//! skipped  <identity>     case filter rejected this permutation
//! running  <identity>     before the case body
//! finished <identity>     after the case body
//! ```
//!
//! Any `benched` lines a case prints appear between its `running` and
//! `finished` lines. Steps outside the range print nothing.

use crate::context::DefineContext;
use crate::define::{BenchConfig, DefineLookup, Override};
use crate::engine::{for_each_suite, PermutationEngine, PermutationVisitor};
use crate::error::{BenchError, Result};
use crate::identity::{identity, BenchId};
use crate::measure::{CountingDevice, Meter};
use crate::report;
use crate::suite::{Case, Suite};
use crate::trace::{TraceConfig, Tracer};
use std::fmt;
use std::io::Write;
use tracing::{debug, info, trace};

/// What the runner should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    #[default]
    Run,
    Summary,
    ListSuites,
    ListCases,
    ListSuitePaths,
    ListCasePaths,
    ListDefines,
    ListPermutationDefines,
    ListImplicitDefines,
}

/// Validated runner configuration.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    pub op: Op,
    pub overrides: Vec<Override>,
    /// Empty selects everything.
    pub bench_ids: Vec<BenchId>,
    pub step: StepRange,
    pub trace: TraceConfig,
}

impl RunnerConfig {
    /// A fresh define context with this configuration's overrides.
    pub fn context(&self) -> Result<DefineContext> {
        let mut ctx = DefineContext::default();
        ctx.registry_mut().set_overrides(self.overrides.clone())?;
        Ok(ctx)
    }
}

/// Selection of global steps: `start..stop` every `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl Default for StepRange {
    fn default() -> Self {
        Self {
            start: 0,
            stop: usize::MAX,
            step: 1,
        }
    }
}

impl StepRange {
    /// Parse `stop` or `start,stop[,step]`.
    ///
    /// Empty fields take their defaults: start 0, stop unbounded, step 1.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || BenchError::InvalidStep(s.to_owned());
        let field = |text: &str, default: usize| -> Result<usize> {
            let text = text.trim_matches(' ');
            if text.is_empty() {
                return Ok(default);
            }
            parse_unsigned(text).ok_or_else(invalid)
        };

        let fields: Vec<&str> = s.split(',').collect();
        let range = match fields[..] {
            [stop] => Self {
                stop: field(stop, usize::MAX)?,
                ..Self::default()
            },
            [start, stop] => Self {
                start: field(start, 0)?,
                stop: field(stop, usize::MAX)?,
                ..Self::default()
            },
            [start, stop, step] => Self {
                start: field(start, 0)?,
                stop: field(stop, usize::MAX)?,
                step: field(step, 1)?,
            },
            _ => return Err(invalid()),
        };

        if range.step == 0 {
            return Err(invalid());
        }
        Ok(range)
    }

    pub fn contains(&self, step: usize) -> bool {
        step >= self.start && step < self.stop && (step - self.start) % self.step == 0
    }
}

/// Parse a non-negative integer with an optional `0x` or `0` prefix.
pub(crate) fn parse_unsigned(text: &str) -> Option<usize> {
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        usize::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        usize::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

/// What a running case can see and do.
pub struct RunContext<'a> {
    defines: &'a mut DefineContext,
    meter: &'a mut Meter,
    device: &'a mut CountingDevice,
    tracer: &'a mut Tracer,
    out: &'a mut dyn Write,
}

impl<'a> RunContext<'a> {
    /// Value of define `slot` for this permutation.
    pub fn define(&mut self, slot: usize) -> Result<i64> {
        self.defines.value(slot)
    }

    /// Storage configuration for this permutation.
    pub fn config(&mut self) -> Result<BenchConfig> {
        BenchConfig::resolve(&mut *self.defines)
    }

    /// The define context, e.g. to render this permutation's identity.
    pub fn defines(&mut self) -> &mut DefineContext {
        &mut *self.defines
    }

    pub fn device(&self) -> &CountingDevice {
        &*self.device
    }

    /// The counters measured by [`start`](Self::start) and
    /// [`stop`](Self::stop).
    pub fn device_mut(&mut self) -> &mut CountingDevice {
        &mut *self.device
    }

    pub fn start(&mut self, meas: &str, iter: u64, size: u64) {
        self.meter.start(meas, iter, size, &*self.device);
    }

    pub fn stop(&mut self, meas: &str) -> Result<()> {
        self.meter.stop(meas, &*self.device, &mut *self.out)
    }

    pub fn result(&mut self, meas: &str, iter: u64, size: u64, result: u64) -> Result<()> {
        self.meter.result(&mut *self.out, meas, iter, size, result)
    }

    pub fn fresult(&mut self, meas: &str, iter: u64, size: u64, result: f64) -> Result<()> {
        self.meter.fresult(&mut *self.out, meas, iter, size, result)
    }

    /// Emit a trace line, if tracing is enabled.
    pub fn trace(&mut self, args: fmt::Arguments<'_>) {
        self.tracer.trace(args);
    }
}

impl DefineLookup for RunContext<'_> {
    fn value(&mut self, slot: usize) -> Result<i64> {
        self.define(slot)
    }
}

/// Counts from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Permutations yielded, selected or not.
    pub steps: usize,
    /// Cases run to completion.
    pub finished: usize,
    /// Selected permutations the case filter rejected.
    pub skipped: usize,
}

/// Visitor that executes selected permutations.
pub struct RunVisitor<'a> {
    out: &'a mut dyn Write,
    range: StepRange,
    meter: Meter,
    device: CountingDevice,
    tracer: Tracer,
    stats: RunStats,
}

impl<'a> RunVisitor<'a> {
    pub fn new(out: &'a mut dyn Write, range: StepRange, tracer: Tracer) -> Self {
        Self {
            out,
            range,
            meter: Meter::new(),
            device: CountingDevice::new(),
            tracer,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }
}

impl PermutationVisitor for RunVisitor<'_> {
    fn visit(&mut self, ctx: &mut DefineContext, _suite: &Suite, case: &Case) -> Result<()> {
        let step = self.stats.steps;
        self.stats.steps += 1;
        if !self.range.contains(step) {
            trace!(step, "step not selected");
            return Ok(());
        }

        let id = identity(case.name(), ctx)?;
        if !case.accepts(ctx)? {
            self.stats.skipped += 1;
            writeln!(self.out, "skipped {id}")?;
            return Ok(());
        }

        self.meter.reset();
        self.device = CountingDevice::new();
        writeln!(self.out, "running {id}")?;
        self.out.flush()?;

        let mut run = RunContext {
            defines: ctx,
            meter: &mut self.meter,
            device: &mut self.device,
            tracer: &mut self.tracer,
            out: &mut *self.out,
        };
        case.run(&mut run)?;

        if self.meter.open() > 0 {
            debug!(case = case.name(), open = self.meter.open(), "measurements left open");
        }
        self.stats.finished += 1;
        writeln!(self.out, "finished {id}")?;
        self.out.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "run"
    }
}

/// Run every selected permutation of every selected case.
pub fn run(config: &RunnerConfig, suites: &[Suite], out: &mut dyn Write) -> Result<RunStats> {
    let mut ctx = config.context()?;
    let mut engine = PermutationEngine::new();
    let mut visitor = RunVisitor::new(out, config.step, Tracer::new(config.trace.clone()));

    for_each_suite(&mut ctx, suites, &config.bench_ids, |ctx, suite, id| {
        for case in suite.cases().iter().filter(|case| id.matches(suite, case)) {
            engine.for_each_permutation(ctx, suite, case, id.defines(), &mut visitor)?;
        }
        Ok(())
    })?;

    let (yielded, deduplicated) = engine.statistics();
    let stats = visitor.stats();
    info!(
        yielded,
        deduplicated,
        finished = stats.finished,
        skipped = stats.skipped,
        "run complete"
    );
    Ok(stats)
}

/// Perform the configured operation.
pub fn execute(config: &RunnerConfig, suites: &[Suite], out: &mut dyn Write) -> Result<()> {
    debug!(op = ?config.op, suites = suites.len(), "executing");
    match config.op {
        Op::Run => run(config, suites, out).map(drop),
        Op::Summary => report::summary(config, suites, out),
        Op::ListSuites => report::list_suites(config, suites, out),
        Op::ListCases => report::list_cases(config, suites, out),
        Op::ListSuitePaths => report::list_suite_paths(config, suites, out),
        Op::ListCasePaths => report::list_case_paths(config, suites, out),
        Op::ListDefines => report::list_defines(config, suites, out),
        Op::ListPermutationDefines => report::list_permutation_defines(config, suites, out),
        Op::ListImplicitDefines => report::list_implicit_defines(config, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define::{Define, DefineMap};
    use pretty_assertions::assert_eq;

    const N: usize = crate::define::implicit::IMPLICIT_DEFINE_COUNT;

    fn suites() -> Vec<Suite> {
        vec![Suite::new("bench_sum", "benches/bench_sum.toml")
            .with_defines(&["N"])
            .with_case(
                Case::new("bench_sum_range", |ctx| {
                    let n = ctx.define(N)? as u64;
                    ctx.result("sum", 0, n, (0..n).sum())
                })
                .with_slot(N, Define::values(vec![1, 2, 3])),
            )]
    }

    fn run_text(config: &RunnerConfig, suites: &[Suite]) -> String {
        let mut out = Vec::new();
        run(config, suites, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_step_parse() {
        assert_eq!(
            StepRange::parse("5").unwrap(),
            StepRange {
                start: 0,
                stop: 5,
                step: 1
            }
        );
        assert_eq!(
            StepRange::parse("2,").unwrap(),
            StepRange {
                start: 2,
                ..StepRange::default()
            }
        );
        assert_eq!(
            StepRange::parse(" 1 , 0x10 , 3").unwrap(),
            StepRange {
                start: 1,
                stop: 16,
                step: 3
            }
        );
        assert_eq!(StepRange::parse(",,").unwrap(), StepRange::default());
        assert!(StepRange::parse("1,2,3,4").is_err());
        assert!(StepRange::parse("x").is_err());
        assert!(StepRange::parse("0,10,0").is_err());
    }

    #[test]
    fn test_step_contains() {
        let range = StepRange {
            start: 2,
            stop: 9,
            step: 3,
        };
        let selected: Vec<usize> = (0..12).filter(|&s| range.contains(s)).collect();
        assert_eq!(selected, vec![2, 5, 8]);
    }

    #[test]
    fn test_run_prints_lines() {
        let text = run_text(&RunnerConfig::default(), &suites());
        assert_eq!(
            text,
            "running bench_sum_range:g11\n\
             benched sum 0 1 0\n\
             finished bench_sum_range:g11\n\
             running bench_sum_range:g12\n\
             benched sum 0 2 1\n\
             finished bench_sum_range:g12\n\
             running bench_sum_range:g13\n\
             benched sum 0 3 3\n\
             finished bench_sum_range:g13\n"
        );
    }

    #[test]
    fn test_step_filter_counts_every_permutation() {
        let config = RunnerConfig {
            step: StepRange::parse("1,3").unwrap(),
            ..RunnerConfig::default()
        };
        let mut out = Vec::new();
        let stats = run(&config, &suites(), &mut out).unwrap();
        assert_eq!(stats.steps, 3);
        assert_eq!(stats.finished, 2);
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("g11\n"));
        assert!(text.contains("finished bench_sum_range:g12\n"));
        assert!(text.contains("finished bench_sum_range:g13\n"));
    }

    #[test]
    fn test_filter_prints_skipped() {
        let suites = vec![Suite::new("s", "s.toml").with_defines(&["N"]).with_case(
            Case::new("odd", |_| Ok(()))
                .with_slot(N, Define::values(vec![1, 2]))
                .with_filter(|defines| Ok(defines.value(N)? % 2 == 1)),
        )];
        let text = run_text(&RunnerConfig::default(), &suites);
        assert_eq!(
            text,
            "running odd:g11\nfinished odd:g11\nskipped odd:g12\n"
        );
    }

    #[test]
    fn test_replay_runs_one_permutation() {
        let config = RunnerConfig {
            bench_ids: vec![BenchId::parse("bench_sum_range:g13")],
            ..RunnerConfig::default()
        };
        let text = run_text(&config, &suites());
        assert_eq!(
            text,
            "running bench_sum_range:g13\nbenched sum 0 3 3\nfinished bench_sum_range:g13\n"
        );
    }

    #[test]
    fn test_measurement_through_context() {
        let suites = vec![Suite::new("io", "io.toml").with_case(Case::new("io_write", |ctx| {
            ctx.start("write", 0, 512);
            ctx.device_mut().record_prog(512);
            ctx.device_mut().record_erase(4096);
            ctx.stop("write")
        }))];
        let text = run_text(&RunnerConfig::default(), &suites);
        assert_eq!(
            text,
            "running io_write:\nbenched write 0 512 0 512 4096\nfinished io_write:\n"
        );
    }

    #[test]
    fn test_case_error_propagates() {
        let suites = vec![Suite::new("bad", "bad.toml")
            .with_defines(&["N"])
            .with_case(Case::new("bad_read", |ctx| ctx.define(N).map(drop)))];
        let err = run(&RunnerConfig::default(), &suites, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "undefined define N (16)");
    }

    #[test]
    fn test_unused_row_slots_do_not_split() {
        let mut row = DefineMap::new();
        row.set(N, Define::lit(7));
        let suites = vec![Suite::new("s", "s.toml")
            .with_defines(&["N"])
            .with_case(Case::new("c", |_| Ok(())).with_row(row.clone()).with_row(row))];
        let mut out = Vec::new();
        let stats = run(&RunnerConfig::default(), &suites, &mut out).unwrap();
        assert_eq!(stats.finished, 1);
    }
}
