// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Summary and listing reports.
//!
//! Reports enumerate permutations exactly as a run would, with the same
//! overrides, bench ids and deduplication, but count or collect instead of
//! executing. Permutation counts are shown as `filtered/total`, where
//! `filtered` excludes permutations the case filter rejects.

use crate::context::DefineContext;
use crate::define::DefineLookup;
use crate::engine::{for_each_suite, PermutationEngine, PermutationVisitor};
use crate::error::Result;
use crate::identity::BenchId;
use crate::runner::RunnerConfig;
use crate::suite::{BenchFlags, Case, Suite};
use std::io::Write;

/// Minimum width of the name column.
const MIN_NAME_WIDTH: usize = 23;

/// Counts permutations with and without the case filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermCount {
    pub filtered: usize,
    pub total: usize,
}

impl PermutationVisitor for PermCount {
    fn visit(&mut self, ctx: &mut DefineContext, _suite: &Suite, case: &Case) -> Result<()> {
        self.total += 1;
        if case.accepts(ctx)? {
            self.filtered += 1;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "count"
    }
}

impl PermCount {
    fn label(&self) -> String {
        format!("{}/{}", self.filtered, self.total)
    }
}

/// Distinct values seen per define name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefineValues {
    defines: Vec<(String, Vec<i64>)>,
}

impl DefineValues {
    pub fn add(&mut self, name: &str, value: i64) {
        match self.defines.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => self.defines.push((name.to_owned(), vec![value])),
        }
    }

    /// Add the current value of `slot`.
    fn add_slot(&mut self, ctx: &mut DefineContext, slot: usize) -> Result<()> {
        let value = ctx.value(slot)?;
        let name = match ctx.registry().name(slot) {
            Some(name) => name.to_owned(),
            None => format!("#{slot}"),
        };
        self.add(&name, value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[i64])> {
        self.defines
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// One `NAME=v1,v2,...` line per define.
    pub fn write(&self, out: &mut dyn Write) -> Result<()> {
        for (name, values) in self.iter() {
            let values: Vec<String> = values.iter().map(i64::to_string).collect();
            writeln!(out, "{name}={}", values.join(","))?;
        }
        Ok(())
    }
}

/// Collects define values from each permutation.
#[derive(Debug, Default)]
struct DefineCollector {
    values: DefineValues,
    implicit: bool,
}

impl PermutationVisitor for DefineCollector {
    fn visit(&mut self, ctx: &mut DefineContext, _suite: &Suite, _case: &Case) -> Result<()> {
        let implicit = ctx.registry().implicit_count();
        for slot in 0..ctx.registry().define_count() {
            if (self.implicit && slot < implicit) || ctx.registry().is_varying(slot) {
                self.values.add_slot(ctx, slot)?;
            }
        }
        Ok(())
    }
}

/// `4*((w+1+3)/4)-1`: the name column plus its trailing space fills whole
/// tab stops.
fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    let width = names.map(str::len).fold(MIN_NAME_WIDTH, usize::max);
    4 * ((width + 1 + 3) / 4) - 1
}

fn suite_name_width(suites: &[Suite]) -> usize {
    name_width(suites.iter().map(Suite::name))
}

fn case_name_width(suites: &[Suite]) -> usize {
    name_width(suites.iter().flat_map(Suite::cases).map(Case::name))
}

/// Count the permutations of the cases of `suite` that `id` selects.
fn count_cases(
    ctx: &mut DefineContext,
    engine: &mut PermutationEngine,
    suite: &Suite,
    id: &BenchId,
    perms: &mut PermCount,
) -> Result<usize> {
    let mut cases = 0;
    for case in suite.cases().iter().filter(|case| id.matches(suite, case)) {
        cases += 1;
        engine.for_each_permutation(ctx, suite, case, id.defines(), perms)?;
    }
    Ok(cases)
}

/// Totals over every selected suite.
///
/// A suite counts, and contributes its flags, only when at least one of its
/// cases is selected. Suites that are visited but match no bench id are left
/// out of the suite total.
pub fn summary(config: &RunnerConfig, suites: &[Suite], out: &mut dyn Write) -> Result<()> {
    let mut ctx = config.context()?;
    let mut engine = PermutationEngine::new();
    let mut perms = PermCount::default();
    let mut flags = BenchFlags::empty();
    let (mut suite_count, mut case_count) = (0, 0);

    for_each_suite(&mut ctx, suites, &config.bench_ids, |ctx, suite, id| {
        let cases = count_cases(ctx, &mut engine, suite, id, &mut perms)?;
        if cases > 0 {
            suite_count += 1;
            case_count += cases;
            flags |= suite.flags();
        }
        Ok(())
    })?;

    writeln!(
        out,
        "{:<w$}  {:>7} {:>7} {:>7} {:>15}",
        "",
        "flags",
        "suites",
        "cases",
        "perms",
        w = MIN_NAME_WIDTH
    )?;
    writeln!(
        out,
        "{:<w$}  {:>7} {:>7} {:>7} {:>15}",
        "TOTAL",
        flags.label(),
        suite_count,
        case_count,
        perms.label(),
        w = MIN_NAME_WIDTH
    )?;
    Ok(())
}

/// One row per selected suite.
pub fn list_suites(config: &RunnerConfig, suites: &[Suite], out: &mut dyn Write) -> Result<()> {
    let width = suite_name_width(suites);
    writeln!(
        out,
        "{:<width$}  {:>7} {:>7} {:>15}",
        "suite", "flags", "cases", "perms"
    )?;

    let mut ctx = config.context()?;
    let mut engine = PermutationEngine::new();
    for_each_suite(&mut ctx, suites, &config.bench_ids, |ctx, suite, id| {
        let mut perms = PermCount::default();
        let cases = count_cases(ctx, &mut engine, suite, id, &mut perms)?;
        if cases > 0 {
            writeln!(
                out,
                "{:<width$}  {:>7} {:>7} {:>15}",
                suite.name(),
                suite.flags().label(),
                cases,
                perms.label()
            )?;
        }
        Ok(())
    })
}

/// One row per selected case.
pub fn list_cases(config: &RunnerConfig, suites: &[Suite], out: &mut dyn Write) -> Result<()> {
    let width = case_name_width(suites);
    writeln!(out, "{:<width$}  {:>7} {:>15}", "case", "flags", "perms")?;

    let mut ctx = config.context()?;
    let mut engine = PermutationEngine::new();
    for_each_suite(&mut ctx, suites, &config.bench_ids, |ctx, suite, id| {
        for case in suite.cases().iter().filter(|case| id.matches(suite, case)) {
            let mut perms = PermCount::default();
            engine.for_each_permutation(ctx, suite, case, id.defines(), &mut perms)?;
            writeln!(
                out,
                "{:<width$}  {:>7} {:>15}",
                case.name(),
                case.flags().label(),
                perms.label()
            )?;
        }
        Ok(())
    })
}

/// Source path of each selected suite.
pub fn list_suite_paths(
    config: &RunnerConfig,
    suites: &[Suite],
    out: &mut dyn Write,
) -> Result<()> {
    let width = suite_name_width(suites);
    writeln!(out, "{:<width$}  path", "suite")?;

    let all = [BenchId::all()];
    let ids = if config.bench_ids.is_empty() { &all[..] } else { &config.bench_ids[..] };
    for id in ids {
        for suite in suites.iter().filter(|suite| id.matches_any(suite)) {
            writeln!(out, "{:<width$}  {}", suite.name(), suite.path())?;
        }
    }
    Ok(())
}

/// Source path of each selected case.
pub fn list_case_paths(
    config: &RunnerConfig,
    suites: &[Suite],
    out: &mut dyn Write,
) -> Result<()> {
    let width = case_name_width(suites);
    writeln!(out, "{:<width$}  path", "case")?;

    let all = [BenchId::all()];
    let ids = if config.bench_ids.is_empty() { &all[..] } else { &config.bench_ids[..] };
    for id in ids {
        for suite in suites {
            for case in suite.cases().iter().filter(|case| id.matches(suite, case)) {
                writeln!(out, "{:<width$}  {}", case.name(), case.path())?;
            }
        }
    }
    Ok(())
}

fn collect_defines(
    config: &RunnerConfig,
    suites: &[Suite],
    implicit: bool,
) -> Result<DefineValues> {
    let mut ctx = config.context()?;
    let mut engine = PermutationEngine::new();
    let mut collector = DefineCollector {
        implicit,
        ..DefineCollector::default()
    };
    for_each_suite(&mut ctx, suites, &config.bench_ids, |ctx, suite, id| {
        for case in suite.cases().iter().filter(|case| id.matches(suite, case)) {
            engine.for_each_permutation(ctx, suite, case, id.defines(), &mut collector)?;
        }
        Ok(())
    })?;
    Ok(collector.values)
}

/// Every implicit define and every varying define, with the values used.
pub fn list_defines(config: &RunnerConfig, suites: &[Suite], out: &mut dyn Write) -> Result<()> {
    collect_defines(config, suites, true)?.write(out)
}

/// Only the varying defines, with the values used.
pub fn list_permutation_defines(
    config: &RunnerConfig,
    suites: &[Suite],
    out: &mut dyn Write,
) -> Result<()> {
    collect_defines(config, suites, false)?.write(out)
}

/// The implicit defines as they resolve with no suite installed.
///
/// Overrides still apply.
pub fn list_implicit_defines(config: &RunnerConfig, out: &mut dyn Write) -> Result<()> {
    let mut ctx = config.context()?;
    ctx.registry_mut().install_suite(&[]);
    ctx.select_permutation(0);

    let mut values = DefineValues::default();
    for slot in 0..ctx.registry().implicit_count() {
        values.add_slot(&mut ctx, slot)?;
    }
    values.write(out)
}
