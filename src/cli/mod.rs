// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Command-line front end.
//!
//! [`Cli`] is the raw clap schema. [`Cli::into_config`] validates it into a
//! [`RunnerConfig`]; every malformed override, step or trace option is
//! reported there, before anything is enumerated.

use crate::define::Override;
use crate::error::{BenchError, Result};
use crate::identity::BenchId;
use crate::runner::{parse_unsigned, Op, RunnerConfig, StepRange};
use crate::trace::TraceConfig;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Run parameterized bench cases over every permutation of their defines.
#[derive(Parser, Debug, Default)]
#[command(name = "bench-runner", version)]
#[command(group(ArgGroup::new("op").multiple(false)))]
pub struct Cli {
    /// Show a quick summary.
    #[arg(short = 'Y', long, group = "op")]
    pub summary: bool,

    /// List bench suites.
    #[arg(short = 'l', long, group = "op")]
    pub list_suites: bool,

    /// List bench cases.
    #[arg(short = 'L', long, group = "op")]
    pub list_cases: bool,

    /// List the path for each bench suite.
    #[arg(long, group = "op")]
    pub list_suite_paths: bool,

    /// List the path and line number for each bench case.
    #[arg(long, group = "op")]
    pub list_case_paths: bool,

    /// List all defines in this bench-runner.
    #[arg(long, group = "op")]
    pub list_defines: bool,

    /// List explicit defines in this bench-runner.
    #[arg(long, group = "op")]
    pub list_permutation_defines: bool,

    /// List implicit defines in this bench-runner.
    #[arg(long, group = "op")]
    pub list_implicit_defines: bool,

    /// Override a bench define, e.g. `-D BLOCK_SIZE=512,range(1024,4097,1024)`.
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUES")]
    pub defines: Vec<String>,

    /// Comma-separated range of bench permutations to run (start,stop,step).
    #[arg(short = 's', long, value_name = "RANGE")]
    pub step: Option<String>,

    /// Direct trace output to this file, `-` for stdout.
    #[arg(short = 't', long, value_name = "PATH")]
    pub trace: Option<PathBuf>,

    /// Include a backtrace with every trace statement.
    #[arg(long)]
    pub trace_backtrace: bool,

    /// Sample trace output at this period in cycles.
    #[arg(long, value_name = "CYCLES")]
    pub trace_period: Option<String>,

    /// Sample trace output at this frequency in hz.
    #[arg(long, value_name = "HZ")]
    pub trace_freq: Option<String>,

    /// Suite or case names, optionally with a permutation identity
    /// (`name:identity`) to replay.
    #[arg(value_name = "BENCH_ID")]
    pub bench_ids: Vec<String>,
}

impl Cli {
    fn op(&self) -> Op {
        [
            (self.summary, Op::Summary),
            (self.list_suites, Op::ListSuites),
            (self.list_cases, Op::ListCases),
            (self.list_suite_paths, Op::ListSuitePaths),
            (self.list_case_paths, Op::ListCasePaths),
            (self.list_defines, Op::ListDefines),
            (self.list_permutation_defines, Op::ListPermutationDefines),
            (self.list_implicit_defines, Op::ListImplicitDefines),
        ]
        .into_iter()
        .find_map(|(set, op)| set.then_some(op))
        .unwrap_or_default()
    }

    /// Validate into a runner configuration.
    pub fn into_config(self) -> Result<RunnerConfig> {
        let op = self.op();
        let overrides = self
            .defines
            .iter()
            .map(|define| Override::parse(define))
            .collect::<Result<Vec<_>>>()?;
        let step = self
            .step
            .as_deref()
            .map(StepRange::parse)
            .transpose()?
            .unwrap_or_default();
        let trace = TraceConfig {
            path: self.trace,
            backtrace: self.trace_backtrace,
            period: sample_option("trace-period", self.trace_period.as_deref())?,
            freq: sample_option("trace-freq", self.trace_freq.as_deref())?,
        };
        let bench_ids = self.bench_ids.iter().map(|id| BenchId::parse(id)).collect();

        Ok(RunnerConfig {
            op,
            overrides,
            bench_ids,
            step,
            trace,
        })
    }
}

fn sample_option(option: &'static str, value: Option<&str>) -> Result<u32> {
    let Some(value) = value else {
        return Ok(0);
    };
    parse_unsigned(value.trim())
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| BenchError::InvalidOption {
            option,
            value: value.to_owned(),
        })
}
