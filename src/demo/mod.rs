// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Built-in bench suites for the `bench-runner` binary.

use bench_runner::define::implicit::IMPLICIT_DEFINE_COUNT;
use bench_runner::helpers::{factorial, permutation, prng};
use bench_runner::suite::{BenchFlags, Case, Suite};
use bench_runner::{Define, DefineLookup, DefineMap};

const SEED: usize = IMPLICIT_DEFINE_COUNT;
const N: usize = IMPLICIT_DEFINE_COUNT + 1;
const ORDER: usize = IMPLICIT_DEFINE_COUNT + 2;

pub fn suites() -> Vec<Suite> {
    vec![prng_suite(), permutation_suite(), config_suite()]
}

fn prng_suite() -> Suite {
    Suite::new("bench_prng", "benches/bench_prng.toml")
        .with_defines(&["SEED", "N"])
        .with_case(
            Case::new("bench_prng_stream", |ctx| {
                let mut state = ctx.define(SEED)? as u32;
                let n = ctx.define(N)? as u64;
                let mut acc = 0u32;
                ctx.start("stream", 0, n);
                for _ in 0..n {
                    acc ^= prng(&mut state);
                    ctx.device_mut().record_read(4);
                }
                ctx.stop("stream")?;
                ctx.trace(format_args!("bench_prng_stream: acc={acc:08x}"));
                ctx.result("xor", 0, n, u64::from(acc))
            })
            .with_path("benches/bench_prng.toml:1")
            .with_row(
                DefineMap::new()
                    .with(SEED, Define::values(vec![0, 1, 42]))
                    .with(N, Define::values(vec![16, 1024])),
            )
            .with_row(
                // N derived from SEED; SEED=1 repeats a row 0 permutation
                DefineMap::new()
                    .with(SEED, Define::values(vec![1, 2]))
                    .with(
                        N,
                        Define::new(1, |defines, _| Ok(if defines.value(SEED)? == 1 { 16 } else { 64 })),
                    ),
            ),
        )
}

fn permutation_suite() -> Suite {
    Suite::new("bench_permutation", "benches/bench_permutation.toml")
        .with_defines(&["SEED", "N", "ORDER"])
        .with_case(
            Case::new("bench_permutation_inversions", |ctx| {
                let n = ctx.define(N)? as usize;
                let order = ctx.define(ORDER)? as usize % factorial(n);
                let mut buffer = vec![0u32; n];
                ctx.start("permute", order as u64, n as u64);
                permutation(order, &mut buffer);
                ctx.device_mut().record_prog(4 * n as u64);
                ctx.stop("permute")?;

                let inversions = (0..n)
                    .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
                    .filter(|&(i, j)| buffer[i] > buffer[j])
                    .count();
                ctx.result("inversions", order as u64, n as u64, inversions as u64)
            })
            .with_path("benches/bench_permutation.toml:1")
            .with_slot(N, Define::values(vec![4, 6, 12]))
            .with_slot(ORDER, Define::values(vec![0, 1, 5, 23]))
            .with_slot(SEED, Define::lit(0))
            .with_filter(|defines| Ok(defines.value(N)? <= 8)),
        )
}

fn config_suite() -> Suite {
    Suite::new("bench_config", "benches/bench_config.toml")
        .with_flags(BenchFlags::INTERNAL)
        .with_case(
            Case::new("bench_config_geometry", |ctx| {
                let config = ctx.config()?;
                let block_count = config.block_count.max(0) as u64;
                let block_size = config.block_size.max(0) as u64;
                ctx.result("blocks", 0, block_size, block_count)
            })
            .with_path("benches/bench_config.toml:1")
            .with_flags(BenchFlags::INTERNAL),
        )
}
