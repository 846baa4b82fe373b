// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Command-line bench runner over the built-in suites.

mod demo;

use bench_runner::cli::Cli;
use bench_runner::runner::execute;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn setup_tracing() {
    let filter = EnvFilter::try_from_env("BENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    setup_tracing();

    let result = Cli::parse().into_config().and_then(|config| {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        execute(&config, &demo::suites(), &mut out)?;
        out.flush()?;
        Ok(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
