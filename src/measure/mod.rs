// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Measurement bookkeeping for running cases.
//!
//! Cases bracket the work they want measured with [`Meter::start`] and
//! [`Meter::stop`]. The meter snapshots an [`IoCounters`] source at both
//! ends and prints the deltas:
//!
//! ```text
//! benched <meas> <iter> <size> <read> <prog> <erase>
//! ```
//!
//! Cases that compute their own figure report it directly with
//! [`Meter::result`] or [`Meter::fresult`]:
//!
//! ```text
//! benched <meas> <iter> <size> <result>
//! ```
//!
//! The counters come from whatever device the case drives. The runner
//! supplies a [`CountingDevice`], a plain set of counters the case feeds as
//! it goes; nothing here models a storage medium.

use crate::error::{BenchError, Result};
use std::io::Write;
use tracing::trace;

/// Bytes read, programmed and erased so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoSnapshot {
    pub read: u64,
    pub prog: u64,
    pub erase: u64,
}

impl IoSnapshot {
    /// Per-counter difference since `earlier`.
    pub fn since(self, earlier: IoSnapshot) -> IoSnapshot {
        IoSnapshot {
            read: self.read.wrapping_sub(earlier.read),
            prog: self.prog.wrapping_sub(earlier.prog),
            erase: self.erase.wrapping_sub(earlier.erase),
        }
    }
}

/// A source of cumulative I/O counters.
pub trait IoCounters {
    fn snapshot(&self) -> IoSnapshot;
}

/// Cumulative I/O counters that a case advances by hand.
#[derive(Debug, Clone, Default)]
pub struct CountingDevice {
    totals: IoSnapshot,
}

impl CountingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&mut self, bytes: u64) {
        self.totals.read += bytes;
    }

    pub fn record_prog(&mut self, bytes: u64) {
        self.totals.prog += bytes;
    }

    pub fn record_erase(&mut self, bytes: u64) {
        self.totals.erase += bytes;
    }
}

impl IoCounters for CountingDevice {
    fn snapshot(&self) -> IoSnapshot {
        self.totals
    }
}

/// An open measurement.
#[derive(Debug, Clone)]
struct Record {
    meas: String,
    iter: u64,
    size: u64,
    start: IoSnapshot,
}

/// Open measurements of the running case.
#[derive(Debug, Default)]
pub struct Meter {
    records: Vec<Record>,
}

impl Meter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every open measurement; called before each case run.
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Number of measurements started and not yet stopped.
    pub fn open(&self) -> usize {
        self.records.len()
    }

    /// Open measurement `meas`, snapshotting `counters`.
    pub fn start(&mut self, meas: &str, iter: u64, size: u64, counters: &dyn IoCounters) {
        trace!(meas, iter, size, "bench start");
        self.records.push(Record {
            meas: meas.to_owned(),
            iter,
            size,
            start: counters.snapshot(),
        });
    }

    /// Close the oldest open measurement named `meas` and print its deltas.
    pub fn stop(
        &mut self,
        meas: &str,
        counters: &dyn IoCounters,
        out: &mut dyn Write,
    ) -> Result<()> {
        let now = counters.snapshot();
        let index = self
            .records
            .iter()
            .position(|record| record.meas == meas)
            .ok_or_else(|| BenchError::BenchNotStarted(meas.to_owned()))?;
        let record = self.records.remove(index);
        let delta = now.since(record.start);
        writeln!(
            out,
            "benched {} {} {} {} {} {}",
            record.meas, record.iter, record.size, delta.read, delta.prog, delta.erase
        )?;
        Ok(())
    }

    /// Print a case-computed integer result.
    pub fn result(
        &self,
        out: &mut dyn Write,
        meas: &str,
        iter: u64,
        size: u64,
        result: u64,
    ) -> Result<()> {
        writeln!(out, "benched {meas} {iter} {size} {result}")?;
        Ok(())
    }

    /// Print a case-computed floating point result.
    pub fn fresult(
        &self,
        out: &mut dyn Write,
        meas: &str,
        iter: u64,
        size: u64,
        result: f64,
    ) -> Result<()> {
        writeln!(out, "benched {meas} {iter} {size} {result:.6}")?;
        Ok(())
    }
}
