// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Trace output for running cases.
//!
//! Cases emit trace lines through [`Tracer::trace`]. Tracing is off unless a
//! path is configured; `-` traces to stdout. Heavy traces can be thinned by
//! period (keep every Nth line) and by frequency (keep at most N lines per
//! second).
//!
//! The sink is opened lazily in append mode. A failed open is retried at
//! most every 100ms, and a failed write drops the sink so the next line
//! reopens it. Trace failures never fail the case.

use std::backtrace::Backtrace;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::warn;

/// Minimum time between attempts to open the trace sink.
const REOPEN_INTERVAL: Duration = Duration::from_millis(100);

/// Trace options from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceConfig {
    /// Trace destination, `-` for stdout. `None` disables tracing.
    pub path: Option<PathBuf>,
    /// Append a backtrace to every line.
    pub backtrace: bool,
    /// Keep one line in every `period`; 0 keeps all.
    pub period: u32,
    /// Keep at most `freq` lines per second; 0 is unlimited.
    pub freq: u32,
}

impl TraceConfig {
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }
}

/// Sampling trace writer.
pub struct Tracer {
    config: TraceConfig,
    sink: Option<Box<dyn Write>>,
    cycles: u32,
    last_line: Option<Instant>,
    last_open: Option<Instant>,
}

impl Tracer {
    pub fn new(config: TraceConfig) -> Self {
        Self {
            config,
            sink: None,
            cycles: 0,
            last_line: None,
            last_open: None,
        }
    }

    /// Tracer writing to an already open sink.
    pub fn with_sink(config: TraceConfig, sink: Box<dyn Write>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Write one trace line, subject to sampling.
    pub fn trace(&mut self, args: fmt::Arguments<'_>) {
        if !self.config.is_enabled() || !self.sample() {
            return;
        }
        let backtrace = self.config.backtrace;
        let Some(sink) = self.sink() else {
            return;
        };

        let mut result = writeln!(sink, "{args}");
        if result.is_ok() && backtrace {
            result = write_backtrace(sink);
        }
        if result.is_ok() {
            result = sink.flush();
        }
        if let Err(err) = result {
            warn!(%err, "trace write failed");
            self.sink = None;
        }
    }

    fn sample(&mut self) -> bool {
        if self.config.period > 0 {
            let keep = self.cycles % self.config.period == 0;
            self.cycles = self.cycles.wrapping_add(1);
            if !keep {
                return false;
            }
        }

        if self.config.freq > 0 {
            let now = Instant::now();
            let interval = Duration::from_secs(1) / self.config.freq;
            if self
                .last_line
                .is_some_and(|last| now.duration_since(last) < interval)
            {
                return false;
            }
            self.last_line = Some(now);
        }
        true
    }

    fn sink(&mut self) -> Option<&mut Box<dyn Write>> {
        if self.sink.is_none() {
            let now = Instant::now();
            if self
                .last_open
                .is_some_and(|last| now.duration_since(last) < REOPEN_INTERVAL)
            {
                return None;
            }
            self.last_open = Some(now);
            self.sink = self.open();
        }
        self.sink.as_mut()
    }

    fn open(&self) -> Option<Box<dyn Write>> {
        let path = self.config.path.as_ref()?;
        if path.as_os_str() == "-" {
            return Some(Box::new(io::stdout()));
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(Box::new(file)),
            Err(err) => {
                warn!(path = %path.display(), %err, "could not open trace");
                None
            }
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("config", &self.config)
            .field("open", &self.sink.is_some())
            .field("cycles", &self.cycles)
            .finish()
    }
}

fn write_backtrace(sink: &mut dyn Write) -> io::Result<()> {
    let backtrace = Backtrace::force_capture().to_string();
    for line in backtrace.lines() {
        writeln!(sink, "\tat {}", line.trim())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn enabled() -> TraceConfig {
        TraceConfig {
            path: Some(PathBuf::from("-")),
            ..TraceConfig::default()
        }
    }

    #[test]
    fn test_disabled_writes_nothing() {
        let shared = Shared::default();
        let mut tracer = Tracer::with_sink(TraceConfig::default(), Box::new(shared.clone()));
        tracer.trace(format_args!("hello"));
        assert_eq!(shared.text(), "");
    }

    #[test]
    fn test_every_line_by_default() {
        let shared = Shared::default();
        let mut tracer = Tracer::with_sink(enabled(), Box::new(shared.clone()));
        for i in 0..3 {
            tracer.trace(format_args!("line {i}"));
        }
        assert_eq!(shared.text(), "line 0\nline 1\nline 2\n");
    }

    #[test]
    fn test_period_sampling() {
        let shared = Shared::default();
        let config = TraceConfig {
            period: 3,
            ..enabled()
        };
        let mut tracer = Tracer::with_sink(config, Box::new(shared.clone()));
        for i in 0..7 {
            tracer.trace(format_args!("{i}"));
        }
        assert_eq!(shared.text(), "0\n3\n6\n");
    }

    #[test]
    fn test_freq_sampling() {
        let shared = Shared::default();
        let config = TraceConfig {
            freq: 1,
            ..enabled()
        };
        let mut tracer = Tracer::with_sink(config, Box::new(shared.clone()));
        for i in 0..5 {
            tracer.trace(format_args!("{i}"));
        }
        // all five lines land well inside one second
        assert_eq!(shared.text(), "0\n");
    }

    #[test]
    fn test_backtrace_lines_are_indented() {
        let shared = Shared::default();
        let config = TraceConfig {
            backtrace: true,
            ..enabled()
        };
        let mut tracer = Tracer::with_sink(config, Box::new(shared.clone()));
        tracer.trace(format_args!("here"));
        let text = shared.text();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("here"));
        assert!(lines.all(|line| line.starts_with("\tat ")));
    }

    #[test]
    fn test_appends_to_file() {
        let path = std::env::temp_dir().join(format!("bench-trace-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let config = TraceConfig {
            path: Some(path.clone()),
            ..TraceConfig::default()
        };
        let mut tracer = Tracer::new(config);
        tracer.trace(format_args!("first"));
        tracer.trace(format_args!("second"));
        drop(tracer);

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(text, "first\nsecond\n");
    }
}
