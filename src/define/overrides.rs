// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Command-line define overrides.
//!
//! An override names a define and gives it a set of values:
//!
//! ```text
//! NAME=VALUE[,VALUE...]
//! VALUE := INTEGER | range(STOP) | range(START,STOP) | range(START,STOP,STEP)
//! ```
//!
//! Values may also be separated by spaces alone. Integers accept C-style
//! prefixes (`0x` hex, leading `0` octal). Empty range fields default to
//! `start=0`, `stop=-1`, `step=1`.

use super::Define;
use crate::error::{BenchError, Result};
use std::rc::Rc;

/// One element of an override's value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideValue {
    /// A single literal.
    Value(i64),
    /// `start, start+step, ...` up to but excluding `stop`.
    Range { start: i64, stop: i64, step: i64 },
}

impl OverrideValue {
    /// Number of values this element contributes.
    pub fn count(&self) -> usize {
        match *self {
            OverrideValue::Value(_) => 1,
            OverrideValue::Range { start, stop, step } => {
                let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
                let count = if step > 0 {
                    (stop - 1 - start) / step + 1
                } else {
                    (start - 1 - stop) / -step + 1
                };
                usize::try_from(count).unwrap_or(0)
            }
        }
    }
}

/// The ordered value set of one override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideValues {
    values: Vec<OverrideValue>,
}

impl OverrideValues {
    /// Parse a comma- or space-separated value list.
    ///
    /// A set with no values, or more values than fit in a `usize`, is
    /// rejected.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || BenchError::InvalidDefine(s.to_owned());
        let mut values = Vec::new();
        let mut rest = s;

        loop {
            rest = rest.trim_start_matches(' ');
            if let Some(args) = rest.strip_prefix("range") {
                let args = args.trim_start_matches(' ');
                let args = args.strip_prefix('(').ok_or_else(invalid)?;
                let (value, tail) = parse_range(args).ok_or_else(invalid)?;
                values.push(value);
                rest = tail;
            } else if !rest.is_empty() {
                let (value, tail) = parse_int(rest).ok_or_else(invalid)?;
                values.push(OverrideValue::Value(value));
                rest = tail.trim_start_matches(' ');
            } else {
                break;
            }

            if let Some(tail) = rest.strip_prefix(',') {
                rest = tail;
            }
        }

        let values = Self { values };
        match values.checked_permutations() {
            Some(0) | None => Err(invalid()),
            Some(_) => Ok(values),
        }
    }

    fn checked_permutations(&self) -> Option<usize> {
        self.values
            .iter()
            .try_fold(0usize, |total, value| total.checked_add(value.count()))
    }

    /// Total number of values.
    pub fn permutations(&self) -> usize {
        self.checked_permutations().unwrap_or(usize::MAX)
    }

    /// The `i`th value, walking elements in order.
    pub fn get(&self, mut i: usize) -> Option<i64> {
        for value in &self.values {
            let count = value.count();
            if i < count {
                return Some(match *value {
                    OverrideValue::Value(v) => v,
                    OverrideValue::Range { start, step, .. } => {
                        start.wrapping_add((i as i64).wrapping_mul(step))
                    }
                });
            }
            i -= count;
        }
        None
    }

    /// Elements of this value set.
    pub fn values(&self) -> &[OverrideValue] {
        &self.values
    }
}

/// Parse the inside of `range(...)`, after the opening parenthesis.
fn parse_range(s: &str) -> Option<(OverrideValue, &str)> {
    let (first, rest) = parse_field(s, 0);
    let rest = rest.trim_start_matches(' ');

    let (start, stop, step, rest) = if let Some(rest) = rest.strip_prefix(',') {
        let (stop, rest) = parse_field(rest, -1);
        let rest = rest.trim_start_matches(' ');
        if let Some(rest) = rest.strip_prefix(',') {
            let (step, rest) = parse_field(rest, 1);
            (first, stop, step, rest.trim_start_matches(' '))
        } else {
            (first, stop, 1, rest)
        }
    } else {
        // a single argument is the stop
        (0, first, 1, rest)
    };

    let rest = rest.strip_prefix(')')?;
    if step == 0 {
        return None;
    }
    Some((OverrideValue::Range { start, stop, step }, rest))
}

/// Parse an optional integer field, falling back to `default` when empty.
fn parse_field(s: &str, default: i64) -> (i64, &str) {
    parse_int(s).unwrap_or((default, s))
}

/// Parse a C-style integer prefix of `s`.
///
/// Accepts leading spaces, an optional sign, and `0x`/`0` radix prefixes.
/// Returns the value and the unparsed tail, or `None` if no digits were found.
pub(crate) fn parse_int(s: &str) -> Option<(i64, &str)> {
    let trimmed = s.trim_start_matches(' ');
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        .filter(|hex| hex.starts_with(|c: char| c.is_ascii_hexdigit()))
    {
        (16, hex)
    } else if unsigned.starts_with('0') {
        (8, unsigned)
    } else {
        (10, unsigned)
    };

    let len = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if len == 0 {
        return None;
    }

    let magnitude = u64::from_str_radix(&digits[..len], radix).ok()? as i64;
    let value = if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };
    Some((value, &digits[len..]))
}

/// A named override, as given on the command line.
#[derive(Debug, Clone)]
pub struct Override {
    name: String,
    values: Rc<OverrideValues>,
}

impl Override {
    /// Parse `NAME=VALUES`.
    pub fn parse(s: &str) -> Result<Self> {
        let (name, values) = s
            .split_once('=')
            .ok_or_else(|| BenchError::InvalidDefine(s.to_owned()))?;
        Ok(Self::new(name.trim(), OverrideValues::parse(values)?))
    }

    /// Override `name` with `values`.
    pub fn new(name: &str, values: OverrideValues) -> Self {
        Self {
            name: name.to_owned(),
            values: Rc::new(values),
        }
    }

    /// Name of the define this overrides.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The override's value set.
    pub fn values(&self) -> &OverrideValues {
        &self.values
    }

    /// The override as a define permuting over its values.
    pub fn define(&self) -> Define {
        let values = Rc::clone(&self.values);
        let name = self.name.clone();
        Define::new(self.values.permutations(), move |_, i| {
            values.get(i).ok_or_else(|| BenchError::InvalidDefine(name.clone()))
        })
    }
}
