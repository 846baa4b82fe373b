// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! A self-terminating, text-safe variable-length integer encoding.
//!
//! Each character carries one nibble of the magnitude plus a continuation
//! bit, least-significant nibble first:
//!
//! ```text
//! char   '0'..='9'  'a'..='f'  'g'..='p'  'q'..='v'
//! value    0..=9     10..=15    16..=25    26..=31
//!          \______ final ____/  \___ continued ___/
//! ```
//!
//! Values with bit 4 set (16..=31) are followed by another nibble. Negative
//! numbers are prefixed with `w`, which is outside the nibble alphabet.

/// Prefix marking a negative magnitude.
pub const NEGATIVE: char = 'w';

/// Continuation bit within a tagged nibble.
const CONTINUE: u8 = 0x10;

/// Number of nibbles needed for a 64-bit magnitude.
const MAX_NIBBLES: usize = 16;

fn nibble_char(nibble: u8) -> char {
    if nibble < 10 {
        char::from(b'0' + nibble)
    } else {
        char::from(b'a' + nibble - 10)
    }
}

fn char_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'v' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Append the encoding of `value` to `out`.
pub fn encode_into(value: i64, out: &mut String) {
    if value < 0 {
        out.push(NEGATIVE);
    }

    let mut x = value.unsigned_abs();
    loop {
        let more = x > 0xf;
        let nibble = (x & 0xf) as u8 | if more { CONTINUE } else { 0 };
        out.push(nibble_char(nibble));
        if !more {
            break;
        }
        x >>= 4;
    }
}

/// Encode `value` as a new string.
pub fn encode(value: i64) -> String {
    let mut out = String::new();
    encode_into(value, &mut out);
    out
}

/// Decode one value from the front of `s`.
///
/// Returns the value and the unconsumed tail. If `s` does not start with a
/// complete encoding, returns `0` and `s` unchanged.
pub fn decode(s: &str) -> (i64, &str) {
    let bytes = s.as_bytes();
    let (negative, start) = match bytes.first() {
        Some(&b) if char::from(b) == NEGATIVE => (true, 1),
        _ => (false, 0),
    };

    let mut x: u64 = 0;
    let mut i = 0;
    loop {
        if i >= MAX_NIBBLES {
            return (0, s);
        }
        let Some(nibble) = bytes.get(start + i).copied().and_then(char_nibble) else {
            return (0, s);
        };

        x |= u64::from(nibble & 0xf) << (4 * i);
        i += 1;
        if nibble & CONTINUE == 0 {
            break;
        }
    }

    let value = x as i64;
    let value = if negative { value.wrapping_neg() } else { value };
    (value, &s[start + i..])
}
