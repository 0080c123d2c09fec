// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed classification of attribute values for additive merging.

use crate::size::Size;

/// What an attribute value looks like on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Double(f64),
    Long(i64),
    Size(Size),
    Str,
}

/// Classify a raw attribute value.
///
/// A value containing `.` that parses as a float is a double; an integer
/// with an explicit size suffix is a size; a plain integer is a long;
/// everything else is an opaque string.
pub fn classify(raw: &str) -> ValueKind {
    let raw = raw.trim();
    if raw.contains('.') {
        return match raw.parse::<f64>() {
            Ok(v) => ValueKind::Double(v),
            Err(_) => ValueKind::Str,
        };
    }
    if let Some(size) = Size::parse(raw) {
        if size.unit.is_explicit() {
            return ValueKind::Size(size);
        }
    }
    match raw.parse::<i64>() {
        Ok(v) => ValueKind::Long(v),
        Err(_) => ValueKind::Str,
    }
}

/// Add `next` into `cur`, with the addition mode chosen by `next`'s kind.
///
/// Returns the new value string, or `None` when `next` is non-additive
/// (string-typed). A `cur` that fails to parse under `next`'s kind
/// contributes zero; size addition treats a bare-integer `cur` as bytes.
pub fn add_values(cur: &str, next: &str) -> Option<String> {
    match classify(next) {
        ValueKind::Str => None,
        ValueKind::Double(nxt) => {
            let prev: f64 = cur.trim().parse().unwrap_or(0.0);
            Some(format!("{:.6}", prev + nxt))
        }
        ValueKind::Long(nxt) => {
            let prev = leading_long(cur);
            Some((prev + nxt).to_string())
        }
        ValueKind::Size(nxt) => {
            let prev = Size::parse(cur).unwrap_or(Size::new(0, nxt.unit));
            Some(prev.add(nxt).to_string())
        }
    }
}

/// Integer prefix of a string, `strtol`-style: parse digits until the
/// first non-digit.
fn leading_long(raw: &str) -> i64 {
    let raw = raw.trim();
    let negative = raw.starts_with('-');
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().unwrap_or(0);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
