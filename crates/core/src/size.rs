// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suffixed size values (`2gb`, `500mb`), 1024-based.

use std::fmt;

/// Size multiplier suffixes. Ordered smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeUnit {
    B,
    Kb,
    Mb,
    Gb,
    Tb,
    Pb,
}

impl SizeUnit {
    fn suffix(self) -> &'static str {
        match self {
            SizeUnit::B => "b",
            SizeUnit::Kb => "kb",
            SizeUnit::Mb => "mb",
            SizeUnit::Gb => "gb",
            SizeUnit::Tb => "tb",
            SizeUnit::Pb => "pb",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "" | "b" => Some(SizeUnit::B),
            "kb" => Some(SizeUnit::Kb),
            "mb" => Some(SizeUnit::Mb),
            "gb" => Some(SizeUnit::Gb),
            "tb" => Some(SizeUnit::Tb),
            "pb" => Some(SizeUnit::Pb),
            _ => None,
        }
    }

    fn shift(self) -> u32 {
        match self {
            SizeUnit::B => 0,
            SizeUnit::Kb => 10,
            SizeUnit::Mb => 20,
            SizeUnit::Gb => 30,
            SizeUnit::Tb => 40,
            SizeUnit::Pb => 50,
        }
    }

    /// True for the suffixes that mark a value as size-typed on the wire.
    /// A bare integer (unit `B`) is long-typed, not size-typed.
    pub fn is_explicit(self) -> bool {
        self != SizeUnit::B
    }
}

/// An integer magnitude with a size suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub value: i64,
    pub unit: SizeUnit,
}

impl Size {
    pub fn new(value: i64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    /// Parse `<digits><suffix>`. Suffix match is case-insensitive; a bare
    /// integer parses as bytes.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
        if split == 0 {
            return None;
        }
        let value: i64 = raw[..split].parse().ok()?;
        let unit = SizeUnit::from_suffix(&raw[split..])?;
        Some(Self { value, unit })
    }

    /// Magnitude expressed in `unit`. Only meaningful for units at or
    /// below this size's own unit.
    fn in_unit(self, unit: SizeUnit) -> i64 {
        self.value << (self.unit.shift() - unit.shift())
    }

    /// Sum preserving units: the result is expressed in the smaller unit
    /// of the two operands so no precision is lost.
    pub fn add(self, other: Size) -> Size {
        let unit = self.unit.min(other.unit);
        Size { value: self.in_unit(unit) + other.in_unit(unit), unit }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

#[cfg(test)]
#[path = "size_tests.rs"]
mod tests;
