//! Satoshi amounts and whole-coin rendering.
//!
//! Amounts are integers of the smallest unit to avoid floating-point errors.
//! Conversion to whole coins happens only when rendering text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Satoshis per whole coin.
pub const COIN: u64 = 100_000_000;

/// A non-negative amount in satoshis.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Satoshis(u64);

impl Satoshis {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Add for Satoshis {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Satoshis {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Satoshis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_coins(self.0 as i64))
    }
}

/// Render a signed satoshi amount in whole coins with trailing zeros trimmed.
///
/// `60_000_000` renders as `0.6`, `-30_000_000` as `-0.3`, `COIN` as `1`.
pub fn format_coins(satoshis: i64) -> String {
    let sign = if satoshis < 0 { "-" } else { "" };
    let abs = satoshis.unsigned_abs();
    let whole = abs / COIN;
    let frac = abs % COIN;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let digits = format!("{frac:08}");
    format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_fractions() {
        assert_eq!(format_coins(60_000_000), "0.6");
        assert_eq!(format_coins(40_000_000), "0.4");
        assert_eq!(format_coins(-30_000_000), "-0.3");
        assert_eq!(format_coins(1), "0.00000001");
        assert_eq!(format_coins(123_456_789), "1.23456789");
    }

    #[test]
    fn formats_whole_coins() {
        assert_eq!(format_coins(0), "0");
        assert_eq!(format_coins(COIN as i64), "1");
        assert_eq!(format_coins(-2 * COIN as i64), "-2");
    }

    #[test]
    fn display_uses_coins() {
        assert_eq!(Satoshis::new(150_000_000).to_string(), "1.5");
    }
}
