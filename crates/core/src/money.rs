//! Fixed-point monetary amounts.
//!
//! `Money` is the only representation allowed on the posting and balance
//! paths: a signed count of minor units at a fixed scale of 2 fractional
//! digits. Floating point never appears anywhere in the ledger core.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::value_object::ValueObject;

/// A monetary amount in minor units (e.g. cents), scale fixed at 2.
///
/// Arithmetic is checked: overflow surfaces as [`CoreError::AmountOverflow`]
/// rather than wrapping. Amounts serialize transparently as the raw minor
/// unit count.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Number of fractional digits carried by every amount.
    pub const SCALE: u32 = 2;

    const MINOR_PER_MAJOR: i64 = 100;

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Build an amount from whole currency units.
    pub fn from_major(major: i64) -> CoreResult<Self> {
        major
            .checked_mul(Self::MINOR_PER_MAJOR)
            .map(Self)
            .ok_or(CoreError::AmountOverflow)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> CoreResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    pub fn checked_sub(self, other: Money) -> CoreResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    pub fn checked_neg(self) -> CoreResult<Money> {
        self.0.checked_neg().map(Money).ok_or(CoreError::AmountOverflow)
    }

    pub fn abs(self) -> CoreResult<Money> {
        self.0.checked_abs().map(Money).ok_or(CoreError::AmountOverflow)
    }

    /// Convert an i128 minor-unit total (as produced by wide accumulation)
    /// back into an amount, failing when it no longer fits.
    pub fn try_from_minor_wide(minor: i128) -> CoreResult<Money> {
        i64::try_from(minor)
            .map(Money)
            .map_err(|_| CoreError::AmountOverflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02}",
            abs / Self::MINOR_PER_MAJOR as u64,
            abs % Self::MINOR_PER_MAJOR as u64
        )
    }
}

impl FromStr for Money {
    type Err = CoreError;

    /// Parse `"123.45"`, `"-0.05"` or `"100"`. At most two fractional
    /// digits are accepted; a single digit means tenths (`"1.5"` == 1.50).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || CoreError::invalid_amount(s.to_string());

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(bad());
        }

        let (units_str, frac_str) = match body.split_once('.') {
            Some((u, f)) => (u, f),
            None => (body, ""),
        };
        if frac_str.len() > Self::SCALE as usize {
            return Err(bad());
        }
        if units_str.is_empty() && frac_str.is_empty() {
            return Err(bad());
        }

        let units: i64 = if units_str.is_empty() {
            0
        } else {
            units_str.parse().map_err(|_| bad())?
        };
        let mut frac: i64 = if frac_str.is_empty() {
            0
        } else {
            frac_str.parse().map_err(|_| bad())?
        };
        if frac < 0 {
            return Err(bad());
        }
        if frac_str.len() == 1 {
            frac *= 10;
        }

        // Widen before combining so i64::MIN (whose magnitude has no
        // positive i64 counterpart) still parses.
        let mut minor = units as i128 * Self::MINOR_PER_MAJOR as i128 + frac as i128;
        if negative {
            minor = -minor;
        }
        Self::try_from_minor_wide(minor)
    }
}
