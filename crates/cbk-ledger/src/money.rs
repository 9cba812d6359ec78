//! Fixed-point money type.
//!
//! # Motivation
//!
//! Every salary amount in the ledger is a signed `i64` count of minor currency
//! units (cents).  Exact integer arithmetic makes the zero-tolerance bucket
//! check and the "< 1 unit" drilldown tolerance well defined: two sums of the
//! same amounts compare equal regardless of summation order.
//!
//! `Money` wraps the raw `i64` so the type system prevents:
//! - Implicit construction from raw `i64` (no `From<i64>` impl).
//! - Mixing money with roster counts, day counts or years in arithmetic.
//!
//! # Scale
//!
//! 1 currency unit = `Money::from_minor(100)`.  Upstream systems and reports
//! speak in currency units; conversion happens once, at the serde boundary.
//!
//! # Rounding
//!
//! There is exactly one rounding rule: half away from zero, to the nearest
//! minor unit.  It applies to float ingestion ([`Money::from_units_f64`]) and
//! to proration ([`Money::prorate`]).
//!
//! # Bounds
//!
//! Amounts read from input rows are limited to [`MAX_INGEST_UNITS`] in
//! magnitude ([`Money::bounded`]); anything larger is a malformed row.  The
//! operators saturate at [`Money::MIN`] / [`Money::MAX`] and never panic.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Minor units per currency unit.
pub const MINOR_PER_UNIT: i64 = 100;

/// Largest magnitude, in currency units, accepted from an input row.
/// Roughly ninety thousand such amounts can be summed inside `i64`.
pub const MAX_INGEST_UNITS: i64 = 1_000_000_000_000;

// ---------------------------------------------------------------------------
// Money newtype
// ---------------------------------------------------------------------------

/// A signed fixed-point monetary amount in minor units.
///
/// # Construction
///
/// Use [`Money::from_minor`] or [`Money::from_units`].  There is intentionally
/// no `From<i64>` implementation; callers must say which scale a raw integer
/// is in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero monetary amount.
    pub const ZERO: Money = Money(0);

    /// Exactly one currency unit.
    pub const ONE_UNIT: Money = Money(MINOR_PER_UNIT);

    /// Maximum representable value.
    pub const MAX: Money = Money(i64::MAX);

    /// Minimum representable value.
    pub const MIN: Money = Money(i64::MIN);

    /// Construct from a raw count of minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Construct from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * MINOR_PER_UNIT)
    }

    /// Construct from whole currency units, `None` on overflow.
    #[inline]
    pub fn checked_from_units(units: i64) -> Option<Self> {
        units.checked_mul(MINOR_PER_UNIT).map(Money)
    }

    /// `Some(self)` when within [`MAX_INGEST_UNITS`] of zero.
    #[inline]
    pub fn bounded(self) -> Option<Self> {
        (self.abs().0 <= MAX_INGEST_UNITS * MINOR_PER_UNIT).then_some(self)
    }

    /// Convert a floating currency-unit amount, rounding half away from zero.
    ///
    /// Returns `None` for NaN, infinities, or values outside the `i64` range.
    pub fn from_units_f64(units: f64) -> Option<Self> {
        if !units.is_finite() {
            return None;
        }
        // f64::round is half-away-from-zero.
        let minor = (units * MINOR_PER_UNIT as f64).round();
        if minor < i64::MIN as f64 || minor > i64::MAX as f64 {
            return None;
        }
        Some(Money(minor as i64))
    }

    /// Extract the underlying minor-unit count.
    #[inline]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Lossy conversion to currency units, for display and serialization only.
    #[inline]
    pub fn units_f64(self) -> f64 {
        self.0 as f64 / MINOR_PER_UNIT as f64
    }

    #[inline]
    pub fn saturating_add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }

    /// Absolute value.  `Money::MIN.abs()` saturates to `Money::MAX`.
    #[inline]
    pub fn abs(self) -> Money {
        Money(self.0.saturating_abs())
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply a per-slot amount by a plain count (roster slots, contracts).
    ///
    /// Returns `None` on overflow.
    #[inline]
    pub fn checked_mul_count(self, count: i64) -> Option<Money> {
        self.0.checked_mul(count).map(Money)
    }

    /// Scale by the ratio `numerator / denominator`, rounding half away from
    /// zero to the nearest minor unit.
    ///
    /// The intermediate product is computed in `i128`, so no precision is lost
    /// before the single rounding step.  Returns `None` when `denominator` is
    /// not positive or the result does not fit in `i64`.
    pub fn prorate(self, numerator: i64, denominator: i64) -> Option<Money> {
        if denominator <= 0 {
            return None;
        }
        let scaled = div_round_half_away(
            self.0 as i128 * numerator as i128,
            denominator as i128,
        );
        i64::try_from(scaled).ok().map(Money)
    }
}

/// `n / d` rounded half away from zero.  `d` must be positive.
fn div_round_half_away(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d {
        q + n.signum()
    } else {
        q
    }
}

// ---------------------------------------------------------------------------
// Arithmetic operators (closed over Money, saturating)
// ---------------------------------------------------------------------------

impl Add for Money {
    type Output = Money;
    #[inline]
    fn add(self, rhs: Money) -> Money {
        self.saturating_add(rhs)
    }
}

impl Sub for Money {
    type Output = Money;
    #[inline]
    fn sub(self, rhs: Money) -> Money {
        self.saturating_sub(rhs)
    }
}

impl Neg for Money {
    type Output = Money;
    #[inline]
    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Money) {
        *self = self.saturating_add(rhs);
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, rhs: Money) {
        *self = self.saturating_sub(rhs);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.0 / MINOR_PER_UNIT;
        let frac = (self.0 % MINOR_PER_UNIT).abs();
        // |value| < 1 unit and negative: units truncates to 0 and drops the sign.
        if self.0 < 0 && units == 0 {
            write!(f, "-{units}.{frac:02}")
        } else {
            write!(f, "{units}.{frac:02}")
        }
    }
}

// ---------------------------------------------------------------------------
// Serde: currency units on the wire
// ---------------------------------------------------------------------------

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_PER_UNIT == 0 {
            serializer.serialize_i64(self.0 / MINOR_PER_UNIT)
        } else {
            serializer.serialize_f64(self.units_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let units = f64::deserialize(deserializer)?;
        Money::from_units_f64(units)
            .and_then(Money::bounded)
            .ok_or_else(|| de::Error::custom(format!("amount out of range: {units}")))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
