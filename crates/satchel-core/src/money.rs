//! # Money Module
//!
//! Provides the `Money` type used as the price of [`CatalogProduct`].
//!
//! Carts never compute prices themselves. A line asks its product for a unit
//! price and multiplies by its quantity, so any price type works as long as it
//! supports that multiplication. `Money` is the one shipped with this crate.
//!
//! ## Usage
//! ```rust
//! use satchel_core::money::Money;
//!
//! let unit = Money::from_cents(1099); // $10.99
//! let line_total = unit * 3_u32;      // $32.97
//! assert_eq!(line_total.cents(), 3297);
//! assert_eq!(line_total.to_string(), "$32.97");
//! ```
//!
//! [`CatalogProduct`]: crate::product::CatalogProduct

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: collaborators may hand back credits or adjustments
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No floats**: `0.1 + 0.2` never shows up in a cart total
/// - **Saturating arithmetic**: a line may hold up to `u32::MAX` units, so
///   products and sums clamp at `i64::MIN`/`i64::MAX` instead of panicking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use satchel_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies a unit price by a line quantity.
    ///
    /// ## Example
    /// ```rust
    /// use satchel_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// assert_eq!(Money::from_cents(i64::MAX).multiply_quantity(2).cents(), i64::MAX);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly `$x.yy` rendering. Localized display belongs to the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Multiplication by a line quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

/// Summing line totals into a cart total.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        let mut total = Money::zero();
        for amount in iter {
            total += amount;
        }
        total
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
