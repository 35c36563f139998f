//! # Quantity Checks
//!
//! The stock/quota hook every [`Cart`](crate::cart::Cart) consults before it
//! commits a line change.
//!
//! ## Where The Check Runs
//! ```text
//! add_line(product, quantity, data, replace)
//!      │
//!      ├── resolve existing line / new line
//!      ├── compute resulting quantity ── negative? → InvalidQuantity
//!      │
//!      ├── QuantityCheck::check(product, quantity, data)  ← THIS MODULE
//!      │        (quantity is the requested DELTA, not the new total)
//!      │        Err(..) → QuantityRejected, cart untouched
//!      │
//!      └── commit: append / update / remove
//! ```
//!
//! ## Plugging In A Check
//! Any closure with the right shape is a check:
//!
//! ```rust
//! use satchel_core::cart::Cart;
//! use satchel_core::error::{CartError, CartResult};
//!
//! let in_stock = |sku: &&str, quantity: i64, _data: Option<&serde_json::Value>| -> CartResult<()> {
//!     if *sku == "LIMITED" && quantity > 1 {
//!         return Err(CartError::QuantityRejected {
//!             requested: quantity,
//!             reason: "limited edition, one per customer".to_string(),
//!         });
//!     }
//!     Ok(())
//! };
//!
//! let mut cart: Cart<&str, serde_json::Value, _> = Cart::with_checker(in_stock);
//! assert!(cart.add_line("LIMITED", 2, None, false).is_err());
//! assert!(cart.add_line("LIMITED", 1, None, false).is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CartError, CartResult};

/// Veto point for quantity changes.
pub trait QuantityCheck<P, D> {
    /// `quantity` is the delta passed to `add_line` (or the target quantity
    /// in replace mode), never the resulting total.
    fn check(&self, product: &P, quantity: i64, data: Option<&D>) -> CartResult<()>;
}

impl<P, D, F> QuantityCheck<P, D> for F
where
    F: Fn(&P, i64, Option<&D>) -> CartResult<()>,
{
    fn check(&self, product: &P, quantity: i64, data: Option<&D>) -> CartResult<()> {
        self(product, quantity, data)
    }
}

// =============================================================================
// Allow All
// =============================================================================

/// The default check: everything passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllowAll;

impl<P, D> QuantityCheck<P, D> for AllowAll {
    fn check(&self, _product: &P, _quantity: i64, _data: Option<&D>) -> CartResult<()> {
        Ok(())
    }
}

// =============================================================================
// Quantity Limit
// =============================================================================

/// Rejects any single request for more than `max` units.
///
/// Guards against fat-finger input (typing 1000 instead of 10). Negative
/// deltas always pass, so a customer can still shrink an oversized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityLimit {
    pub max: u32,
}

impl QuantityLimit {
    pub const fn new(max: u32) -> Self {
        QuantityLimit { max }
    }
}

impl<P, D> QuantityCheck<P, D> for QuantityLimit {
    fn check(&self, _product: &P, quantity: i64, _data: Option<&D>) -> CartResult<()> {
        if quantity > i64::from(self.max) {
            return Err(CartError::QuantityRejected {
                requested: quantity,
                reason: format!("cannot add more than {} at once", self.max),
            });
        }
        Ok(())
    }
}

/// An optional limit: `None` allows everything.
impl<P, D> QuantityCheck<P, D> for Option<QuantityLimit> {
    fn check(&self, product: &P, quantity: i64, data: Option<&D>) -> CartResult<()> {
        match self {
            Some(limit) => QuantityCheck::<P, D>::check(limit, product, quantity, data),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
