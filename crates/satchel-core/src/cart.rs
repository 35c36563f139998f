//! # Cart
//!
//! The ordered, duplicate-free collection of [`Line`]s for one session.
//!
//! ## Invariants
//! - At most one line per distinct `(product, data)` pair
//! - Every line in the cart has quantity > 0
//! - Insertion order is display order: a line keeps the position of its
//!   first addition for as long as it stays in the cart
//!
//! ## add_line Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resulting qty │ line existed? │ effect                    │ modified  │
//! │  ──────────────┼───────────────┼───────────────────────────┼────────── │
//! │       0        │      yes      │ remove line               │ set       │
//! │      > 0       │      no       │ append line at the end    │ set       │
//! │      > 0       │      yes      │ update quantity in place  │ set       │
//! │       0        │      no       │ nothing                   │ untouched │
//! │     < 0        │       -       │ InvalidQuantity           │ untouched │
//! │  check vetoes  │       -       │ QuantityRejected          │ untouched │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Ways To Build A Cart
//! ```text
//! Fresh construction                     State restoration
//! ──────────────────                     ─────────────────
//! Cart::from_entries(triples)            Cart::restore(lines) / Deserialize
//!   │ replays add_line(replace=true)       │ takes the sequence verbatim
//!   │ duplicates collapse                  │ no validation, no quantity check
//!   │ quantity check runs                  │
//!   ▼                                      ▼
//! modified = true                        modified = false
//! ```
//! Restoration assumes the stored sequence came out of a cart. Feed anything
//! less trusted through `from_entries` or `restore_checked`.
//!
//! ## Example
//! ```rust
//! use satchel_core::cart::Cart;
//! use serde_json::json;
//!
//! let mut cart: Cart<&str> = Cart::new();
//! cart.add_line("P1", 3, None, false).unwrap();
//! cart.add_line("P1", 2, None, false).unwrap();
//! cart.add_line("P2", 1, Some(json!({"size": "L"})), false).unwrap();
//!
//! assert_eq!(cart.size(), 2);
//! assert_eq!(cart.count(), 6);
//! assert_eq!(cart.find_line(&"P1", None).map(|l| l.quantity()), Some(5));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Mul;
use std::slice;
use tracing::{debug, warn};

use crate::error::CartResult;
use crate::line::Line;
use crate::product::{PriceContext, Product};
use crate::quota::{AllowAll, QuantityCheck};
use crate::validation::{resulting_quantity, validate_lines};

// =============================================================================
// Line Entry
// =============================================================================

/// Result of [`Cart::get_or_create_line`].
#[derive(Debug, Clone, PartialEq)]
pub enum LineEntry<'a, P, D> {
    /// The line already in the cart, unchanged.
    Existing(&'a Line<P, D>),
    /// A new line that has NOT been inserted.
    New(Line<P, D>),
}

impl<P, D> LineEntry<'_, P, D> {
    /// True when the line had to be created.
    pub fn created(&self) -> bool {
        matches!(self, LineEntry::New(_))
    }

    pub fn line(&self) -> &Line<P, D> {
        match self {
            LineEntry::Existing(line) => *line,
            LineEntry::New(line) => line,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A shopping cart.
///
/// - `P`: the product type, compared with `==`
/// - `D`: the opaque per-line payload (variant, engraving text, ...)
/// - `Q`: the quantity check consulted before every change
#[derive(Clone)]
pub struct Cart<P, D = serde_json::Value, Q = AllowAll> {
    lines: Vec<Line<P, D>>,
    modified: bool,
    checker: Q,
}

impl<P, D, Q: Default> Cart<P, D, Q> {
    /// Creates a new empty cart.
    ///
    /// A freshly built cart counts as modified, so the first save always
    /// happens.
    pub fn new() -> Self {
        Self::with_checker(Q::default())
    }

    /// Rebuilds a cart from a stored line sequence, trusting it verbatim.
    ///
    /// Skips validation and the quantity check. The result is not modified.
    pub fn restore(lines: Vec<Line<P, D>>) -> Self {
        Self::restore_with_checker(lines, Q::default())
    }
}

impl<P, D, Q> Cart<P, D, Q> {
    /// Creates a new empty cart that consults `checker` before every change.
    pub fn with_checker(checker: Q) -> Self {
        Cart {
            lines: Vec::new(),
            modified: true,
            checker,
        }
    }

    /// [`Cart::restore`] with an explicit quantity check.
    pub fn restore_with_checker(lines: Vec<Line<P, D>>, checker: Q) -> Self {
        debug!(lines = lines.len(), "Restoring cart state");
        Cart {
            lines,
            modified: false,
            checker,
        }
    }

    /// Lines in insertion order.
    ///
    /// The iterator is `Clone`, so it can be restarted as often as needed.
    pub fn lines(&self) -> slice::Iter<'_, Line<P, D>> {
        self.lines.iter()
    }

    /// Positional access, in insertion order.
    pub fn get(&self, index: usize) -> Option<&Line<P, D>> {
        self.lines.get(index)
    }

    /// Total quantity across all lines.
    pub fn count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Number of distinct lines (not total quantity).
    pub fn size(&self) -> usize {
        self.lines.len()
    }

    /// Same as [`Cart::size`].
    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the contents changed since the cart was built, restored or
    /// last marked clean.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clears the modified flag, typically right after persisting.
    pub fn mark_clean(&mut self) {
        self.modified = false;
    }

    /// Removes every line. Only an actual removal marks the cart modified.
    pub fn clear(&mut self) {
        if !self.lines.is_empty() {
            debug!(lines = self.lines.len(), "Clearing cart");
            self.lines.clear();
            self.modified = true;
        }
    }

    pub fn checker(&self) -> &Q {
        &self.checker
    }

    /// Consumes the cart, returning its line sequence.
    pub fn into_lines(self) -> Vec<Line<P, D>> {
        self.lines
    }
}

impl<P, D, Q> Cart<P, D, Q>
where
    P: PartialEq,
    D: PartialEq,
    Q: QuantityCheck<P, D>,
{
    /// Fresh construction: replays `(product, quantity, data)` triples
    /// through [`Cart::add_line`] in replace mode.
    ///
    /// Duplicate `(product, data)` pairs collapse into one line holding the
    /// last quantity given; zero quantities never produce a line.
    pub fn from_entries<I>(entries: I) -> CartResult<Self>
    where
        I: IntoIterator<Item = (P, i64, Option<D>)>,
        Q: Default,
    {
        Self::from_entries_with_checker(entries, Q::default())
    }

    /// [`Cart::from_entries`] with an explicit quantity check.
    pub fn from_entries_with_checker<I>(entries: I, checker: Q) -> CartResult<Self>
    where
        I: IntoIterator<Item = (P, i64, Option<D>)>,
    {
        let mut cart = Self::with_checker(checker);
        for (product, quantity, data) in entries {
            cart.add_line(product, quantity, data, true)?;
        }
        Ok(cart)
    }

    /// State restoration that verifies both cart invariants first.
    pub fn restore_checked(lines: Vec<Line<P, D>>) -> CartResult<Self>
    where
        Q: Default,
    {
        Self::restore_checked_with_checker(lines, Q::default())
    }

    /// [`Cart::restore_checked`] with an explicit quantity check.
    pub fn restore_checked_with_checker(lines: Vec<Line<P, D>>, checker: Q) -> CartResult<Self> {
        if let Err(err) = validate_lines(&lines) {
            warn!(error = %err, "Refusing to restore cart state");
            return Err(err);
        }
        Ok(Self::restore_with_checker(lines, checker))
    }

    fn position(&self, product: &P, data: Option<&D>) -> Option<usize> {
        self.lines.iter().position(|line| line.matches(product, data))
    }

    /// The line holding `(product, data)`, if any.
    pub fn find_line(&self, product: &P, data: Option<&D>) -> Option<&Line<P, D>> {
        self.position(product, data)
            .and_then(|index| self.lines.get(index))
    }

    /// The existing line for `(product, data)`, or a new detached one with
    /// `quantity`. Never touches the cart.
    pub fn get_or_create_line(
        &self,
        product: P,
        quantity: u32,
        data: Option<D>,
    ) -> LineEntry<'_, P, D> {
        match self.find_line(&product, data.as_ref()) {
            Some(line) => LineEntry::Existing(line),
            None => LineEntry::New(Line::new(product, quantity, data)),
        }
    }

    /// Runs the cart's quantity check.
    pub fn check_quantity(&self, product: &P, quantity: i64, data: Option<&D>) -> CartResult<()> {
        self.checker.check(product, quantity, data)
    }

    /// Adds `quantity` units of `(product, data)`, or sets the line to
    /// exactly `quantity` when `replace` is true.
    ///
    /// ## Errors
    /// - [`CartError::InvalidQuantity`] if the line would go negative
    /// - [`CartError::QuantityOverflow`] if it would not fit a `u32`
    /// - whatever the quantity check returns (usually
    ///   [`CartError::QuantityRejected`])
    ///
    /// On error the cart is left exactly as it was.
    ///
    /// [`CartError::InvalidQuantity`]: crate::error::CartError::InvalidQuantity
    /// [`CartError::QuantityOverflow`]: crate::error::CartError::QuantityOverflow
    /// [`CartError::QuantityRejected`]: crate::error::CartError::QuantityRejected
    pub fn add_line(
        &mut self,
        product: P,
        quantity: i64,
        data: Option<D>,
        replace: bool,
    ) -> CartResult<()> {
        let index = self.position(&product, data.as_ref());
        let entry = self.get_or_create_line(product, 0, data);
        let existing = entry.line().quantity();

        let resulting = resulting_quantity(existing, quantity, replace)?;

        let line = entry.line();
        if let Err(err) = self.check_quantity(line.product(), quantity, line.data()) {
            warn!(quantity, error = %err, "Quantity check rejected cart change");
            return Err(err);
        }

        let created = match entry {
            LineEntry::New(line) => Some(line),
            LineEntry::Existing(_) => None,
        };

        match (index, created, resulting) {
            (Some(index), _, 0) => {
                self.lines.remove(index);
                self.modified = true;
                debug!(index, lines = self.lines.len(), "Removed cart line");
            }
            (Some(index), _, resulting) => {
                if let Some(line) = self.lines.get_mut(index) {
                    line.set_quantity(resulting);
                }
                self.modified = true;
                debug!(index, existing, resulting, replace, "Updated cart line");
            }
            (None, Some(mut line), resulting) if resulting > 0 => {
                line.set_quantity(resulting);
                self.lines.push(line);
                self.modified = true;
                debug!(resulting, lines = self.lines.len(), "Appended cart line");
            }
            _ => {
                debug!(quantity, replace, "Discarded empty new line");
            }
        }

        Ok(())
    }

    /// Drops the line for `(product, data)`, if present.
    ///
    /// Same as `add_line(product, 0, data, true)`.
    pub fn remove_line(&mut self, product: P, data: Option<D>) -> CartResult<()> {
        self.add_line(product, 0, data, true)
    }
}

impl<P: Product, D, Q> Cart<P, D, Q> {
    /// Sum of every line total under the given pricing context.
    pub fn total(&self, context: &PriceContext) -> P::Price
    where
        P::Price: Mul<u32, Output = P::Price> + Sum,
    {
        self.lines.iter().map(|line| line.total(context)).sum()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<P, D, Q: Default> Default for Cart<P, D, Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: fmt::Debug, D: fmt::Debug, Q> fmt::Debug for Cart<P, D, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("lines", &self.lines)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

/// Carts compare by their ordered line sequence only.
impl<P: PartialEq, D: PartialEq, Q> PartialEq for Cart<P, D, Q> {
    fn eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

impl<'a, P, D, Q> IntoIterator for &'a Cart<P, D, Q> {
    type Item = &'a Line<P, D>;
    type IntoIter = slice::Iter<'a, Line<P, D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// A cart persists as its bare line sequence.
impl<P: Serialize, D: Serialize, Q> Serialize for Cart<P, D, Q> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.lines.serialize(serializer)
    }
}

/// Deserializing is state restoration: see [`Cart::restore`].
impl<'de, P, D, Q> Deserialize<'de> for Cart<P, D, Q>
where
    P: Deserialize<'de>,
    D: Deserialize<'de>,
    Q: Default,
{
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        Vec::<Line<P, D>>::deserialize(deserializer).map(Self::restore)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CartError;
    use crate::money::Money;
    use crate::product::CatalogProduct;
    use crate::quota::QuantityLimit;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    type TestCart = Cart<&'static str>;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn quantities(cart: &TestCart) -> Vec<(&'static str, u32)> {
        cart.lines().map(|l| (*l.product(), l.quantity())).collect()
    }

    fn assert_invariants(cart: &TestCart) {
        assert!(validate_lines(&cart.lines).is_ok(), "{:?}", cart);
        let sum: u64 = cart.lines().map(|l| u64::from(l.quantity())).sum();
        assert_eq!(cart.count(), sum);
        assert_eq!(cart.len(), cart.size());
        assert_eq!(cart.lines().count(), cart.size());
    }

    // -------------------------------------------------------------------------
    // Scenarios
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_cart() {
        let cart = TestCart::new();
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.size(), 0);
        assert!(cart.is_empty());
        assert!(cart.lines().next().is_none());
    }

    #[test]
    fn test_add_new_line() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 3, None, false).unwrap();

        assert_eq!(quantities(&cart), vec![("P1", 3)]);
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.size(), 1);
    }

    #[test]
    fn test_add_same_line_merges() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 3, None, false).unwrap();
        cart.add_line("P1", 2, None, false).unwrap();

        assert_eq!(quantities(&cart), vec![("P1", 5)]);
    }

    #[test]
    fn test_replace_sets_quantity() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 5, None, false).unwrap();
        cart.add_line("P1", 5, None, true).unwrap();

        assert_eq!(quantities(&cart), vec![("P1", 5)]);
    }

    #[test]
    fn test_negative_delta_to_zero_removes_line() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 3, None, false).unwrap();
        cart.add_line("P1", -3, None, false).unwrap();

        assert_eq!(cart.size(), 0);
        assert!(cart.find_line(&"P1", None).is_none());
    }

    #[test]
    fn test_negative_result_fails_and_keeps_line() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 3, None, false).unwrap();
        cart.mark_clean();

        let err = cart.add_line("P1", -5, None, false).unwrap_err();
        assert!(matches!(
            err,
            CartError::InvalidQuantity {
                quantity: -5,
                resulting: -2
            }
        ));
        assert_eq!(quantities(&cart), vec![("P1", 3)]);
        assert!(!cart.is_modified());
    }

    #[test]
    fn test_data_distinguishes_lines() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 2, Some(json!({"size": "M"})), false)
            .unwrap();
        cart.add_line("P1", 1, Some(json!({"size": "L"})), false)
            .unwrap();

        assert_eq!(cart.size(), 2);
        assert_eq!(cart.count(), 3);
        assert_eq!(
            cart.find_line(&"P1", Some(&json!({"size": "L"})))
                .map(Line::quantity),
            Some(1)
        );
        assert!(cart.find_line(&"P1", None).is_none());
    }

    // -------------------------------------------------------------------------
    // Ordering and membership
    // -------------------------------------------------------------------------

    #[test]
    fn test_insertion_order_is_kept() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 1, None, false).unwrap();
        cart.add_line("P2", 1, None, false).unwrap();
        cart.add_line("P3", 1, None, false).unwrap();
        cart.add_line("P1", 4, None, false).unwrap();
        cart.add_line("P2", 0, None, true).unwrap();

        assert_eq!(quantities(&cart), vec![("P1", 5), ("P3", 1)]);
        assert_eq!(cart.get(1).map(|l| *l.product()), Some("P3"));
        assert!(cart.get(2).is_none());

        cart.add_line("P2", 2, None, false).unwrap();
        assert_eq!(quantities(&cart), vec![("P1", 5), ("P3", 1), ("P2", 2)]);
    }

    #[test]
    fn test_lines_iterator_is_restartable() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 1, None, false).unwrap();
        cart.add_line("P2", 2, None, false).unwrap();

        let lines = cart.lines();
        let first: Vec<u32> = lines.clone().map(Line::quantity).collect();
        let second: Vec<u32> = lines.map(Line::quantity).collect();
        assert_eq!(first, second);

        let via_into_iter: Vec<u32> = (&cart).into_iter().map(Line::quantity).collect();
        assert_eq!(via_into_iter, vec![1, 2]);
    }

    #[test]
    fn test_new_zero_line_is_noop() {
        let mut cart = TestCart::new();
        cart.mark_clean();

        cart.add_line("P1", 0, None, false).unwrap();
        cart.add_line("P1", 0, None, true).unwrap();

        assert!(cart.is_empty());
        assert!(!cart.is_modified());
    }

    #[test]
    fn test_replace_with_negative_fails() {
        let mut cart = TestCart::new();
        let err = cart.add_line("P1", -1, None, true).unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_overflow_fails() {
        let mut cart = TestCart::new();
        cart.add_line("P1", i64::from(u32::MAX), None, false).unwrap();

        let err = cart.add_line("P1", 1, None, false).unwrap_err();
        assert!(matches!(err, CartError::QuantityOverflow { .. }));
        assert_eq!(cart.count(), u64::from(u32::MAX));
    }

    #[test]
    fn test_remove_line() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 2, None, false).unwrap();
        cart.add_line("P1", 2, Some(json!("gift")), false).unwrap();

        cart.remove_line("P1", Some(json!("gift"))).unwrap();
        assert_eq!(quantities(&cart), vec![("P1", 2)]);

        cart.mark_clean();
        cart.remove_line("P9", None).unwrap();
        assert!(!cart.is_modified());
    }

    #[test]
    fn test_clear() {
        let mut cart = TestCart::new();
        cart.mark_clean();
        cart.clear();
        assert!(!cart.is_modified());

        cart.add_line("P1", 2, None, false).unwrap();
        cart.mark_clean();
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.is_modified());
    }

    // -------------------------------------------------------------------------
    // get_or_create_line / find_line
    // -------------------------------------------------------------------------

    #[test]
    fn test_get_or_create_line_existing() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 4, None, false).unwrap();

        let entry = cart.get_or_create_line("P1", 99, None);
        assert!(!entry.created());
        assert_eq!(entry.line().quantity(), 4);
    }

    #[test]
    fn test_get_or_create_line_new_is_not_inserted() {
        let cart = TestCart::new();

        let entry = cart.get_or_create_line("P1", 7, Some(json!("gift")));
        assert!(entry.created());
        assert_eq!(entry.line(), &Line::new("P1", 7, Some(json!("gift"))));
        assert!(cart.is_empty());
    }

    // -------------------------------------------------------------------------
    // Modified flag
    // -------------------------------------------------------------------------

    #[test]
    fn test_modified_flag_lifecycle() {
        let mut cart = TestCart::new();
        assert!(cart.is_modified());

        cart.mark_clean();
        cart.add_line("P1", 1, None, false).unwrap();
        assert!(cart.is_modified());

        cart.mark_clean();
        cart.add_line("P1", 2, None, false).unwrap();
        assert!(cart.is_modified());

        cart.mark_clean();
        cart.add_line("P1", -3, None, false).unwrap();
        assert!(cart.is_modified());
    }

    #[test]
    fn test_replace_with_same_quantity_still_marks_modified() {
        let mut cart = TestCart::new();
        cart.add_line("P1", 2, None, false).unwrap();
        cart.mark_clean();

        cart.add_line("P1", 2, None, true).unwrap();
        assert!(cart.is_modified());
    }

    // -------------------------------------------------------------------------
    // Quantity checks
    // -------------------------------------------------------------------------

    #[test]
    fn test_check_receives_delta_not_total() {
        let seen = RefCell::new(Vec::new());
        let recorder = |_: &&'static str, quantity: i64, _: Option<&Value>| -> CartResult<()> {
            seen.borrow_mut().push(quantity);
            Ok(())
        };

        let mut cart: Cart<&'static str, Value, _> = Cart::with_checker(recorder);
        cart.add_line("P1", 3, None, false).unwrap();
        cart.add_line("P1", 2, None, false).unwrap();
        cart.add_line("P1", 1, None, true).unwrap();

        assert_eq!(cart.count(), 1);
        assert_eq!(*seen.borrow(), vec![3, 2, 1]);
    }

    #[test]
    fn test_rejected_check_leaves_cart_untouched() {
        init_tracing();
        let mut cart: Cart<&'static str, Value, QuantityLimit> =
            Cart::with_checker(QuantityLimit::new(10));
        cart.add_line("P1", 10, None, false).unwrap();
        cart.mark_clean();
        let before = cart.clone();

        let err = cart.add_line("P1", 11, None, true).unwrap_err();
        assert!(matches!(err, CartError::QuantityRejected { .. }));
        assert_eq!(cart, before);
        assert!(!cart.is_modified());

        // Removal passes the limit
        cart.add_line("P1", -10, None, false).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_check_quantity_delegates_to_checker() {
        let cart: Cart<&'static str, Value, QuantityLimit> =
            Cart::with_checker(QuantityLimit::new(2));
        assert!(cart.check_quantity(&"P1", 2, None).is_ok());
        assert!(cart.check_quantity(&"P1", 3, None).is_err());
        assert_eq!(cart.checker().max, 2);
    }

    #[test]
    fn test_check_sees_line_data() {
        let seen = RefCell::new(Vec::new());
        let recorder = |product: &&'static str, _: i64, data: Option<&Value>| -> CartResult<()> {
            seen.borrow_mut().push((*product, data.cloned()));
            Ok(())
        };

        let mut cart: Cart<&'static str, Value, _> = Cart::with_checker(recorder);
        cart.add_line("P1", 1, Some(json!("gift")), false).unwrap();
        cart.add_line("P1", 1, Some(json!("gift")), false).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![("P1", Some(json!("gift"))), ("P1", Some(json!("gift")))]
        );
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn test_invalid_quantity_reported_before_check() {
        let calls = RefCell::new(0);
        let counter = |_: &&'static str, _: i64, _: Option<&Value>| -> CartResult<()> {
            *calls.borrow_mut() += 1;
            Ok(())
        };

        let mut cart: Cart<&'static str, Value, _> = Cart::with_checker(counter);
        assert!(cart.add_line("P1", -1, None, false).is_err());
        assert_eq!(*calls.borrow(), 0);
    }

    // -------------------------------------------------------------------------
    // Construction paths
    // -------------------------------------------------------------------------

    #[test]
    fn test_from_entries_normalizes_duplicates() {
        let cart = TestCart::from_entries(vec![
            ("P1", 2, None),
            ("P2", 1, None),
            ("P1", 5, None),
            ("P3", 0, None),
        ])
        .unwrap();

        assert_eq!(quantities(&cart), vec![("P1", 5), ("P2", 1)]);
        assert!(cart.is_modified());
    }

    #[test]
    fn test_from_entries_propagates_errors() {
        let result = TestCart::from_entries(vec![("P1", 2, None), ("P2", -1, None)]);
        assert!(matches!(result, Err(CartError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_restore_trusts_sequence() {
        let lines = vec![Line::new("P1", 1, None), Line::new("P1", 2, None)];
        let cart = TestCart::restore(lines);

        assert_eq!(cart.size(), 2);
        assert_eq!(cart.count(), 3);
        assert!(!cart.is_modified());
    }

    #[test]
    fn test_restore_checked_rejects_denormalized_state() {
        let lines = vec![Line::new("P1", 1, None), Line::new("P1", 2, None)];
        assert!(matches!(
            TestCart::restore_checked(lines),
            Err(CartError::CorruptState { index: 1, .. })
        ));

        let lines = vec![Line::new("P1", 1, None), Line::new("P2", 2, None)];
        let cart = TestCart::restore_checked(lines).unwrap();
        assert_eq!(cart.size(), 2);
        assert!(!cart.is_modified());
    }

    #[test]
    fn test_restore_checked_with_checker_keeps_checker() {
        let mut cart: Cart<&'static str, Value, QuantityLimit> =
            Cart::restore_checked_with_checker(
                vec![Line::new("P1", 2, None)],
                QuantityLimit::new(3),
            )
            .unwrap();
        assert!(!cart.is_modified());

        let err = cart.add_line("P1", 4, None, false).unwrap_err();
        assert!(matches!(err, CartError::QuantityRejected { .. }));
        assert_eq!(cart.count(), 2);

        let zero = vec![Line::new("P1", 0, None)];
        assert!(matches!(
            Cart::<&'static str, Value, _>::restore_checked_with_checker(zero, QuantityLimit::new(3)),
            Err(CartError::CorruptState { index: 0, .. })
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut cart: Cart<String> = Cart::new();
        cart.add_line("P2".to_string(), 1, None, false).unwrap();
        cart.add_line("P1".to_string(), 2, Some(json!({"size": "M"})), false)
            .unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json, json!([["P2", 1, null], ["P1", 2, {"size": "M"}]]));

        let restored: Cart<String> = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.count(), cart.count());
        assert_eq!(restored.size(), cart.size());
        assert!(!restored.is_modified());
        assert_eq!(restored.into_lines(), cart.into_lines());
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    #[test]
    fn test_total_delegates_to_products() {
        let coke = CatalogProduct::new("COKE-330", "Coca-Cola 330ml", 199);
        let chips = CatalogProduct::new("CHIPS-50", "Chips 50g", 349);

        let mut cart: Cart<CatalogProduct> = Cart::new();
        cart.add_line(coke.clone(), 3, None, false).unwrap();
        cart.add_line(chips, 1, None, false).unwrap();

        let ctx = PriceContext::new();
        assert_eq!(cart.total(&ctx), Money::from_cents(3 * 199 + 349));
        assert_eq!(
            cart.find_line(&coke, None).map(|l| l.price_per_unit(&ctx)),
            Some(Money::from_cents(199))
        );

        let empty: Cart<CatalogProduct> = Cart::new();
        assert!(empty.total(&ctx).is_zero());
    }

    #[test]
    fn test_total_saturates_at_largest_quantity() {
        let big = CatalogProduct::new("BIG", "Big", 3_000_000_000);
        let mut cart: Cart<CatalogProduct> = Cart::new();
        cart.add_line(big.clone(), i64::from(u32::MAX), None, false)
            .unwrap();
        cart.add_line(big, 1, Some(json!("gift")), false).unwrap();

        assert_eq!(cart.total(&PriceContext::new()), Money::from_cents(i64::MAX));
    }

    // -------------------------------------------------------------------------
    // Properties over every short operation sequence
    // -------------------------------------------------------------------------

    type Op = (&'static str, Option<Value>, i64, bool);

    fn all_ops() -> Vec<Op> {
        let mut ops = Vec::new();
        for product in ["P1", "P2"] {
            for data in [None, Some(json!("M"))] {
                for quantity in [-2, 0, 1, 3] {
                    for replace in [false, true] {
                        ops.push((product, data.clone(), quantity, replace));
                    }
                }
            }
        }
        ops
    }

    #[test]
    fn test_invariants_hold_for_all_sequences() {
        let ops = all_ops();
        for a in &ops {
            for b in &ops {
                for c in &ops {
                    let mut cart = TestCart::new();
                    for (product, data, quantity, replace) in [a, b, c] {
                        let before = cart.clone();
                        let result = cart.add_line(*product, *quantity, data.clone(), *replace);
                        if result.is_err() {
                            assert_eq!(cart, before);
                        }
                        assert_invariants(&cart);
                    }
                }
            }
        }
    }

    #[test]
    fn test_replace_is_idempotent() {
        let ops = all_ops();
        for setup in &ops {
            for (product, data, quantity, _) in ops.iter().filter(|op| op.3) {
                let mut cart = TestCart::new();
                let (p, d, q, r) = setup;
                let _ = cart.add_line(*p, *q, d.clone(), *r);

                let once = cart.add_line(*product, *quantity, data.clone(), true);
                let after_once = cart.clone();
                let twice = cart.add_line(*product, *quantity, data.clone(), true);

                assert_eq!(once.is_ok(), twice.is_ok());
                assert_eq!(cart, after_once);
            }
        }
    }
}
