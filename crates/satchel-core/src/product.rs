//! # Product Capability
//!
//! What a cart needs from a catalog entity, and nothing more.
//!
//! ## Capability Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Product (trait)                                    │
//! │                                                                         │
//! │   PartialEq ─────────► line identity: (product, data)                   │
//! │                                                                         │
//! │   price(&PriceContext) ─► Self::Price                                   │
//! │        ▲                                                                │
//! │        │ forwarded untouched by Line::price_per_unit                    │
//! │   PriceContext { "currency": "EUR", "customer": 42, ... }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Equality is the product's own business: compare by ID, by SKU, or
//! structurally. Carts only call `==`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::money::Money;

// =============================================================================
// Product Trait
// =============================================================================

/// A catalog entity that can sit in a cart line.
pub trait Product: PartialEq {
    /// Whatever the catalog uses as a price.
    type Price;

    /// Looks up the unit price under the given pricing context.
    ///
    /// Called on every request; carts never cache the result.
    fn price(&self, context: &PriceContext) -> Self::Price;
}

// =============================================================================
// Price Context
// =============================================================================

/// Open-ended bundle of pricing inputs (currency, customer, channel, ...).
///
/// Keys are free-form; values are JSON so any collaborator can put anything
/// in without this crate knowing about it.
///
/// ## Example
/// ```rust
/// use satchel_core::product::PriceContext;
///
/// let ctx = PriceContext::new()
///     .with("currency", "EUR")
///     .with("customer_id", 42);
///
/// assert_eq!(ctx.get_str("currency"), Some("EUR"));
/// assert_eq!(ctx.get_i64("customer_id"), Some(42));
/// assert!(ctx.get("channel").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceContext(Map<String, Value>);

impl PriceContext {
    /// An empty context.
    pub fn new() -> Self {
        PriceContext(Map::new())
    }

    /// Adds (or replaces) an entry, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds (or replaces) an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value lookup; `None` when absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Integer value lookup; `None` when absent or not an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for PriceContext {
    fn from(map: Map<String, Value>) -> Self {
        PriceContext(map)
    }
}

// =============================================================================
// Catalog Product
// =============================================================================

/// A minimal product: a SKU and a fixed price.
///
/// Equality is by SKU only, so two snapshots of the same catalog entry taken
/// at different prices still land on the same cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,
}

impl CatalogProduct {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, price_cents: i64) -> Self {
        CatalogProduct {
            sku: sku.into(),
            name: name.into(),
            price_cents,
        }
    }
}

impl PartialEq for CatalogProduct {
    fn eq(&self, other: &Self) -> bool {
        self.sku == other.sku
    }
}

impl Eq for CatalogProduct {}

impl Product for CatalogProduct {
    type Price = Money;

    /// Fixed price; the context is ignored.
    fn price(&self, _context: &PriceContext) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
