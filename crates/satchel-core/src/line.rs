//! # Cart Lines
//!
//! A [`Line`] binds a product, a quantity and an optional opaque payload.
//!
//! ## Identity vs Equality
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Line { product: P1, quantity: 2, data: Some({"size": "M"}) }           │
//! │         └────────────────────────────┬──────────────┘                   │
//! │                    identity key inside a Cart: (product, data)          │
//! │                                                                         │
//! │  Line == Line  ⇔  product, quantity AND data are all equal              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are only ever built and mutated by [`Cart`](crate::cart::Cart).
//! There is no public quantity setter: changing a quantity behind the cart's
//! back would skip the merge and pruning rules.
//!
//! ## Persisted Form
//! A line serializes as the bare triple `[product, quantity, data]`.
//!
//! ```rust
//! use satchel_core::line::Line;
//!
//! let line: Line<String, String> = Line::new("P1".to_string(), 3, None);
//! assert_eq!(serde_json::to_string(&line).unwrap(), r#"["P1",3,null]"#);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Mul;

use crate::product::{PriceContext, Product};

/// One `(product, quantity, data)` entry of a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<P, D = serde_json::Value> {
    product: P,
    quantity: u32,
    data: Option<D>,
}

impl<P, D> Line<P, D> {
    /// Builds a detached line.
    ///
    /// A detached line is just a value; it joins a cart only through the
    /// cart's own operations.
    pub fn new(product: P, quantity: u32, data: Option<D>) -> Self {
        Line {
            product,
            quantity,
            data,
        }
    }

    pub fn product(&self) -> &P {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    /// Splits the line back into its persisted triple.
    pub fn into_parts(self) -> (P, u32, Option<D>) {
        (self.product, self.quantity, self.data)
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

impl<P: PartialEq, D: PartialEq> Line<P, D> {
    /// True when this line holds `(product, data)`.
    pub fn matches(&self, product: &P, data: Option<&D>) -> bool {
        self.product == *product && self.data.as_ref() == data
    }
}

impl<P: Product, D> Line<P, D> {
    /// Unit price, looked up from the product on every call.
    pub fn price_per_unit(&self, context: &PriceContext) -> P::Price {
        self.product.price(context)
    }

    /// Unit price times quantity.
    pub fn total(&self, context: &PriceContext) -> P::Price
    where
        P::Price: Mul<u32, Output = P::Price>,
    {
        self.price_per_unit(context) * self.quantity
    }
}

impl<P: Serialize, D: Serialize> Serialize for Line<P, D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.product, self.quantity, &self.data).serialize(serializer)
    }
}

impl<'de, P, D> Deserialize<'de> for Line<P, D>
where
    P: Deserialize<'de>,
    D: Deserialize<'de>,
{
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let (product, quantity, data) = <(P, u32, Option<D>)>::deserialize(deserializer)?;
        Ok(Line::new(product, quantity, data))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
