//! # satchel-core: Shopping Cart Line Management
//!
//! This crate is the **heart** of Satchel: the rules that keep a shopping
//! cart consistent while lines are merged, replaced and removed.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Satchel Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Web layer / session middleware (host app)          │   │
//! │  │    load cart ──► handle request ──► store cart if modified      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ satchel-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   cart    │  │   line    │  │   quota   │  │  session  │  │   │
//! │  │   │   Cart    │  │   Line    │  │ Quantity- │  │  blob in  │  │   │
//! │  │   │ LineEntry │  │           │  │   Check   │  │  "cart"   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO SESSION I/O • NO PRICING RULES • SINGLE-THREADED           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Product::price / QuantityCheck         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          Catalog, inventory service (collaborators)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cart`] - `Cart`: ordered, duplicate-free lines and the add/remove rules
//! - [`line`] - `Line`: one (product, quantity, data) entry
//! - [`product`] - `Product` capability, `PriceContext`, `CatalogProduct`
//! - [`quota`] - `QuantityCheck` strategies consulted before every change
//! - [`validation`] - quantity arithmetic and invariant checks
//! - [`session`] - storing a cart in a session map
//! - [`config`] - `CartConfig` from TOML and environment
//! - [`money`] - integer-cents `Money`
//! - [`error`] - domain error types
//!
//! ## Design Principles
//!
//! 1. **Cart is the only mutation entry point**: lines have no public setters
//! 2. **Fail before mutating**: a rejected change leaves the cart untouched
//! 3. **Absence is not an error**: lookups return `Option`
//! 4. **Injected policy**: stock and quota rules arrive as a `QuantityCheck`
//!
//! ## Example Usage
//!
//! ```rust
//! use satchel_core::{Cart, CatalogProduct, Money, PriceContext};
//! use serde_json::json;
//!
//! let tee = CatalogProduct::new("TEE-01", "T-Shirt", 1500);
//!
//! let mut cart: Cart<CatalogProduct> = Cart::new();
//! cart.add_line(tee.clone(), 2, Some(json!({"size": "M"})), false).unwrap();
//! cart.add_line(tee.clone(), 1, Some(json!({"size": "L"})), false).unwrap();
//!
//! assert_eq!(cart.size(), 2);
//! assert_eq!(cart.count(), 3);
//! assert_eq!(cart.total(&PriceContext::new()), Money::from_cents(4500));
//!
//! // 2 + (-5) would go negative: rejected, cart unchanged
//! assert!(cart.add_line(tee.clone(), -5, Some(json!({"size": "M"})), false).is_err());
//! assert_eq!(cart.count(), 3);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod config;
pub mod error;
pub mod line;
pub mod money;
pub mod product;
pub mod quota;
pub mod session;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, LineEntry};
pub use config::CartConfig;
pub use error::{CartError, CartResult, ConfigError};
pub use line::Line;
pub use money::Money;
pub use product::{CatalogProduct, PriceContext, Product};
pub use quota::{AllowAll, QuantityCheck, QuantityLimit};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Conventional session key a cart is stored under.
pub const SESSION_KEY: &str = "cart";
