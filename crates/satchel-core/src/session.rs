//! # Session Blob
//!
//! Moves a [`Cart`] in and out of a session's key/value map.
//!
//! ## Save/Load Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request start                                                          │
//! │     load(session, "cart") ── absent → None (caller builds Cart::new())  │
//! │        │                                                                │
//! │        ▼  state restoration, modified = false                           │
//! │  handler mutates the cart (add_line, remove_line, ...)                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  store_if_modified(session, "cart", &mut cart)                          │
//! │     modified? ── no → nothing written                                   │
//! │        │ yes                                                            │
//! │        ▼                                                                │
//! │  session["cart"] = [[product, quantity, data], ...]; mark_clean()       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Where the map lives (cookie, Redis, database row) and when it is flushed is
//! up to the session layer.
//!
//! ## Example
//! ```rust
//! use satchel_core::cart::Cart;
//! use satchel_core::session::{self, SessionMap};
//! use satchel_core::SESSION_KEY;
//!
//! let mut session = SessionMap::new();
//! let mut cart: Cart<String> = Cart::new();
//! cart.add_line("P1".to_string(), 2, None, false).unwrap();
//!
//! assert!(session::store_if_modified(&mut session, SESSION_KEY, &mut cart).unwrap());
//! assert!(!session::store_if_modified(&mut session, SESSION_KEY, &mut cart).unwrap());
//!
//! let loaded: Cart<String> = session::load(&session, SESSION_KEY).unwrap().unwrap();
//! assert_eq!(loaded, cart);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::cart::Cart;
use crate::error::CartResult;
use crate::line::Line;

/// A session's key/value storage as seen by this crate.
pub type SessionMap = Map<String, Value>;

/// Writes the cart under `key` and marks it clean.
pub fn store<P, D, Q>(
    session: &mut SessionMap,
    key: &str,
    cart: &mut Cart<P, D, Q>,
) -> CartResult<()>
where
    P: Serialize,
    D: Serialize,
{
    let blob = serde_json::to_value(&*cart)?;
    session.insert(key.to_string(), blob);
    cart.mark_clean();
    debug!(key, lines = cart.size(), "Stored cart in session");
    Ok(())
}

/// Writes the cart only if it is modified. Returns whether it wrote.
pub fn store_if_modified<P, D, Q>(
    session: &mut SessionMap,
    key: &str,
    cart: &mut Cart<P, D, Q>,
) -> CartResult<bool>
where
    P: Serialize,
    D: Serialize,
{
    if !cart.is_modified() {
        return Ok(false);
    }
    store(session, key, cart)?;
    Ok(true)
}

/// Restores the cart stored under `key`, or `None` if there is none.
///
/// This is state restoration: the stored sequence is trusted as-is.
pub fn load<P, D, Q>(session: &SessionMap, key: &str) -> CartResult<Option<Cart<P, D, Q>>>
where
    P: DeserializeOwned,
    D: DeserializeOwned,
    Q: Default,
{
    load_with_checker(session, key, Q::default())
}

/// [`load`] for carts whose quantity check has no default, such as an
/// inventory lookup or a closure. The checker is attached to the restored
/// cart and consulted on every later change.
pub fn load_with_checker<P, D, Q>(
    session: &SessionMap,
    key: &str,
    checker: Q,
) -> CartResult<Option<Cart<P, D, Q>>>
where
    P: DeserializeOwned,
    D: DeserializeOwned,
{
    let Some(blob) = session.get(key) else {
        return Ok(None);
    };

    let lines = Vec::<Line<P, D>>::deserialize(blob)?;
    let cart = Cart::restore_with_checker(lines, checker);
    debug!(key, lines = cart.size(), "Loaded cart from session");
    Ok(Some(cart))
}

/// Loads the stored cart, or starts a new one.
pub fn load_or_new<P, D, Q>(session: &SessionMap, key: &str) -> CartResult<Cart<P, D, Q>>
where
    P: DeserializeOwned,
    D: DeserializeOwned,
    Q: Default,
{
    load_or_new_with_checker(session, key, Q::default())
}

/// [`load_or_new`] with an explicit quantity check.
pub fn load_or_new_with_checker<P, D, Q>(
    session: &SessionMap,
    key: &str,
    checker: Q,
) -> CartResult<Cart<P, D, Q>>
where
    P: DeserializeOwned,
    D: DeserializeOwned,
{
    let Some(blob) = session.get(key) else {
        return Ok(Cart::with_checker(checker));
    };

    let lines = Vec::<Line<P, D>>::deserialize(blob)?;
    let cart = Cart::restore_with_checker(lines, checker);
    debug!(key, lines = cart.size(), "Loaded cart from session");
    Ok(cart)
}

// =============================================================================
// Unit Tests
// =============================================================================
