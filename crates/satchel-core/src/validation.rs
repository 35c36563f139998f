//! # Validation Module
//!
//! Quantity arithmetic and invariant checks shared by the cart operations.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: resulting_quantity()  ← every add_line call                  │
//! │  ├── replace → target, merge → existing + delta                        │
//! │  ├── negative → InvalidQuantity                                        │
//! │  └── > u32::MAX → QuantityOverflow                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: QuantityCheck (injected, see quota.rs)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: validate_lines()  ← checked restoration only                 │
//! │  ├── every line quantity > 0                                           │
//! │  └── no two lines share (product, data)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use satchel_core::validation::resulting_quantity;
//!
//! assert_eq!(resulting_quantity(3, 2, false).unwrap(), 5);
//! assert_eq!(resulting_quantity(5, 5, true).unwrap(), 5);
//! assert!(resulting_quantity(3, -5, false).is_err());
//! ```

use crate::error::{CartError, CartResult};
use crate::line::Line;

/// Computes the quantity a line ends up with after an add.
///
/// ## Rules
/// - `replace == true`: the result is `quantity`
/// - `replace == false`: the result is `existing + quantity`
/// - a negative result fails with [`CartError::InvalidQuantity`]
/// - a result above `u32::MAX` fails with [`CartError::QuantityOverflow`]
///
/// Zero is a valid result; it means "drop the line".
pub fn resulting_quantity(existing: u32, quantity: i64, replace: bool) -> CartResult<u32> {
    let resulting = if replace {
        quantity
    } else {
        i64::from(existing).saturating_add(quantity)
    };

    if resulting < 0 {
        return Err(CartError::InvalidQuantity {
            quantity,
            resulting,
        });
    }

    u32::try_from(resulting).map_err(|_| CartError::QuantityOverflow {
        resulting,
        max: u32::MAX,
    })
}

/// Verifies a stored line sequence against both cart invariants.
///
/// ## Rules
/// - No line may have quantity zero
/// - No two lines may share `(product, data)`
///
/// Reports the first offending index. Quadratic in the number of lines,
/// which is fine for cart-sized inputs and needs nothing beyond `PartialEq`.
pub fn validate_lines<P: PartialEq, D: PartialEq>(lines: &[Line<P, D>]) -> CartResult<()> {
    for (index, line) in lines.iter().enumerate() {
        if line.quantity() == 0 {
            return Err(CartError::CorruptState {
                index,
                reason: "line has zero quantity".to_string(),
            });
        }

        let earlier = lines
            .iter()
            .take(index)
            .position(|other| other.matches(line.product(), line.data()));
        if let Some(first) = earlier {
            return Err(CartError::CorruptState {
                index,
                reason: format!("duplicates the product and data of line {}", first),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
