//! # Error Types
//!
//! Domain-specific error types for satchel-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  satchel-core errors (this file)                                       │
//! │  ├── CartError    - Line-management rule violations                    │
//! │  └── ConfigError  - Configuration loading failures                     │
//! │                                                                         │
//! │  Collaborator errors (outside this crate)                              │
//! │  └── Session store, inventory service, web layer                       │
//! │                                                                         │
//! │  Flow: QuantityCheck → CartError → caller (no local recovery)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (quantities, reasons)
//! 3. "Not found" is never an error: lookups return `Option`
//! 4. Every failing cart operation leaves the cart untouched

use thiserror::Error;

// =============================================================================
// Cart Error
// =============================================================================

/// Cart line-management errors.
///
/// These are business-rule violations surfaced immediately to the caller.
/// None of them is transient, so nothing here is ever retried.
#[derive(Debug, Error)]
pub enum CartError {
    /// The resulting line quantity would be negative.
    ///
    /// ## When This Occurs
    /// ```text
    /// Line (P1, qty: 3)
    ///      │
    ///      ▼
    /// add_line(P1, -5)          → resulting = 3 + (-5) = -2
    ///      │
    ///      ▼
    /// InvalidQuantity { quantity: -5, resulting: -2 }
    ///      │
    ///      ▼
    /// Line stays at qty 3
    /// ```
    #[error("{quantity} is not a valid quantity (resulting quantity would be {resulting})")]
    InvalidQuantity { quantity: i64, resulting: i64 },

    /// The resulting line quantity does not fit the quantity type.
    #[error("Quantity {resulting} exceeds the largest representable line quantity ({max})")]
    QuantityOverflow { resulting: i64, max: u32 },

    /// The injected quantity check vetoed the change.
    ///
    /// ## When This Occurs
    /// - Stock lookup reports fewer units than requested
    /// - A per-line quota is configured and the delta exceeds it
    #[error("Quantity {requested} rejected: {reason}")]
    QuantityRejected { requested: i64, reason: String },

    /// A stored line sequence broke a cart invariant.
    ///
    /// Only raised by checked restoration; plain restoration trusts its input.
    #[error("Corrupt cart state at line {index}: {reason}")]
    CorruptState { index: usize, reason: String },

    /// The session blob could not be encoded or decoded.
    #[error("Cart serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`crate::config::CartConfig`].
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not acceptable.
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================
