//! # Cart Configuration
//!
//! Settings a host application hands to the cart layer at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SATCHEL_SESSION_KEY=shop_cart                                      │
//! │     SATCHEL_MAX_LINE_QUANTITY=999                                      │
//! │                                                                         │
//! │  2. TOML Config File (path chosen by the host app)                     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     session_key = "cart", no quantity limit                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # satchel.toml
//! session_key = "cart"
//! max_line_quantity = 999
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::quota::QuantityLimit;
use crate::SESSION_KEY;

/// Environment variable overriding [`CartConfig::session_key`].
pub const ENV_SESSION_KEY: &str = "SATCHEL_SESSION_KEY";

/// Environment variable overriding [`CartConfig::max_line_quantity`].
pub const ENV_MAX_LINE_QUANTITY: &str = "SATCHEL_MAX_LINE_QUANTITY";

/// Cart layer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Session key the cart blob is stored under.
    #[serde(default = "default_session_key")]
    pub session_key: String,

    /// Largest quantity a single add may request. `None` means no limit.
    #[serde(default)]
    pub max_line_quantity: Option<u32>,
}

fn default_session_key() -> String {
    SESSION_KEY.to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            session_key: default_session_key(),
            max_line_quantity: None,
        }
    }
}

impl CartConfig {
    /// Loads configuration from an optional file, then applies environment
    /// overrides.
    ///
    /// ## Priority
    /// 1. Environment variables
    /// 2. Config file (if given and present)
    /// 3. Defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |name| std::env::var(name).ok())
    }

    /// [`CartConfig::load`] with overrides read from `lookup` instead of the
    /// process environment.
    pub fn load_with<F>(config_path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_path {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading cart config");
                let contents = std::fs::read_to_string(path)?;
                Self::from_toml(&contents)?
            }
            Some(path) => {
                debug!(path = %path.display(), "Cart config file not found, using defaults");
                CartConfig::default()
            }
            None => CartConfig::default(),
        };

        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text. No environment overrides.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: CartConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid {
            field: "config".to_string(),
            reason: e.to_string(),
        })
    }

    /// Checks values that parse fine but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "session_key".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.max_line_quantity == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_line_quantity".to_string(),
                reason: "must be positive (omit it to disable the limit)".to_string(),
            });
        }

        Ok(())
    }

    /// The quantity check matching `max_line_quantity`.
    ///
    /// `None` behaves like [`AllowAll`](crate::quota::AllowAll) when used as a
    /// cart's checker.
    pub fn quantity_limit(&self) -> Option<QuantityLimit> {
        self.max_line_quantity.map(QuantityLimit::new)
    }

    /// Applies overrides from any variable source.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_SESSION_KEY) {
            debug!(session_key = %key, "Overriding session key from environment");
            self.session_key = key;
        }

        if let Some(max) = lookup(ENV_MAX_LINE_QUANTITY) {
            match max.trim().parse::<u32>() {
                Ok(parsed) => self.max_line_quantity = Some(parsed),
                Err(_) => warn!(value = %max, "Ignoring invalid {}", ENV_MAX_LINE_QUANTITY),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
