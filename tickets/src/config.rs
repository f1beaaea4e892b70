//! Configuration for the ticket issuer.
//!
//! Values come from environment variables, with defaults for everything:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `TICKET_QR_SIZE_PX` | `256` | Image width/height in pixels (21 to 4096) |
//! | `TICKET_QR_MARGIN_MODULES` | `1` | Light border in modules (at most 16) |
//! | `TICKET_QR_EC_LEVEL` | `M` | Error correction: `L`, `M`, `Q` or `H` |
//! | `TICKET_SHUTDOWN_TIMEOUT_SECS` | `5` | Wait for in-flight encodes on shutdown |
//! | `RUST_LOG` | `info` | Log filter |
//!
//! # Example
//!
//! ```no_run
//! use eventhub_tickets::config::TicketsConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TicketsConfig::from_env()?;
//! println!("QR size: {}px", config.qr.size_px);
//! # Ok(())
//! # }
//! ```

use crate::encoder::{EncodeOptions, ErrorCorrection, MAX_SIZE_PX};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Smallest canvas that can hold a version 1 symbol.
pub const MIN_SIZE_PX: u32 = 21;

/// Largest accepted margin.
pub const MAX_MARGIN_MODULES: u32 = 16;

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable could not be parsed
    #[error("{var} has invalid value {value:?}: {reason}")]
    Parse {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A parsed value is out of range
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// QR rendering configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrConfig {
    /// Image width and height in pixels
    pub size_px: u32,
    /// Light border in modules
    pub margin_modules: u32,
    /// Error correction level
    pub error_correction: ErrorCorrection,
}

impl QrConfig {
    /// Validate QR configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_px < MIN_SIZE_PX {
            return Err(ConfigError::Validation(format!(
                "size_px must be at least {MIN_SIZE_PX}, got {}",
                self.size_px
            )));
        }
        if self.size_px > MAX_SIZE_PX {
            return Err(ConfigError::Validation(format!(
                "size_px must be at most {MAX_SIZE_PX}, got {}",
                self.size_px
            )));
        }
        if self.margin_modules > MAX_MARGIN_MODULES {
            return Err(ConfigError::Validation(format!(
                "margin_modules must be at most {MAX_MARGIN_MODULES}, got {}",
                self.margin_modules
            )));
        }
        Ok(())
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        let options = EncodeOptions::default();
        Self {
            size_px: options.size_px,
            margin_modules: options.margin_modules,
            error_correction: options.error_correction,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketsConfig {
    /// QR rendering
    pub qr: QrConfig,
    /// How long shutdown waits for in-flight encodes
    pub shutdown_timeout_secs: u64,
    /// Log filter directive
    pub log_level: String,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            qr: QrConfig::default(),
            shutdown_timeout_secs: 5,
            log_level: "info".to_string(),
        }
    }
}

impl TicketsConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is malformed or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is malformed or out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            qr: QrConfig {
                size_px: parse_var(&lookup, "TICKET_QR_SIZE_PX", defaults.qr.size_px)?,
                margin_modules: parse_var(
                    &lookup,
                    "TICKET_QR_MARGIN_MODULES",
                    defaults.qr.margin_modules,
                )?,
                error_correction: parse_var(
                    &lookup,
                    "TICKET_QR_EC_LEVEL",
                    defaults.qr.error_correction,
                )?,
            },
            shutdown_timeout_secs: parse_var(
                &lookup,
                "TICKET_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout_secs,
            )?,
            log_level: lookup("RUST_LOG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate all sections
    ///
    /// # Errors
    ///
    /// Returns error if any section is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.qr.validate()
    }

    /// Rendering options for the issuer environment
    #[must_use]
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            size_px: self.qr.size_px,
            margin_modules: self.qr.margin_modules,
            error_correction: self.qr.error_correction,
        }
    }

    /// Shutdown timeout as Duration
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
