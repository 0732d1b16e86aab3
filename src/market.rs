//! Market identities and per-symbol display policy.
//!
//! [`MarketConfig`] holds the precision policy and default bucket size for
//! each symbol. It is either built in or loaded from a JSON file with
//! `defaults` plus per-symbol overrides; missing override fields inherit from
//! the defaults.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::DepthlineError;

/// A coin symbol as the feed tags it (e.g. `"BTC"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Price increment used to group raw levels into display rows.
///
/// Always at least [`BucketSize::MIN`], so quantizing never divides by zero
/// and tick counts stay well inside the decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct BucketSize(Decimal);

impl BucketSize {
    /// Smallest accepted step, `1e-12`.
    pub const MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 12);

    /// Validates a bucket step.
    ///
    /// # Errors
    ///
    /// Returns [`DepthlineError::InvalidBucketSize`] if `step` is below
    /// [`BucketSize::MIN`], zero or negative.
    pub fn new(step: Decimal) -> crate::Result<Self> {
        if step < Self::MIN {
            return Err(DepthlineError::InvalidBucketSize(step));
        }
        Ok(Self(step.normalize()))
    }

    pub fn get(&self) -> Decimal {
        self.0
    }

    /// Number of decimals needed to display a bucket price: `0` for steps of
    /// one or more, otherwise `|floor(log10(step))|`.
    pub fn display_decimals(&self) -> u32 {
        let mut scaled = self.0;
        let mut decimals = 0;
        while scaled < Decimal::ONE {
            scaled *= Decimal::TEN;
            decimals += 1;
        }
        decimals
    }
}

impl TryFrom<Decimal> for BucketSize {
    type Error = DepthlineError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for BucketSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which quantity a consumer wants sizes expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Denomination {
    /// Base-asset units.
    #[default]
    Asset,
    /// Quote-currency notional.
    Quote,
}

/// Per-symbol configuration, loaded from JSON or built in.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Settings applied to every symbol unless overridden.
    pub defaults: MarketSettings,
    #[serde(default)]
    pub symbols: HashMap<String, MarketOverrides>,
}

/// Complete settings for one symbol. All fields required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketSettings {
    /// Decimals used when formatting trade prices.
    pub price_decimals: u32,
    /// Bucket size selected when switching to the symbol.
    pub default_bucket: BucketSize,
}

/// Per-symbol overrides; missing fields inherit from defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketOverrides {
    pub price_decimals: Option<u32>,
    pub default_bucket: Option<BucketSize>,
}

impl MarketConfig {
    /// Loads a market configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DepthlineError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Returns the effective settings for a symbol.
    pub fn settings_for(&self, symbol: &Symbol) -> MarketSettings {
        match self.symbols.get(symbol.as_str()) {
            Some(overrides) => MarketSettings {
                price_decimals: overrides
                    .price_decimals
                    .unwrap_or(self.defaults.price_decimals),
                default_bucket: overrides
                    .default_bucket
                    .unwrap_or(self.defaults.default_bucket),
            },
            None => self.defaults.clone(),
        }
    }

    pub fn price_decimals(&self, symbol: &Symbol) -> u32 {
        self.settings_for(symbol).price_decimals
    }

    pub fn default_bucket(&self, symbol: &Symbol) -> BucketSize {
        self.settings_for(symbol).default_bucket
    }
}

impl Default for MarketConfig {
    /// BTC trades in whole-dollar buckets with integer prices, ETH in
    /// ten-cent buckets with two decimals.
    fn default() -> Self {
        let mut symbols = HashMap::new();
        symbols.insert(
            "BTC".to_string(),
            MarketOverrides {
                price_decimals: Some(0),
                default_bucket: Some(BucketSize(Decimal::ONE)),
            },
        );
        symbols.insert(
            "ETH".to_string(),
            MarketOverrides {
                price_decimals: Some(2),
                default_bucket: Some(BucketSize(Decimal::new(1, 1))),
            },
        );

        Self {
            defaults: MarketSettings {
                price_decimals: 2,
                default_bucket: BucketSize(Decimal::ONE),
            },
            symbols,
        }
    }
}
