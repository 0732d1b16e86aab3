//! Client-side depth aggregation.
//!
//! This module is organized leaf-first:
//! - [`quantize`] - Raw price to bucket price
//! - [`aggregate`] - Bucketing, cumulative totals, novelty flags
//! - [`window`] - Fixed-length display windows and spread
//! - [`engine`] - Per-symbol state tying the above together

pub mod aggregate;
pub mod engine;
pub mod quantize;
pub mod window;

use rust_decimal::Decimal;

use crate::market::Denomination;

pub use aggregate::{Aggregation, aggregate};
pub use engine::DepthBook;
pub use quantize::quantize;
pub use window::{Spread, project, project_asks, spread};

/// Side of the book a level rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

/// One display row: all raw levels that fall into a bucket, plus the depth
/// accumulated from the best bucket down to this one.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedLevel {
    /// Bucket price.
    pub price: Decimal,
    pub size: Decimal,
    /// Size expressed in quote currency.
    pub notional: Decimal,
    /// Cumulative size from the best bucket through this one.
    pub total: Decimal,
    pub total_notional: Decimal,
    /// Bucket price formatted to the bucket size's decimals.
    pub display_price: String,
    /// `true` when this bucket was absent from the previous cycle.
    pub is_new: bool,
}

impl AggregatedLevel {
    pub fn size_in(&self, denomination: Denomination) -> Decimal {
        match denomination {
            Denomination::Asset => self.size,
            Denomination::Quote => self.notional,
        }
    }

    pub fn total_in(&self, denomination: Denomination) -> Decimal {
        match denomination {
            Denomination::Asset => self.total,
            Denomination::Quote => self.total_notional,
        }
    }
}

/// Largest cumulative depth in a window, in both denominations.
///
/// Consumers scale depth bars against this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepthTotals {
    pub asset: Decimal,
    pub quote: Decimal,
}

impl DepthTotals {
    /// Folds the cumulative totals of every occupied slot.
    pub fn of<'a>(window: impl IntoIterator<Item = &'a Option<AggregatedLevel>>) -> Self {
        window
            .into_iter()
            .flatten()
            .fold(Self::default(), |acc, level| Self {
                asset: acc.asset.max(level.total),
                quote: acc.quote.max(level.total_notional),
            })
    }

    pub fn get(&self, denomination: Denomination) -> Decimal {
        match denomination {
            Denomination::Asset => self.asset,
            Denomination::Quote => self.quote,
        }
    }
}
