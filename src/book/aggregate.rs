//! Bucketing of raw levels into cumulative display rows.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use tracing::warn;

use super::{AggregatedLevel, Side, quantize};
use crate::market::BucketSize;
use crate::models::book::RawLevel;
use crate::models::{format_decimal, parse_decimal};

/// Result of one aggregation cycle for one side of the book.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Buckets, best price first.
    pub levels: Vec<AggregatedLevel>,
    /// Bucket prices seen this cycle; the next cycle's known prices.
    pub known_prices: BTreeSet<Decimal>,
    /// Raw levels dropped because price or size did not parse, or because
    /// their depth overflowed the decimal range.
    pub skipped: usize,
}

#[derive(Default)]
struct Bucket {
    size: Decimal,
    notional: Decimal,
}

/// Groups raw levels into buckets of `step` and accumulates depth.
///
/// Bids come back in descending price order and asks in ascending order.
/// A bucket is flagged new when it is missing from `known_prices`, unless
/// `suppress_novelty` is set (first cycle after a reset).
pub fn aggregate(
    levels: &[RawLevel],
    step: BucketSize,
    side: Side,
    known_prices: &BTreeSet<Decimal>,
    suppress_novelty: bool,
) -> Aggregation {
    let mut buckets: BTreeMap<Decimal, Bucket> = BTreeMap::new();
    let mut side_size = Decimal::ZERO;
    let mut side_notional = Decimal::ZERO;
    let mut skipped = 0;

    for level in levels {
        let Some((price, size)) = parse_level(level) else {
            warn!(
                side = side.as_str(),
                px = %level.px,
                sz = %level.sz,
                "Dropping unparsable level"
            );
            skipped += 1;
            continue;
        };

        let accepted = quantize(price, step, side).and_then(|bucket_price| {
            let notional = size.checked_mul(price)?;
            Some((
                bucket_price,
                notional,
                side_size.checked_add(size)?,
                side_notional.checked_add(notional)?,
            ))
        });
        let Some((bucket_price, notional, next_size, next_notional)) = accepted else {
            warn!(
                side = side.as_str(),
                px = %level.px,
                sz = %level.sz,
                "Dropping level that overflows depth"
            );
            skipped += 1;
            continue;
        };
        side_size = next_size;
        side_notional = next_notional;

        // Sizes are non-negative, so no bucket or running total can exceed
        // the side totals checked above.
        let bucket = buckets.entry(bucket_price).or_default();
        bucket.size += size;
        bucket.notional += notional;
    }

    let mut ordered: Vec<_> = buckets.into_iter().collect();
    if side == Side::Bid {
        ordered.reverse();
    }

    let decimals = step.display_decimals();
    let mut total = Decimal::ZERO;
    let mut total_notional = Decimal::ZERO;
    let mut seen = BTreeSet::new();
    let mut aggregated = Vec::with_capacity(ordered.len());

    for (price, bucket) in ordered {
        total += bucket.size;
        total_notional += bucket.notional;
        seen.insert(price);

        aggregated.push(AggregatedLevel {
            price,
            size: bucket.size,
            notional: bucket.notional,
            total,
            total_notional,
            display_price: format_decimal(price, decimals),
            is_new: !suppress_novelty && !known_prices.contains(&price),
        });
    }

    Aggregation {
        levels: aggregated,
        known_prices: seen,
        skipped,
    }
}

/// Parses price and size, rejecting negative values.
fn parse_level(level: &RawLevel) -> Option<(Decimal, Decimal)> {
    let price = parse_decimal(&level.px)?;
    let size = parse_decimal(&level.sz)?;
    if price.is_sign_negative() || size.is_sign_negative() {
        return None;
    }
    Some((price, size))
}
