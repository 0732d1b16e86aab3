//! Per-symbol depth state.
//!
//! [`DepthBook`] owns the known-price memory for exactly one
//! (symbol, bucket size) pair. Changing either replaces the memory wholesale,
//! so nothing from a previous symbol or bucketing ever leaks into the next.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tracing::debug;

use super::{AggregatedLevel, DepthTotals, Side, Spread, aggregate, project, project_asks, spread};
use crate::market::{BucketSize, Symbol};
use crate::models::book::BookSnapshot;

/// Bucket prices seen in the previous cycle, for one (symbol, bucket size).
#[derive(Debug, Clone)]
struct PriceMemory {
    symbol: Symbol,
    bucket_size: BucketSize,
    bids: BTreeSet<Decimal>,
    asks: BTreeSet<Decimal>,
    /// Set until the first non-empty snapshot after a reset.
    suppress_novelty: bool,
}

impl PriceMemory {
    fn new(symbol: Symbol, bucket_size: BucketSize) -> Self {
        Self {
            symbol,
            bucket_size,
            bids: BTreeSet::new(),
            asks: BTreeSet::new(),
            suppress_novelty: true,
        }
    }
}

/// Bucketed, windowed view of one symbol's book.
#[derive(Debug, Clone)]
pub struct DepthBook {
    rows: usize,
    memory: PriceMemory,
    bids: Vec<Option<AggregatedLevel>>,
    asks: Vec<Option<AggregatedLevel>>,
    spread: Option<Spread>,
    max_bid_total: DepthTotals,
    max_ask_total: DepthTotals,
    /// Feed timestamp of the last applied snapshot.
    last_update: Option<i64>,
}

impl DepthBook {
    /// Creates an empty book showing `rows` levels per side.
    pub fn new(symbol: Symbol, bucket_size: BucketSize, rows: usize) -> Self {
        Self {
            rows,
            memory: PriceMemory::new(symbol, bucket_size),
            bids: vec![None; rows],
            asks: vec![None; rows],
            spread: None,
            max_bid_total: DepthTotals::default(),
            max_ask_total: DepthTotals::default(),
            last_update: None,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.memory.symbol
    }

    pub fn bucket_size(&self) -> BucketSize {
        self.memory.bucket_size
    }

    /// Bid window, best bid first.
    pub fn bids(&self) -> &[Option<AggregatedLevel>] {
        &self.bids
    }

    /// Ask window, best ask last.
    pub fn asks(&self) -> &[Option<AggregatedLevel>] {
        &self.asks
    }

    pub fn spread(&self) -> Option<Spread> {
        self.spread
    }

    pub fn max_bid_total(&self) -> DepthTotals {
        self.max_bid_total
    }

    pub fn max_ask_total(&self) -> DepthTotals {
        self.max_ask_total
    }

    pub fn last_update(&self) -> Option<i64> {
        self.last_update
    }

    /// Aggregates a snapshot into the view.
    ///
    /// Returns `false` without touching any state if the snapshot belongs to
    /// a different symbol.
    pub fn apply_snapshot(&mut self, snapshot: &BookSnapshot) -> bool {
        if self.memory.symbol != snapshot.coin.as_str() {
            debug!(
                expected = %self.memory.symbol,
                received = %snapshot.coin,
                "Discarding stale book snapshot"
            );
            return false;
        }

        let memory = &mut self.memory;
        let suppress = memory.suppress_novelty;
        let bids = aggregate(
            snapshot.bids(),
            memory.bucket_size,
            Side::Bid,
            &memory.bids,
            suppress,
        );
        let asks = aggregate(
            snapshot.asks(),
            memory.bucket_size,
            Side::Ask,
            &memory.asks,
            suppress,
        );

        memory.bids = bids.known_prices;
        memory.asks = asks.known_prices;
        if !snapshot.is_empty() {
            memory.suppress_novelty = false;
        }

        self.spread = spread(&bids.levels, &asks.levels);
        self.bids = project(&bids.levels, self.rows);
        self.asks = project_asks(&asks.levels, self.rows);
        self.max_bid_total = DepthTotals::of(&self.bids);
        self.max_ask_total = DepthTotals::of(&self.asks);
        self.last_update = Some(snapshot.time);

        debug!(
            symbol = %snapshot.coin,
            bid_buckets = bids.levels.len(),
            ask_buckets = asks.levels.len(),
            skipped = bids.skipped + asks.skipped,
            "Book aggregated"
        );

        true
    }

    /// Switches to a new symbol and bucket size, discarding all state.
    pub fn reset(&mut self, symbol: Symbol, bucket_size: BucketSize) {
        *self = Self::new(symbol, bucket_size, self.rows);
    }

    /// Re-buckets the current symbol; the view stays empty until the next
    /// snapshot.
    pub fn set_bucket_size(&mut self, bucket_size: BucketSize) {
        let symbol = self.memory.symbol.clone();
        self.reset(symbol, bucket_size);
    }
}
