//! Display-ready snapshot published to consumers.

use crate::book::{AggregatedLevel, DepthBook, DepthTotals, Spread};
use crate::market::{BucketSize, Symbol};
use crate::trades::{ProcessedTrade, TradeBuffer};

/// Everything a presentation layer needs to draw the ladder and the tape.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthView {
    pub symbol: Symbol,
    pub bucket_size: BucketSize,
    /// `true` while subscribed to a live connection.
    pub connected: bool,
    /// Fixed-length bid window, best bid first.
    pub bids: Vec<Option<AggregatedLevel>>,
    /// Fixed-length ask window, best ask last.
    pub asks: Vec<Option<AggregatedLevel>>,
    pub spread: Option<Spread>,
    pub max_bid_total: DepthTotals,
    pub max_ask_total: DepthTotals,
    /// Recent trades, newest batch first.
    pub trades: Vec<ProcessedTrade>,
}

impl DepthView {
    pub fn new(book: &DepthBook, trades: &TradeBuffer, connected: bool) -> Self {
        Self {
            symbol: book.symbol().clone(),
            bucket_size: book.bucket_size(),
            connected,
            bids: book.bids().to_vec(),
            asks: book.asks().to_vec(),
            spread: book.spread(),
            max_bid_total: book.max_bid_total(),
            max_ask_total: book.max_ask_total(),
            trades: trades.trades().cloned().collect(),
        }
    }

    pub fn best_bid(&self) -> Option<&AggregatedLevel> {
        self.bids.first().and_then(Option::as_ref)
    }

    pub fn best_ask(&self) -> Option<&AggregatedLevel> {
        self.asks.last().and_then(Option::as_ref)
    }
}
