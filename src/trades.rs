//! Bounded, newest-first trade tape.

use std::collections::VecDeque;

use chrono::DateTime;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::market::{Denomination, Symbol};
use crate::models::{format_decimal, parse_decimal};
use crate::models::trade::TradeEvent;

/// Aggressor side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Maps the feed's side code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(TradeSide::Buy),
            "A" | "S" => Some(TradeSide::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

/// A trade ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTrade {
    /// Per-session sequence number.
    pub id: u64,
    /// Price formatted with the symbol's precision.
    pub price: String,
    pub size: Decimal,
    pub notional: Decimal,
    pub side: TradeSide,
    /// Execution time as UTC `HH:MM:SS`.
    pub time: String,
}

impl ProcessedTrade {
    pub fn size_in(&self, denomination: Denomination) -> Decimal {
        match denomination {
            Denomination::Asset => self.size,
            Denomination::Quote => self.notional,
        }
    }
}

/// Recent trades for the active symbol, capped at `max_len`.
#[derive(Debug, Clone)]
pub struct TradeBuffer {
    trades: VecDeque<ProcessedTrade>,
    max_len: usize,
    next_id: u64,
}

impl TradeBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            trades: VecDeque::with_capacity(max_len),
            max_len,
            next_id: 0,
        }
    }

    /// Prepends a batch of trades and truncates to the configured length.
    ///
    /// The whole batch is ignored if it is tagged for a symbol other than
    /// `current`. Records that fail to parse are dropped individually.
    /// Returns the number of trades added.
    pub fn ingest(&mut self, events: &[TradeEvent], current: &Symbol, price_decimals: u32) -> usize {
        let Some(first) = events.first() else {
            return 0;
        };
        if *current != first.coin.as_str() {
            debug!(
                expected = %current,
                received = %first.coin,
                "Discarding stale trade batch"
            );
            return 0;
        }

        let batch: Vec<_> = events
            .iter()
            .filter_map(|event| self.process(event, price_decimals))
            .collect();
        let accepted = batch.len();

        for trade in batch.into_iter().rev() {
            self.trades.push_front(trade);
        }
        self.trades.truncate(self.max_len);

        accepted
    }

    /// Clears the tape and restarts ids at zero.
    pub fn reset(&mut self) {
        self.trades.clear();
        self.next_id = 0;
    }

    /// Trades, newest batch first.
    pub fn trades(&self) -> impl Iterator<Item = &ProcessedTrade> {
        self.trades.iter()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    fn process(&mut self, event: &TradeEvent, price_decimals: u32) -> Option<ProcessedTrade> {
        let parsed = parse_decimal(&event.px)
            .zip(parse_decimal(&event.sz))
            .zip(TradeSide::from_code(&event.side))
            .zip(DateTime::from_timestamp_millis(event.time));

        let Some((((price, size), side), time)) = parsed else {
            warn!(
                coin = %event.coin,
                side = %event.side,
                px = %event.px,
                sz = %event.sz,
                time = event.time,
                "Dropping unparsable trade"
            );
            return None;
        };

        let Some(notional) = size.checked_mul(price) else {
            warn!(
                coin = %event.coin,
                px = %event.px,
                sz = %event.sz,
                "Dropping trade whose notional overflows"
            );
            return None;
        };

        let id = self.next_id;
        self.next_id += 1;

        Some(ProcessedTrade {
            id,
            price: format_decimal(price, price_decimals),
            size,
            notional,
            side,
            time: time.format("%H:%M:%S").to_string(),
        })
    }
}
