//! Application configuration loaded from environment variables.
//!
//! Every variable is optional:
//! - `DEPTHLINE_WEBSOCKET_URL`: feed endpoint
//! - `DEPTHLINE_SYMBOL`: symbol streamed at startup
//! - `DEPTHLINE_RECONNECT_DELAY_MS`: fixed delay before a reconnect attempt
//! - `DEPTHLINE_PING_INTERVAL_MS`: keep-alive interval while connected
//! - `DEPTHLINE_CONNECT_TIMEOUT_MS`: upper bound on a connect attempt
//! - `DEPTHLINE_WINDOW_ROWS`: rows per side of the depth ladder
//! - `DEPTHLINE_MAX_TRADES`: trade history length
//! - `DEPTHLINE_MARKETS_FILE`: JSON file with per-symbol market settings

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DepthlineError;
use crate::market::{MarketConfig, Symbol};

/// Default public WebSocket endpoint.
const DEFAULT_WEBSOCKET_URL: &str = "wss://api.hyperliquid.xyz/ws";

const DEFAULT_SYMBOL: &str = "BTC";
const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;
const DEFAULT_PING_INTERVAL_MS: u64 = 30_000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_WINDOW_ROWS: usize = 12;
const DEFAULT_MAX_TRADES: usize = 50;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub book: BookConfig,
    pub symbol: Symbol,
    pub markets: MarketConfig,
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub websocket_url: String,
    pub reconnect_delay: Duration,
    pub ping_interval: Duration,
    pub connect_timeout: Duration,
}

/// Sizing of the published view.
#[derive(Debug, Clone, Copy)]
pub struct BookConfig {
    /// Rows per side of the depth ladder.
    pub window_rows: usize,
    /// Trades kept in the tape.
    pub max_trades: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            websocket_url: DEFAULT_WEBSOCKET_URL.to_string(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            ping_interval: Duration::from_millis(DEFAULT_PING_INTERVAL_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            window_rows: DEFAULT_WINDOW_ROWS,
            max_trades: DEFAULT_MAX_TRADES,
        }
    }
}

/// Loads the application configuration from environment variables.
///
/// Unset or empty variables fall back to the defaults. When
/// `DEPTHLINE_MARKETS_FILE` is unset the built-in market table is used.
///
/// # Errors
///
/// Returns [`DepthlineError::Config`] if a numeric variable does not parse or
/// the window has zero rows, and any error from [`MarketConfig::load`].
pub fn fetch_config() -> crate::Result<AppConfig> {
    let websocket_url = non_empty_var("DEPTHLINE_WEBSOCKET_URL")
        .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string());
    let symbol = non_empty_var("DEPTHLINE_SYMBOL")
        .map(|s| Symbol::new(s.to_uppercase()))
        .unwrap_or_else(|| Symbol::from(DEFAULT_SYMBOL));

    let feed = FeedConfig {
        websocket_url,
        reconnect_delay: millis_var("DEPTHLINE_RECONNECT_DELAY_MS", DEFAULT_RECONNECT_DELAY_MS)?,
        ping_interval: millis_var("DEPTHLINE_PING_INTERVAL_MS", DEFAULT_PING_INTERVAL_MS)?,
        connect_timeout: millis_var("DEPTHLINE_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)?,
    };
    if feed.ping_interval.is_zero() {
        return Err(DepthlineError::Config(
            "DEPTHLINE_PING_INTERVAL_MS must be greater than zero".to_string(),
        ));
    }

    let book = BookConfig {
        window_rows: parsed_var("DEPTHLINE_WINDOW_ROWS", DEFAULT_WINDOW_ROWS)?,
        max_trades: parsed_var("DEPTHLINE_MAX_TRADES", DEFAULT_MAX_TRADES)?,
    };
    if book.window_rows == 0 {
        return Err(DepthlineError::Config(
            "DEPTHLINE_WINDOW_ROWS must be greater than zero".to_string(),
        ));
    }

    let markets = match non_empty_var("DEPTHLINE_MARKETS_FILE") {
        Some(path) => MarketConfig::load(&PathBuf::from(path))?,
        None => MarketConfig::default(),
    };

    Ok(AppConfig {
        feed,
        book,
        symbol,
        markets,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses an environment variable, falling back to `default` when absent.
fn parsed_var<T: FromStr>(name: &str, default: T) -> crate::Result<T> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DepthlineError::Config(format!("{name} is not a valid number: {raw}"))),
        None => Ok(default),
    }
}

fn millis_var(name: &str, default_ms: u64) -> crate::Result<Duration> {
    parsed_var(name, default_ms).map(Duration::from_millis)
}
