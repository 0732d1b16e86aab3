//! Trade channel models.

use serde::Deserialize;

/// A single executed trade as sent on the `trades` channel.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeEvent {
    pub coin: String,
    /// Aggressor side code: `"B"` for buys, `"A"` (or `"S"`) for sells.
    pub side: String,
    pub px: String,
    pub sz: String,
    /// Execution time in milliseconds since the epoch.
    pub time: i64,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub tid: Option<u64>,
}
