//! Level-2 book channel models.

use serde::Deserialize;

/// A full book snapshot for one coin.
///
/// Each snapshot replaces the previous one entirely; there is no incremental
/// diffing.
#[derive(Debug, Clone, Deserialize)]
pub struct BookSnapshot {
    pub coin: String,
    /// `[bids, asks]`, each side best price first.
    pub levels: [Vec<RawLevel>; 2],
    /// Feed timestamp in milliseconds.
    pub time: i64,
}

impl BookSnapshot {
    pub fn bids(&self) -> &[RawLevel] {
        &self.levels[0]
    }

    pub fn asks(&self) -> &[RawLevel] {
        &self.levels[1]
    }

    /// Returns `true` if neither side carries a level.
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Vec::is_empty)
    }
}

/// A single price level exactly as the feed sent it.
///
/// Price and size stay as strings until aggregation so that one bad record can
/// be dropped without rejecting the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawLevel {
    pub px: String,
    pub sz: String,
    /// Number of resting orders at this level.
    pub n: u32,
}

impl RawLevel {
    pub fn new(px: impl Into<String>, sz: impl Into<String>, n: u32) -> Self {
        Self {
            px: px.into(),
            sz: sz.into(),
            n,
        }
    }
}
