//! Streaming depth-of-market aggregation over a WebSocket feed.
//!
//! Subscribes to a venue's level-2 book and trade channels, buckets raw price
//! levels into display rows with cumulative depth, flags newly appeared
//! buckets, and keeps a bounded trade tape. A single controller task keeps the
//! feed alive across reconnects and symbol switches and publishes a
//! [`view::DepthView`] to consumers.

pub mod book;
pub mod config;
pub mod error;
pub mod feed;
pub mod market;
pub mod models;
pub mod trades;
pub mod view;

pub use error::{DepthlineError, Result};
