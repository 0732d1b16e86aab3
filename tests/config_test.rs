//! Market configuration loading tests.

use std::path::PathBuf;

use rust_decimal_macros::dec;

use depthline::DepthlineError;
use depthline::market::{MarketConfig, Symbol};

/// Helper to get the path to test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn test_markets_file_merges_overrides_with_defaults() {
    let config = MarketConfig::load(&fixtures_dir().join("markets.json"))
        .expect("Failed to load markets file");

    let btc = Symbol::from("BTC");
    assert_eq!(config.price_decimals(&btc), 0);
    assert_eq!(config.default_bucket(&btc).get(), dec!(10));

    let eth = Symbol::from("ETH");
    assert_eq!(config.price_decimals(&eth), 3);
    assert_eq!(config.default_bucket(&eth).get(), dec!(0.5));

    let sol = Symbol::from("SOL");
    assert_eq!(config.price_decimals(&sol), 4);
    assert_eq!(config.default_bucket(&sol).get(), dec!(0.01));

    let doge = Symbol::from("DOGE");
    assert_eq!(config.settings_for(&doge), config.defaults);
}

#[test]
fn test_non_positive_bucket_is_rejected() {
    let result = MarketConfig::load(&fixtures_dir().join("invalid_markets.json"));
    assert!(matches!(result, Err(DepthlineError::Json(_))));
}

#[test]
fn test_missing_markets_file() {
    let result = MarketConfig::load(&fixtures_dir().join("nonexistent.json"));
    match result {
        Err(DepthlineError::Config(message)) => assert!(message.contains("nonexistent.json")),
        other => panic!("Expected a config error, got {other:?}"),
    }
}
