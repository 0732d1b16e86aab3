//! Shared test utilities and constants.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tungstenite::Message;

use depthline::config::{BookConfig, FeedConfig};
use depthline::feed::FeedMachine;
use depthline::market::{MarketConfig, Symbol};

/// Hyperliquid public WebSocket endpoint.
pub const HYPERLIQUID_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";

pub const L2BOOK_JSON: &str = include_str!("../fixtures/l2book.json");
pub const L2BOOK_ETH_JSON: &str = include_str!("../fixtures/l2book_eth.json");
pub const TRADES_JSON: &str = include_str!("../fixtures/trades.json");
pub const SUBSCRIPTION_RESPONSE_JSON: &str = include_str!("../fixtures/subscription_response.json");
pub const ERROR_JSON: &str = include_str!("../fixtures/error.json");
pub const PONG_JSON: &str = include_str!("../fixtures/pong.json");

/// Upper bound on any single wait in the async tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Feed settings pointed at `url` with short timers.
pub fn feed_config(url: &str) -> FeedConfig {
    FeedConfig {
        websocket_url: url.to_string(),
        reconnect_delay: Duration::from_millis(100),
        ping_interval: Duration::from_secs(30),
        connect_timeout: Duration::from_secs(2),
    }
}

/// A BTC machine with the built-in markets and a four-row window.
pub fn btc_machine(reconnect_delay: Duration) -> FeedMachine {
    let book = BookConfig {
        window_rows: 4,
        max_trades: 10,
    };
    FeedMachine::new(
        Symbol::from("BTC"),
        MarketConfig::default(),
        &book,
        reconnect_delay,
    )
}

/// In-process WebSocket server standing in for the venue.
pub struct MockFeed {
    listener: TcpListener,
    pub url: String,
}

impl MockFeed {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock feed");
        let addr = listener.local_addr().expect("Mock feed has no address");
        Self {
            listener,
            url: format!("ws://{addr}"),
        }
    }

    /// Accepts the next client connection and completes the handshake.
    pub async fn accept(&self) -> WebSocketStream<TcpStream> {
        let (stream, _) = tokio::time::timeout(WAIT, self.listener.accept())
            .await
            .expect("Timeout waiting for client")
            .expect("Failed to accept client");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("WebSocket handshake failed")
    }
}

/// Reads the next text frame from the client as JSON.
pub async fn next_request(ws: &mut WebSocketStream<TcpStream>) -> serde_json::Value {
    let text = tokio::time::timeout(WAIT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
                Some(Ok(_)) => continue,
                other => panic!("Client stream ended: {other:?}"),
            }
        }
    })
    .await
    .expect("Timeout waiting for client request");

    serde_json::from_str(&text).expect("Client sent invalid JSON")
}

/// Reads the next request and returns `(method, type, coin)`.
pub async fn next_subscription(ws: &mut WebSocketStream<TcpStream>) -> (String, String, String) {
    let request = next_request(ws).await;
    let field = |value: &serde_json::Value| value.as_str().unwrap_or_default().to_string();
    (
        field(&request["method"]),
        field(&request["subscription"]["type"]),
        field(&request["subscription"]["coin"]),
    )
}

pub fn subscription(method: &str, channel: &str, coin: &str) -> (String, String, String) {
    (method.to_string(), channel.to_string(), coin.to_string())
}
