//! Streaming connection to the depth feed.
//!
//! This module is organized by concern:
//! - [`subscription`] - Subscribe/unsubscribe requests on the wire
//! - [`handler`] - Inbound frame parsing
//! - [`machine`] - Connection state machine owning the aggregation state
//! - [`controller`] - Async driver executing the machine's actions

pub mod controller;
pub mod handler;
pub mod machine;
pub mod subscription;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use tungstenite::Message;

use crate::Result;
use crate::models::PingRequest;

pub use controller::{FeedCommand, FeedController, FeedHandle};
pub use handler::{Inbound, parse_frame};
pub use machine::{Action, FeedEvent, FeedMachine, FeedState};
pub use subscription::{send_request, subscribe, unsubscribe};

/// Write half of a feed connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a feed connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`DepthlineError`](crate::DepthlineError) if the connection or TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Sends a ping message so the feed does not drop an idle connection.
///
/// # Errors
///
/// Returns a [`DepthlineError`](crate::DepthlineError) if sending the message fails.
pub async fn ping(write: &mut WsWriter) -> Result<()> {
    let request = PingRequest::new();
    let json = serde_json::to_string(&request)?;
    write.send(Message::Text(json.into())).await?;
    debug!("Sent ping");

    Ok(())
}
