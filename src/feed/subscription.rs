//! Channel subscription and unsubscription operations.

use futures_util::SinkExt;
use tracing::{debug, info};
use tungstenite::Message;

use super::WsWriter;
use crate::Result;
use crate::models::{Channel, SubscriptionRequest};

/// Serializes and sends a subscription request.
///
/// # Errors
///
/// Returns a [`DepthlineError`](crate::DepthlineError) if sending the message fails.
pub async fn send_request(write: &mut WsWriter, request: &SubscriptionRequest) -> Result<()> {
    let json = serde_json::to_string(request)?;
    debug!("Sending {} request: {}", request.method, json);
    write.send(Message::Text(json.into())).await?;
    info!(
        method = %request.method,
        channel = %request.subscription.tpe,
        coin = %request.subscription.coin,
        "Subscription request sent"
    );

    Ok(())
}

/// Subscribes to one channel of one coin.
///
/// # Errors
///
/// Returns a [`DepthlineError`](crate::DepthlineError) if sending the subscription message fails.
pub async fn subscribe(write: &mut WsWriter, channel: Channel, coin: &str) -> Result<()> {
    send_request(write, &SubscriptionRequest::subscribe(channel, coin)).await
}

/// Unsubscribes from one channel of one coin.
///
/// # Errors
///
/// Returns a [`DepthlineError`](crate::DepthlineError) if sending the unsubscribe message fails.
pub async fn unsubscribe(write: &mut WsWriter, channel: Channel, coin: &str) -> Result<()> {
    send_request(write, &SubscriptionRequest::unsubscribe(channel, coin)).await
}
