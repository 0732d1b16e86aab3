//! Async driver for the feed state machine.
//!
//! [`FeedController`] owns the single live connection, the reconnect timer
//! and the keep-alive interval. It turns I/O into [`FeedEvent`]s, feeds them
//! to the [`FeedMachine`] one at a time, and performs the returned
//! [`Action`]s. Consumers interact through a cloneable [`FeedHandle`].

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};
use tungstenite::Message as WsMessage;

use super::machine::{Action, FeedEvent, FeedMachine, FeedState};
use super::{WsReader, WsWriter, connect, ping, send_request};
use crate::config::{AppConfig, FeedConfig};
use crate::error::DepthlineError;
use crate::market::{BucketSize, Symbol};
use crate::view::DepthView;

/// Commands sent from consumers to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedCommand {
    SetSymbol(Symbol),
    SetBucketSize(BucketSize),
    Shutdown,
}

impl From<FeedCommand> for FeedEvent {
    fn from(command: FeedCommand) -> Self {
        match command {
            FeedCommand::SetSymbol(symbol) => FeedEvent::SetSymbol(symbol),
            FeedCommand::SetBucketSize(bucket_size) => FeedEvent::SetBucketSize(bucket_size),
            FeedCommand::Shutdown => FeedEvent::Shutdown,
        }
    }
}

/// Consumer side of a running controller.
///
/// The controller tears down once every handle is dropped.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    commands: mpsc::UnboundedSender<FeedCommand>,
    view: watch::Receiver<DepthView>,
}

impl FeedHandle {
    /// Switches the streamed symbol. Returns `false` if the controller has stopped.
    pub fn set_symbol(&self, symbol: impl Into<Symbol>) -> bool {
        self.send(FeedCommand::SetSymbol(symbol.into()))
    }

    /// Re-buckets the ladder. Returns `false` if the controller has stopped.
    pub fn set_bucket_size(&self, bucket_size: BucketSize) -> bool {
        self.send(FeedCommand::SetBucketSize(bucket_size))
    }

    /// Requests teardown. Returns `false` if the controller has already stopped.
    pub fn shutdown(&self) -> bool {
        self.send(FeedCommand::Shutdown)
    }

    /// Latest published view.
    pub fn view(&self) -> DepthView {
        self.view.borrow().clone()
    }

    /// A receiver notified on every published view.
    pub fn subscribe(&self) -> watch::Receiver<DepthView> {
        self.view.clone()
    }

    fn send(&self, command: FeedCommand) -> bool {
        self.commands.send(command).is_ok()
    }
}

/// What woke the controller loop.
enum Wake {
    Frame(Option<Result<WsMessage, tungstenite::Error>>),
    Command(Option<FeedCommand>),
    ReconnectDue,
    KeepAlive,
}

struct Connection {
    write: WsWriter,
    read: WsReader,
}

/// Drives a [`FeedMachine`] against a live WebSocket.
pub struct FeedController {
    config: FeedConfig,
    machine: FeedMachine,
    commands: mpsc::UnboundedReceiver<FeedCommand>,
    view_tx: watch::Sender<DepthView>,
    connection: Option<Connection>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl FeedController {
    /// Creates a controller and the handle used to steer it.
    #[must_use]
    pub fn new(config: FeedConfig, machine: FeedMachine) -> (Self, FeedHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(machine.view());

        let controller = Self {
            config,
            machine,
            commands,
            view_tx,
            connection: None,
            reconnect: None,
        };
        let handle = FeedHandle {
            commands: commands_tx,
            view,
        };
        (controller, handle)
    }

    /// Builds the machine and controller from application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> (Self, FeedHandle) {
        let machine = FeedMachine::new(
            config.symbol.clone(),
            config.markets.clone(),
            &config.book,
            config.feed.reconnect_delay,
        );
        Self::new(config.feed.clone(), machine)
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    pub fn spawn(config: &AppConfig) -> (FeedHandle, JoinHandle<()>) {
        let (controller, handle) = Self::from_config(config);
        (handle, tokio::spawn(controller.run()))
    }

    /// Runs until teardown.
    ///
    /// Teardown happens on [`FeedHandle::shutdown`] or when every handle has
    /// been dropped.
    pub async fn run(mut self) {
        let period = self.config.ping_interval;
        let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pending = VecDeque::from([FeedEvent::Start]);

        loop {
            while let Some(event) = pending.pop_front() {
                for action in self.machine.handle(event) {
                    self.execute(action, &mut pending).await;
                }
            }

            if self.machine.state() == FeedState::Closed {
                info!("Feed controller stopped");
                return;
            }

            let connected = self.connection.is_some();
            let wake = tokio::select! {
                frame = next_frame(&mut self.connection) => Wake::Frame(frame),
                command = self.commands.recv() => Wake::Command(command),
                () = reconnect_due(&mut self.reconnect) => Wake::ReconnectDue,
                _ = keepalive.tick(), if connected => Wake::KeepAlive,
            };

            match wake {
                Wake::Frame(Some(Ok(WsMessage::Text(text)))) => {
                    pending.push_back(FeedEvent::Frame(text.as_str().to_owned()));
                }
                Wake::Frame(Some(Ok(WsMessage::Close(frame)))) => {
                    info!(?frame, "Server closed the connection");
                    self.connection = None;
                    pending.push_back(FeedEvent::ConnectionLost);
                }
                Wake::Frame(Some(Ok(_))) => {} // Binary/Ping/Pong frames
                Wake::Frame(Some(Err(e))) => {
                    warn!("WebSocket error: {e}");
                    self.connection = None;
                    pending.push_back(FeedEvent::ConnectionLost);
                }
                Wake::Frame(None) => {
                    warn!("WebSocket stream ended");
                    self.connection = None;
                    pending.push_back(FeedEvent::ConnectionLost);
                }
                Wake::Command(Some(command)) => pending.push_back(command.into()),
                Wake::Command(None) => {
                    info!("All feed handles dropped");
                    pending.push_back(FeedEvent::Shutdown);
                }
                Wake::ReconnectDue => {
                    self.reconnect = None;
                    pending.push_back(FeedEvent::ReconnectDue);
                }
                Wake::KeepAlive => {
                    if let Some(connection) = self.connection.as_mut() {
                        if let Err(e) = ping(&mut connection.write).await {
                            warn!("Ping failed: {e}");
                            self.connection = None;
                            pending.push_back(FeedEvent::ConnectionLost);
                        }
                    }
                }
            }
        }
    }

    /// Performs one action, queueing the events it produced.
    async fn execute(&mut self, action: Action, pending: &mut VecDeque<FeedEvent>) {
        match action {
            Action::Connect => self.connect(pending).await,
            Action::Send(request) => {
                let Some(connection) = self.connection.as_mut() else {
                    return;
                };
                if let Err(e) = send_request(&mut connection.write, &request).await {
                    warn!("Failed to send {} request: {e}", request.method);
                    self.connection = None;
                    pending.push_back(FeedEvent::ConnectionLost);
                }
            }
            Action::ScheduleReconnect(delay) => {
                debug!(delay_ms = delay.as_millis() as u64, "Reconnect timer armed");
                self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
            }
            Action::CancelReconnect => {
                self.reconnect = None;
            }
            Action::Close => {
                if let Some(mut connection) = self.connection.take() {
                    if let Err(e) = connection.write.close().await {
                        debug!("Close handshake failed: {e}");
                    }
                }
            }
            Action::Publish => {
                self.view_tx.send_replace(self.machine.view());
            }
        }
    }

    /// Opens a connection while still draining consumer commands.
    ///
    /// Commands that arrive mid-handshake are queued ahead of the outcome.
    /// Teardown abandons the attempt.
    async fn connect(&mut self, pending: &mut VecDeque<FeedEvent>) {
        let opening = open(&self.config);
        tokio::pin!(opening);

        loop {
            tokio::select! {
                result = &mut opening => {
                    match result {
                        Ok(connection) => {
                            self.connection = Some(connection);
                            pending.push_back(FeedEvent::Opened);
                        }
                        Err(e) => {
                            warn!("Connection failed: {e}");
                            pending.push_back(FeedEvent::ConnectionLost);
                        }
                    }
                    return;
                }
                command = self.commands.recv() => match command {
                    Some(FeedCommand::Shutdown) | None => {
                        info!("Abandoning connect for teardown");
                        pending.push_back(FeedEvent::Shutdown);
                        return;
                    }
                    Some(command) => pending.push_back(command.into()),
                },
            }
        }
    }
}

async fn open(config: &FeedConfig) -> crate::Result<Connection> {
    info!(url = %config.websocket_url, "Connecting to WebSocket");
    let (write, read) = tokio::time::timeout(config.connect_timeout, connect(&config.websocket_url))
        .await
        .map_err(|_| DepthlineError::ConnectTimeout)??;
    Ok(Connection { write, read })
}

/// Next message on the live connection; pends forever without one.
async fn next_frame(
    connection: &mut Option<Connection>,
) -> Option<Result<WsMessage, tungstenite::Error>> {
    match connection {
        Some(connection) => connection.read.next().await,
        None => std::future::pending().await,
    }
}

/// Completes when the reconnect timer fires; pends forever without one.
async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BookConfig;
    use crate::market::MarketConfig;

    fn controller(url: &str) -> (FeedController, FeedHandle) {
        let feed = FeedConfig {
            websocket_url: url.to_string(),
            reconnect_delay: Duration::from_millis(50),
            ping_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_millis(200),
        };
        let machine = FeedMachine::new(
            Symbol::from("BTC"),
            MarketConfig::default(),
            &BookConfig::default(),
            feed.reconnect_delay,
        );
        FeedController::new(feed, machine)
    }

    #[test]
    fn handle_reports_stopped_controller() {
        let (controller, handle) = controller("ws://127.0.0.1:1");
        assert!(handle.set_symbol("ETH"));
        drop(controller);
        assert!(!handle.set_symbol("SOL"));
        assert!(!handle.shutdown());
    }

    #[test]
    fn initial_view_is_disconnected() {
        let (_controller, handle) = controller("ws://127.0.0.1:1");
        let view = handle.view();
        assert!(!view.connected);
        assert_eq!(view.symbol, "BTC");
        assert!(view.trades.is_empty());
    }

    #[tokio::test]
    async fn shutdown_while_reconnecting_stops_the_loop() {
        // Nothing listens on port 1, so every connect attempt fails.
        let (controller, handle) = controller("ws://127.0.0.1:1");
        let task = tokio::spawn(controller.run());

        tokio::task::yield_now().await;
        assert!(handle.shutdown());
        tokio_test::assert_ok!(task.await);
        assert!(!handle.view().connected);
    }

    #[tokio::test]
    async fn dropping_every_handle_tears_down() {
        let (controller, handle) = controller("ws://127.0.0.1:1");
        let second = handle.clone();
        let task = tokio::spawn(controller.run());

        drop(handle);
        drop(second);
        tokio_test::assert_ok!(task.await);
    }
}
