//! Connection state machine.
//!
//! [`FeedMachine`] owns the depth book, the trade tape and the connection
//! state. Every transition goes through [`FeedMachine::handle`], which returns
//! the side effects for the driver to perform. No I/O happens here.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::handler::{Inbound, parse_frame};
use crate::book::DepthBook;
use crate::config::BookConfig;
use crate::market::{BucketSize, MarketConfig, Symbol};
use crate::models::{Channel, SubscriptionRequest};
use crate::trades::TradeBuffer;
use crate::view::DepthView;

/// Channels subscribed for the active symbol.
const CHANNELS: [Channel; 2] = [Channel::Book, Channel::Trades];

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Disconnected,
    Connecting,
    Subscribed,
    Reconnecting,
    /// Torn down. Absorbs every further event.
    Closed,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Start,
    /// The transport finished its handshake.
    Opened,
    /// Connect failure, close frame, or transport error.
    ConnectionLost,
    /// The reconnect timer fired.
    ReconnectDue,
    /// A text frame from the feed.
    Frame(String),
    SetSymbol(Symbol),
    SetBucketSize(BucketSize),
    Shutdown,
}

/// Side effects requested by the state machine, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Connect,
    Send(SubscriptionRequest),
    ScheduleReconnect(Duration),
    CancelReconnect,
    /// Drop the transport, closing it if still open.
    Close,
    /// Publish a fresh [`DepthView`].
    Publish,
}

/// Feed state machine.
#[derive(Debug)]
pub struct FeedMachine {
    state: FeedState,
    reconnect_delay: Duration,
    reconnect_pending: bool,
    markets: MarketConfig,
    book: DepthBook,
    trades: TradeBuffer,
}

impl FeedMachine {
    /// Creates a disconnected machine for `symbol` using the symbol's default
    /// bucket size.
    pub fn new(
        symbol: Symbol,
        markets: MarketConfig,
        book: &BookConfig,
        reconnect_delay: Duration,
    ) -> Self {
        let bucket_size = markets.default_bucket(&symbol);
        Self {
            state: FeedState::Disconnected,
            reconnect_delay,
            reconnect_pending: false,
            markets,
            book: DepthBook::new(symbol, bucket_size, book.window_rows),
            trades: TradeBuffer::new(book.max_trades),
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn symbol(&self) -> &Symbol {
        self.book.symbol()
    }

    pub fn is_connected(&self) -> bool {
        self.state == FeedState::Subscribed
    }

    pub fn book(&self) -> &DepthBook {
        &self.book
    }

    pub fn trades(&self) -> &TradeBuffer {
        &self.trades
    }

    /// Materializes the current state for consumers.
    pub fn view(&self) -> DepthView {
        DepthView::new(&self.book, &self.trades, self.is_connected())
    }

    /// Applies one event and returns the actions to perform.
    pub fn handle(&mut self, event: FeedEvent) -> Vec<Action> {
        if self.state == FeedState::Closed {
            // A handshake that raced teardown still has to be released.
            return match event {
                FeedEvent::Opened => vec![Action::Close],
                _ => Vec::new(),
            };
        }

        match event {
            FeedEvent::Start => self.on_start(),
            FeedEvent::Opened => self.on_opened(),
            FeedEvent::ConnectionLost => self.on_connection_lost(),
            FeedEvent::ReconnectDue => self.on_reconnect_due(),
            FeedEvent::Frame(text) => self.on_frame(&text),
            FeedEvent::SetSymbol(symbol) => self.on_set_symbol(symbol),
            FeedEvent::SetBucketSize(bucket_size) => self.on_set_bucket_size(bucket_size),
            FeedEvent::Shutdown => self.on_shutdown(),
        }
    }

    fn on_start(&mut self) -> Vec<Action> {
        if self.state != FeedState::Disconnected {
            return Vec::new();
        }
        self.state = FeedState::Connecting;
        vec![Action::Connect]
    }

    fn on_opened(&mut self) -> Vec<Action> {
        if self.state != FeedState::Connecting {
            warn!(state = ?self.state, "Unexpected connection open");
            return Vec::new();
        }

        self.state = FeedState::Subscribed;
        info!(symbol = %self.symbol(), "Connected, subscribing");

        let mut actions = Vec::with_capacity(4);
        if std::mem::take(&mut self.reconnect_pending) {
            actions.push(Action::CancelReconnect);
        }
        actions.extend(requests(SubscriptionRequest::subscribe, self.symbol()));
        actions.push(Action::Publish);
        actions
    }

    fn on_connection_lost(&mut self) -> Vec<Action> {
        match self.state {
            FeedState::Connecting | FeedState::Subscribed => {
                warn!(
                    delay_ms = self.reconnect_delay.as_millis() as u64,
                    "Connection lost, scheduling reconnect"
                );
                self.state = FeedState::Reconnecting;
                self.reconnect_pending = true;
                vec![
                    Action::Close,
                    Action::ScheduleReconnect(self.reconnect_delay),
                    Action::Publish,
                ]
            }
            _ => Vec::new(),
        }
    }

    fn on_reconnect_due(&mut self) -> Vec<Action> {
        if self.state != FeedState::Reconnecting {
            return Vec::new();
        }
        self.reconnect_pending = false;
        self.state = FeedState::Connecting;
        info!(symbol = %self.symbol(), "Reconnecting");
        vec![Action::Connect]
    }

    fn on_frame(&mut self, text: &str) -> Vec<Action> {
        let inbound = match parse_frame(text) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "Dropping malformed frame");
                return Vec::new();
            }
        };

        let changed = match inbound {
            Inbound::Book(snapshot) => self.book.apply_snapshot(&snapshot),
            Inbound::Trades(events) => {
                let symbol = self.book.symbol();
                let decimals = self.markets.price_decimals(symbol);
                self.trades.ingest(&events, symbol, decimals) > 0
            }
            Inbound::SubscriptionAck(ack) => {
                debug!(method = %ack.method, subscription = %ack.subscription, "Subscription acknowledged");
                false
            }
            Inbound::Pong => {
                debug!("Received pong");
                false
            }
            Inbound::Error(message) => {
                warn!(%message, "Feed reported an error");
                false
            }
            Inbound::Unknown(channel) => {
                debug!(%channel, "Ignoring frame on unhandled channel");
                false
            }
        };

        if changed {
            vec![Action::Publish]
        } else {
            Vec::new()
        }
    }

    fn on_set_symbol(&mut self, symbol: Symbol) -> Vec<Action> {
        if symbol == *self.symbol() {
            return Vec::new();
        }

        info!(from = %self.symbol(), to = %symbol, "Switching symbol");

        let mut actions = Vec::with_capacity(5);
        if self.state == FeedState::Subscribed {
            actions.extend(requests(SubscriptionRequest::unsubscribe, self.symbol()));
            actions.extend(requests(SubscriptionRequest::subscribe, &symbol));
        }

        let bucket_size = self.markets.default_bucket(&symbol);
        self.book.reset(symbol, bucket_size);
        self.trades.reset();

        actions.push(Action::Publish);
        actions
    }

    fn on_set_bucket_size(&mut self, bucket_size: BucketSize) -> Vec<Action> {
        if bucket_size == self.book.bucket_size() {
            return Vec::new();
        }
        info!(symbol = %self.symbol(), %bucket_size, "Changing bucket size");
        self.book.set_bucket_size(bucket_size);
        vec![Action::Publish]
    }

    fn on_shutdown(&mut self) -> Vec<Action> {
        info!(state = ?self.state, "Tearing down feed");

        let mut actions = Vec::with_capacity(5);
        if std::mem::take(&mut self.reconnect_pending) {
            actions.push(Action::CancelReconnect);
        }
        if self.state == FeedState::Subscribed {
            actions.extend(requests(SubscriptionRequest::unsubscribe, self.symbol()));
        }
        if matches!(self.state, FeedState::Connecting | FeedState::Subscribed) {
            actions.push(Action::Close);
        }

        self.state = FeedState::Closed;
        actions.push(Action::Publish);
        actions
    }
}

fn requests(
    build: fn(Channel, &str) -> SubscriptionRequest,
    symbol: &Symbol,
) -> impl Iterator<Item = Action> {
    CHANNELS
        .into_iter()
        .map(move |channel| Action::Send(build(channel, symbol.as_str())))
}
