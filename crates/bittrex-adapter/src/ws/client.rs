/*
[INPUT]:  Stream URL and market subscription commands
[OUTPUT]: Ordered per-market deltas delivered via subscription channels
[POS]:    WebSocket layer - connection lifecycle, resubscription, delivery
[UPDATE]: When adding new channels or changing connection logic
*/

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::http::error::{BittrexError, Result};
use crate::ws::message::{self, AckAction, MarketDelta, StreamMessage};

const STREAM_URL: &str = "wss://socket.bittrex.com/v1/stream";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

/// Stream connection configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    pub reconnect: bool,
    pub max_reconnect_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub connect_timeout: Duration,
    /// Per-subscription delivery buffer; a lagging consumer loses deltas
    /// instead of stalling the socket
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: STREAM_URL.to_string(),
            reconnect: true,
            max_reconnect_attempts: 10,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            channel_capacity: 256,
        }
    }
}

/// Connection lifecycle as observed from outside the task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Subscribed,
    Reconnecting,
}

impl StreamState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => StreamState::Connecting,
            2 => StreamState::Subscribed,
            3 => StreamState::Reconnecting,
            _ => StreamState::Disconnected,
        }
    }
}

/// Identity of one active subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: u64,
    market: String,
}

impl SubscriptionHandle {
    pub fn market(&self) -> &str {
        &self.market
    }
}

/// One market subscription: the handle plus its ordered delta feed.
///
/// `recv` yields `None` once the subscription is removed or the stream is
/// abandoned; deltas for the same market always arrive in nonce order.
pub struct MarketSubscription {
    handle: SubscriptionHandle,
    rx: mpsc::Receiver<MarketDelta>,
}

impl MarketSubscription {
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    pub fn market(&self) -> &str {
        &self.handle.market
    }

    pub async fn recv(&mut self) -> Option<MarketDelta> {
        self.rx.recv().await
    }
}

enum Command {
    Subscribe {
        market: String,
        reply: oneshot::Sender<MarketSubscription>,
    },
    Unsubscribe {
        id: u64,
    },
    Shutdown,
}

/// Market data stream manager.
///
/// A single background task owns the socket and the subscription set, so
/// only one reconnect attempt can ever be in flight; a drop observed while
/// reconnecting folds into the attempt already running.
pub struct BittrexWebSocket {
    cmd_tx: mpsc::Sender<Command>,
    state: Arc<AtomicU8>,
    task: Option<JoinHandle<()>>,
}

impl BittrexWebSocket {
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    pub fn with_config(config: StreamConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let state = Arc::new(AtomicU8::new(StreamState::Disconnected as u8));
        let task_state = TaskState {
            config,
            cmd_rx,
            subs: Vec::new(),
            next_id: 0,
            reconnect_attempts: 0,
            state: Arc::clone(&state),
        };
        let task = tokio::spawn(run_task(task_state));
        Self {
            cmd_tx,
            state,
            task: Some(task),
        }
    }

    /// Register interest in one market.
    ///
    /// The first subscription opens the connection; delivery starts once
    /// the server acknowledges the subscribe frame.
    pub async fn subscribe(&self, market: &str) -> Result<MarketSubscription> {
        if market.trim().is_empty() {
            return Err(BittrexError::invalid_argument("market must not be empty"));
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Subscribe {
                market: market.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| BittrexError::stream("stream task is gone"))?;
        reply_rx
            .await
            .map_err(|_| BittrexError::stream("stream task dropped the subscription"))
    }

    /// Remove one subscription.
    ///
    /// Removing the last subscription for a market unsubscribes it on the
    /// wire; removing the last subscription overall tears the connection
    /// down.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        self.cmd_tx
            .send(Command::Unsubscribe { id: handle.id })
            .await
            .map_err(|_| BittrexError::stream("stream task is gone"))
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        StreamState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Close the stream and wait for the background task to finish
    pub async fn shutdown(mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown).await;
        if let Some(task) = self.task.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), task).await;
        }
    }
}

impl Default for BittrexWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BittrexWebSocket {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---- background task ----

struct Subscriber {
    id: u64,
    market: String,
    tx: mpsc::Sender<MarketDelta>,
}

struct TaskState {
    config: StreamConfig,
    cmd_rx: mpsc::Receiver<Command>,
    /// Insertion order doubles as the resubscription replay order
    subs: Vec<Subscriber>,
    next_id: u64,
    reconnect_attempts: u32,
    state: Arc<AtomicU8>,
}

impl TaskState {
    fn set_state(&self, state: StreamState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn register(&mut self, market: String, reply: oneshot::Sender<MarketSubscription>) {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let id = self.next_id;
        self.next_id += 1;
        let handle = SubscriptionHandle {
            id,
            market: market.clone(),
        };
        self.subs.push(Subscriber { id, market, tx });
        if reply.send(MarketSubscription { handle, rx }).is_err() {
            // caller went away before the handle arrived
            self.subs.retain(|sub| sub.id != id);
        }
    }
}

enum SessionEnd {
    Shutdown,
    Idle,
    Dropped(String),
}

enum BackoffOutcome {
    Reconnect,
    Idle,
    Stop,
}

enum FrameOutcome {
    Continue,
    End(SessionEnd),
}

async fn run_task(mut state: TaskState) {
    loop {
        state.set_state(StreamState::Disconnected);

        while state.subs.is_empty() {
            match state.cmd_rx.recv().await {
                Some(Command::Subscribe { market, reply }) => state.register(market, reply),
                Some(Command::Unsubscribe { .. }) => {}
                Some(Command::Shutdown) | None => return,
            }
        }

        state.set_state(if state.reconnect_attempts == 0 {
            StreamState::Connecting
        } else {
            StreamState::Reconnecting
        });

        let ws = match attempt_connect(&state.config).await {
            Ok(ws) => ws,
            Err(err) => {
                warn!(error = %err, "stream connection failed");
                match backoff(&mut state).await {
                    BackoffOutcome::Reconnect | BackoffOutcome::Idle => continue,
                    BackoffOutcome::Stop => return,
                }
            }
        };

        match run_session(&mut state, ws).await {
            SessionEnd::Shutdown => return,
            SessionEnd::Idle => continue,
            SessionEnd::Dropped(reason) => {
                warn!(reason = %reason, "stream dropped");
                match backoff(&mut state).await {
                    BackoffOutcome::Reconnect | BackoffOutcome::Idle => continue,
                    BackoffOutcome::Stop => return,
                }
            }
        }
    }
}

/// One connected session: replay subscriptions, then pump frames and
/// commands until the connection ends.
async fn run_session(state: &mut TaskState, ws: WsStream) -> SessionEnd {
    let (mut sink, mut stream) = ws.split();

    // replay active subscriptions in their original order
    let mut replay: Vec<String> = Vec::new();
    for sub in &state.subs {
        if !replay.contains(&sub.market) {
            replay.push(sub.market.clone());
        }
    }
    for market in &replay {
        if let Err(err) = send_json(&mut sink, &message::subscribe_frame(market)).await {
            return SessionEnd::Dropped(err);
        }
    }
    info!(count = replay.len(), "subscriptions replayed");

    // deltas stay undeliverable until every replayed subscribe is acked;
    // anything received before that belongs to no session
    let mut pending = replay;
    let mut acked: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(WsMessage::Text(text))) => Some(text.to_string()),
                    Some(Ok(WsMessage::Binary(bytes))) => String::from_utf8(bytes.to_vec()).ok(),
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = sink.send(WsMessage::Pong(data)).await;
                        None
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        return SessionEnd::Dropped("server closed the stream".to_string());
                    }
                    Some(Ok(_)) => None,
                    Some(Err(err)) => return SessionEnd::Dropped(err.to_string()),
                    None => return SessionEnd::Dropped("stream ended".to_string()),
                };
                if let Some(text) = text {
                    match handle_frame(state, &mut sink, &mut pending, &mut acked, &text).await {
                        FrameOutcome::Continue => {}
                        FrameOutcome::End(end) => return end,
                    }
                }
            }
            cmd = state.cmd_rx.recv() => {
                match cmd {
                    None => return SessionEnd::Shutdown,
                    Some(Command::Shutdown) => {
                        let _ = sink.send(WsMessage::Close(None)).await;
                        return SessionEnd::Shutdown;
                    }
                    Some(Command::Subscribe { market, reply }) => {
                        let newly_referenced = !state.subs.iter().any(|sub| sub.market == market);
                        state.register(market.clone(), reply);
                        if newly_referenced {
                            if let Err(err) =
                                send_json(&mut sink, &message::subscribe_frame(&market)).await
                            {
                                return SessionEnd::Dropped(err);
                            }
                        }
                    }
                    Some(Command::Unsubscribe { id }) => {
                        if let Some(market) = remove_subscriber(&mut state.subs, id) {
                            let _ =
                                send_json(&mut sink, &message::unsubscribe_frame(&market)).await;
                            acked.remove(&market);
                            pending.retain(|m| m != &market);
                            if pending.is_empty() {
                                state.reconnect_attempts = 0;
                                state.set_state(StreamState::Subscribed);
                            }
                        }
                        if state.subs.is_empty() {
                            info!("last subscription removed, closing the stream");
                            let _ = sink.send(WsMessage::Close(None)).await;
                            return SessionEnd::Idle;
                        }
                    }
                }
            }
        }
    }
}

async fn handle_frame(
    state: &mut TaskState,
    sink: &mut WsSink,
    pending: &mut Vec<String>,
    acked: &mut HashSet<String>,
    text: &str,
) -> FrameOutcome {
    let parsed = match serde_json::from_str::<StreamMessage>(text) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(error = %err, bytes = text.len(), "stream frame parse failed");
            return FrameOutcome::Continue;
        }
    };

    match parsed {
        StreamMessage::Ack {
            action: AckAction::Subscribe,
            symbol,
        } => {
            acked.insert(symbol.clone());
            let was_pending = !pending.is_empty();
            pending.retain(|m| m != &symbol);
            if was_pending && pending.is_empty() {
                state.reconnect_attempts = 0;
                state.set_state(StreamState::Subscribed);
                info!("resubscription complete");
            }
        }
        StreamMessage::Ack {
            action: AckAction::Unsubscribe,
            symbol,
        } => {
            acked.remove(&symbol);
        }
        StreamMessage::MarketDelta { symbol, data } => {
            if !pending.is_empty() {
                debug!(symbol, "delta discarded during resubscription");
            } else if !acked.contains(&symbol) {
                debug!(symbol, "delta discarded before subscribe ack");
            } else {
                let dead = dispatch(&state.subs, &symbol, data);
                for id in dead {
                    if let Some(market) = remove_subscriber(&mut state.subs, id) {
                        let _ = send_json(sink, &message::unsubscribe_frame(&market)).await;
                        acked.remove(&market);
                    }
                }
                if state.subs.is_empty() {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return FrameOutcome::End(SessionEnd::Idle);
                }
            }
        }
        StreamMessage::Heartbeat | StreamMessage::Other => {}
    }
    FrameOutcome::Continue
}

/// Deliver one delta to every subscriber of `symbol`, preserving arrival
/// order. Returns the ids of subscribers whose receiver is gone.
fn dispatch(subs: &[Subscriber], symbol: &str, delta: MarketDelta) -> Vec<u64> {
    let mut dead = Vec::new();
    for sub in subs {
        if sub.market != symbol {
            continue;
        }
        match sub.tx.try_send(delta.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(market = symbol, "subscriber lagging, delta dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => dead.push(sub.id),
        }
    }
    dead
}

/// Remove one subscriber; returns the market when no subscriber
/// references it anymore.
fn remove_subscriber(subs: &mut Vec<Subscriber>, id: u64) -> Option<String> {
    let position = subs.iter().position(|sub| sub.id == id)?;
    let removed = subs.remove(position);
    if subs.iter().any(|sub| sub.market == removed.market) {
        None
    } else {
        Some(removed.market)
    }
}

/// Sleep out the exponential backoff while still serving commands.
async fn backoff(state: &mut TaskState) -> BackoffOutcome {
    if !state.config.reconnect || state.reconnect_attempts >= state.config.max_reconnect_attempts {
        tracing::error!(
            attempts = state.reconnect_attempts,
            "stream reconnection abandoned"
        );
        // dropping the senders closes every delivery channel
        state.subs.clear();
        state.reconnect_attempts = 0;
        return BackoffOutcome::Idle;
    }
    state.reconnect_attempts += 1;
    state.set_state(StreamState::Reconnecting);
    let delay = reconnect_delay(&state.config, state.reconnect_attempts);
    info!(
        attempt = state.reconnect_attempts,
        delay_ms = delay.as_millis() as u64,
        "stream reconnecting"
    );

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return BackoffOutcome::Reconnect,
            cmd = state.cmd_rx.recv() => match cmd {
                None | Some(Command::Shutdown) => return BackoffOutcome::Stop,
                Some(Command::Subscribe { market, reply }) => state.register(market, reply),
                Some(Command::Unsubscribe { id }) => {
                    remove_subscriber(&mut state.subs, id);
                    if state.subs.is_empty() {
                        return BackoffOutcome::Idle;
                    }
                }
            }
        }
    }
}

fn reconnect_delay(config: &StreamConfig, attempt: u32) -> Duration {
    let shift = (attempt - 1).min(16);
    let mut delay = config.base_backoff.saturating_mul(1u32 << shift);
    if delay > config.max_backoff {
        delay = config.max_backoff;
    }
    let jitter = delay.mul_f64(rand::thread_rng().gen_range(0.0..0.25));
    delay + jitter
}

async fn attempt_connect(config: &StreamConfig) -> std::result::Result<WsStream, String> {
    let (ws, _response) = tokio::time::timeout(config.connect_timeout, connect_async(&config.url))
        .await
        .map_err(|_| "connection timeout".to_string())?
        .map_err(|err| err.to_string())?;
    Ok(ws)
}

async fn send_json(
    sink: &mut WsSink,
    frame: &serde_json::Value,
) -> std::result::Result<(), String> {
    sink.send(WsMessage::Text(frame.to_string().into()))
        .await
        .map_err(|err| err.to_string())
}
