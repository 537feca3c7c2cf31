//! Mock [`StatsFeed`] implementations for testing.
//!
//! - [`ScriptedFeed`] - Pre-loaded connect results and events.
//!   Best for: parsing and retry behavior driven by a fixed script.
//!
//! - [`ChannelFeed`] - Channel-backed feed with external control handle.
//!   Best for: integration tests needing precise, on-demand event delivery.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::port::outbound::feed::{FeedEvent, StatsFeed};

// ---------------------------------------------------------------------------
// ScriptedFeed
// ---------------------------------------------------------------------------

/// A mock feed with scripted connect results and a fixed event queue.
///
/// Each call to `connect()` pops the next result (defaults to `Ok(())`
/// when exhausted). Once the event queue is drained the connection stays
/// open and silent.
pub struct ScriptedFeed {
    connect_results: VecDeque<Result<()>>,
    events: VecDeque<Option<FeedEvent>>,
    connect_count: Arc<AtomicU32>,
    close_count: Arc<AtomicU32>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            events: VecDeque::new(),
            connect_count: Arc::new(AtomicU32::new(0)),
            close_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    /// `None` entries end the stream.
    pub fn with_events(mut self, events: Vec<Option<FeedEvent>>) -> Self {
        self.events = events.into();
        self
    }

    /// Shared counter for asserting connect calls after the feed is moved.
    pub fn connect_counter(&self) -> Arc<AtomicU32> {
        self.connect_count.clone()
    }

    /// Shared counter for asserting close calls after the feed is moved.
    pub fn close_counter(&self) -> Arc<AtomicU32> {
        self.close_count.clone()
    }
}

impl Default for ScriptedFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsFeed for ScriptedFeed {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "mock://scripted"
    }
}

// ---------------------------------------------------------------------------
// ChannelFeed
// ---------------------------------------------------------------------------

/// What the next `connect()` on a [`ChannelFeed`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Succeed,
    Fail(String),
    /// Never completes, like a handshake that stalls.
    Hang,
}

#[derive(Default)]
struct FeedLog {
    outcomes: VecDeque<ConnectOutcome>,
    connect_times: Vec<Instant>,
    close_count: u32,
}

/// A mock feed controlled externally via a [`ChannelFeedHandle`].
///
/// Events sent through the handle are read by the consumer via
/// `next_event()`. No real network I/O.
pub struct ChannelFeed {
    event_rx: mpsc::UnboundedReceiver<Option<FeedEvent>>,
    log: Arc<Mutex<FeedLog>>,
    connects_tx: watch::Sender<u32>,
}

/// Control handle for a [`ChannelFeed`].
pub struct ChannelFeedHandle {
    event_tx: mpsc::UnboundedSender<Option<FeedEvent>>,
    log: Arc<Mutex<FeedLog>>,
    connects_rx: watch::Receiver<u32>,
}

impl ChannelFeedHandle {
    /// Deliver one text message.
    pub fn send(&self, payload: impl Into<String>) {
        let _ = self.event_tx.send(Some(FeedEvent::Payload(payload.into())));
    }

    /// Simulate the server or network dropping the connection.
    pub fn disconnect(&self, reason: impl Into<String>) {
        let _ = self.event_tx.send(Some(FeedEvent::Disconnected {
            reason: reason.into(),
        }));
    }

    /// Signal end-of-stream (causes `next_event` to return `None`).
    pub fn end(&self) {
        let _ = self.event_tx.send(None);
    }

    /// Queue outcomes for upcoming `connect()` calls; later calls succeed.
    pub fn script_connects(&self, outcomes: impl IntoIterator<Item = ConnectOutcome>) {
        self.log.lock().outcomes.extend(outcomes);
    }

    /// How many times `connect()` was called.
    pub fn connect_count(&self) -> u32 {
        *self.connects_rx.borrow()
    }

    /// When each `connect()` call started.
    pub fn connect_times(&self) -> Vec<Instant> {
        self.log.lock().connect_times.clone()
    }

    /// How many times `close()` was called.
    pub fn close_count(&self) -> u32 {
        self.log.lock().close_count
    }

    /// Wait until `connect()` has been called at least `n` times.
    pub async fn wait_for_connects(&self, n: u32) {
        let mut rx = self.connects_rx.clone();
        let _ = rx.wait_for(|count| *count >= n).await;
    }
}

/// Create a [`ChannelFeed`] and its control [`ChannelFeedHandle`].
pub fn channel_feed() -> (ChannelFeed, ChannelFeedHandle) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (connects_tx, connects_rx) = watch::channel(0);
    let log = Arc::new(Mutex::new(FeedLog::default()));
    (
        ChannelFeed {
            event_rx,
            log: log.clone(),
            connects_tx,
        },
        ChannelFeedHandle {
            event_tx,
            log,
            connects_rx,
        },
    )
}

#[async_trait]
impl StatsFeed for ChannelFeed {
    async fn connect(&mut self) -> Result<()> {
        let outcome = {
            let mut log = self.log.lock();
            log.connect_times.push(Instant::now());
            log.outcomes.pop_front().unwrap_or(ConnectOutcome::Succeed)
        };
        self.connects_tx.send_modify(|count| *count += 1);

        match outcome {
            ConnectOutcome::Succeed => Ok(()),
            ConnectOutcome::Fail(reason) => Err(Error::Connection(reason)),
            ConnectOutcome::Hang => std::future::pending().await,
        }
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        self.event_rx.recv().await.flatten()
    }

    async fn close(&mut self) -> Result<()> {
        self.log.lock().close_count += 1;
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "mock://channel"
    }
}
