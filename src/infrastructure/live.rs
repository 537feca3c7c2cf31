//! Live stats channel runtime.
//!
//! [`LiveStatsChannel::activate`] spawns one task that owns the feed, the
//! [`StatsChannel`] state machine and the single retry timer. Feed events,
//! the timer and the shutdown signal are all handled from one
//! `tokio::select!` loop, so transitions never run concurrently. The latest
//! [`StatsView`] is published through a `watch` channel held by the
//! returned [`StatsSubscription`].

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::{debug, info, warn};

use crate::adapter::outbound::websocket::WebSocketStatsFeed;
use crate::application::stats::{Backoff, ChannelCommand, RetryToken, StatsChannel, StatsView};
use crate::infrastructure::config::Config;
use crate::port::outbound::feed::{FeedEvent, StatsFeed};

/// Upper bound on a graceful close during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// An inactive channel: a feed plus its reconnect policy.
pub struct LiveStatsChannel<F> {
    feed: F,
    backoff: Backoff,
}

impl<F: StatsFeed + 'static> LiveStatsChannel<F> {
    #[must_use]
    pub const fn new(feed: F, backoff: Backoff) -> Self {
        Self { feed, backoff }
    }

    /// Open the channel. Returns immediately; data arrives asynchronously.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(self) -> StatsSubscription {
        let (view_tx, view_rx) = watch::channel(StatsView::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = ChannelDriver {
            feed: self.feed,
            channel: StatsChannel::new(self.backoff),
            view_tx,
            retry: None,
            connected: false,
        };
        let task = tokio::spawn(driver.run(shutdown_rx));

        StatsSubscription {
            view_rx,
            shutdown_tx,
            task: Some(task),
        }
    }
}

impl LiveStatsChannel<WebSocketStatsFeed> {
    /// Channel over the configured WebSocket endpoint.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            WebSocketStatsFeed::new(config.network.ws_url.clone()),
            Backoff::from(&config.reconnection),
        )
    }
}

/// Handle to an active channel.
///
/// Deactivate it exactly once with [`StatsSubscription::deactivate`].
/// Dropping it instead aborts the channel task.
pub struct StatsSubscription {
    view_rx: watch::Receiver<StatsView>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl StatsSubscription {
    /// Latest merged stats and loading flag.
    #[must_use]
    pub fn current(&self) -> StatsView {
        self.view_rx.borrow().clone()
    }

    /// Wait for the next published view.
    ///
    /// Returns `None` once the channel task has stopped.
    pub async fn changed(&mut self) -> Option<StatsView> {
        self.view_rx.changed().await.ok()?;
        Some(self.view_rx.borrow_and_update().clone())
    }

    /// Independent receiver for push-style consumers.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<StatsView> {
        self.view_rx.clone()
    }

    /// Tear the channel down and wait for the task to finish.
    ///
    /// Cancels any pending retry and closes any open connection. Safe at
    /// every point of the lifecycle.
    pub async fn deactivate(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Stats channel task ended abnormally");
            }
        }
    }
}

impl Drop for StatsSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct PendingRetry {
    token: RetryToken,
    sleep: Pin<Box<Sleep>>,
}

/// Executes [`ChannelCommand`]s against a feed.
struct ChannelDriver<F> {
    feed: F,
    channel: StatsChannel,
    view_tx: watch::Sender<StatsView>,
    /// At most one armed timer; replacing it drops (cancels) the old one.
    retry: Option<PendingRetry>,
    connected: bool,
}

impl<F: StatsFeed> ChannelDriver<F> {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(endpoint = self.feed.endpoint(), "Stats channel activated");
        let mut pending: VecDeque<ChannelCommand> = self.channel.activate().into();

        loop {
            while let Some(command) = pending.pop_front() {
                match command {
                    ChannelCommand::Connect => {
                        tokio::select! {
                            biased;
                            () = wait_for_shutdown(&mut shutdown) => {
                                self.teardown().await;
                                return;
                            }
                            result = self.feed.connect() => {
                                let next = match result {
                                    Ok(()) => {
                                        self.connected = true;
                                        self.channel.on_open()
                                    }
                                    Err(e) => self.channel.on_close(&e.to_string()),
                                };
                                pending.extend(next);
                            }
                        }
                    }
                    ChannelCommand::ScheduleRetry { token, delay } => {
                        self.retry = Some(PendingRetry {
                            token,
                            sleep: Box::pin(tokio::time::sleep(delay)),
                        });
                    }
                    ChannelCommand::CancelRetry => self.retry = None,
                    ChannelCommand::Disconnect => self.disconnect().await,
                    ChannelCommand::Publish => {
                        self.view_tx.send_replace(self.channel.view());
                    }
                }
            }

            tokio::select! {
                biased;
                () = wait_for_shutdown(&mut shutdown) => {
                    self.teardown().await;
                    return;
                }
                token = next_retry(&mut self.retry) => {
                    pending.extend(self.channel.on_retry_elapsed(token));
                }
                event = self.feed.next_event(), if self.connected => {
                    let next = match event {
                        Some(FeedEvent::Payload(text)) => self.channel.on_message(&text),
                        Some(FeedEvent::Disconnected { reason }) => {
                            self.connected = false;
                            self.channel.on_close(&reason)
                        }
                        None => {
                            self.connected = false;
                            self.channel.on_close("stream ended")
                        }
                    };
                    pending.extend(next);
                }
            }
        }
    }

    async fn teardown(&mut self) {
        for command in self.channel.deactivate() {
            match command {
                ChannelCommand::CancelRetry => self.retry = None,
                ChannelCommand::Disconnect => self.disconnect().await,
                _ => {}
            }
        }
        self.retry = None;
        info!(endpoint = self.feed.endpoint(), "Stats channel deactivated");
    }

    /// Close the feed; errors from the close itself are swallowed.
    async fn disconnect(&mut self) {
        self.connected = false;
        match tokio::time::timeout(CLOSE_TIMEOUT, self.feed.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Ignoring error while closing stats feed"),
            Err(_) => debug!("Timed out closing stats feed"),
        }
    }
}

/// Resolves once shutdown is requested or the subscription is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Resolves when the armed retry timer fires; pends forever if none is armed.
async fn next_retry(retry: &mut Option<PendingRetry>) -> RetryToken {
    match retry {
        Some(pending) => {
            pending.sleep.as_mut().await;
            let token = pending.token;
            *retry = None;
            token
        }
        None => std::future::pending().await,
    }
}
