//! Live stats channel state machine.
//!
//! [`StatsChannel`] owns the merged [`AggregateStats`], the loading flag and
//! the connection bookkeeping, but performs no IO. Each transport or timer
//! event is fed in through a transition method, which returns the
//! [`ChannelCommand`]s the driver must carry out.
//!
//! Invariants:
//!
//! - at most one retry is pending; scheduling a new one cancels the old one
//!   in the same transition
//! - once deactivated, no transition schedules a retry, opens a connection,
//!   or mutates the stats
//! - transport failures never surface as errors, only as `is_loading`

use std::time::Duration;

use tracing::{debug, info, warn};

use super::backoff::Backoff;
use crate::domain::stats::AggregateStats;

/// Identifies one scheduled retry. A timer carrying a stale token is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryToken(u64);

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCommand {
    /// Open a connection to the streaming endpoint.
    Connect,
    /// Arm the retry timer. Replaces any timer still armed.
    ScheduleRetry { token: RetryToken, delay: Duration },
    /// Disarm the pending retry timer.
    CancelRetry,
    /// Close the connection, ignoring errors from the close itself.
    Disconnect,
    /// The consumer-visible view changed.
    Publish,
}

/// Connection bookkeeping, private to one channel instance.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    attempt_count: u32,
    pending_retry: Option<RetryToken>,
    is_live: bool,
}

impl ConnectionState {
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    #[must_use]
    pub const fn pending_retry(&self) -> Option<RetryToken> {
        self.pending_retry
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.is_live
    }
}

/// What the presentation layer reads.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StatsView {
    pub stats: AggregateStats,
    pub is_loading: bool,
}

impl Default for StatsView {
    fn default() -> Self {
        Self {
            stats: AggregateStats::default(),
            is_loading: true,
        }
    }
}

/// Reconnecting stats channel, driven by transport and timer events.
#[derive(Debug)]
pub struct StatsChannel {
    stats: AggregateStats,
    is_loading: bool,
    connection: ConnectionState,
    backoff: Backoff,
    next_token: u64,
}

impl StatsChannel {
    #[must_use]
    pub fn new(backoff: Backoff) -> Self {
        Self {
            stats: AggregateStats::default(),
            is_loading: true,
            connection: ConnectionState::default(),
            backoff,
            next_token: 0,
        }
    }

    /// Start the channel: first connection attempt.
    pub fn activate(&mut self) -> Vec<ChannelCommand> {
        self.connection = ConnectionState {
            attempt_count: 0,
            pending_retry: None,
            is_live: true,
        };
        self.is_loading = true;
        vec![ChannelCommand::Connect]
    }

    /// The connection opened.
    pub fn on_open(&mut self) -> Vec<ChannelCommand> {
        if !self.connection.is_live {
            return vec![ChannelCommand::Disconnect];
        }
        info!(
            previous_attempts = self.connection.attempt_count,
            "Stats feed connected"
        );
        self.connection.attempt_count = 0;
        self.is_loading = true;
        vec![ChannelCommand::Publish]
    }

    /// A payload arrived. Malformed payloads are dropped without any effect.
    pub fn on_message(&mut self, payload: &str) -> Vec<ChannelCommand> {
        if !self.connection.is_live {
            return Vec::new();
        }
        match AggregateStats::parse_snapshot(payload) {
            Ok(snapshot) => {
                debug!(fields = snapshot.known_fields(), "Merging stats snapshot");
                self.stats.merge(snapshot);
                self.is_loading = false;
                vec![ChannelCommand::Publish]
            }
            Err(e) => {
                warn!(error = %e, bytes = payload.len(), "Discarding malformed stats payload");
                Vec::new()
            }
        }
    }

    /// The connection closed, failed to open, or errored.
    pub fn on_close(&mut self, reason: &str) -> Vec<ChannelCommand> {
        if !self.connection.is_live {
            debug!(reason, "Stats feed closed after teardown");
            return Vec::new();
        }
        self.schedule_retry(reason)
    }

    /// A retry timer fired.
    pub fn on_retry_elapsed(&mut self, token: RetryToken) -> Vec<ChannelCommand> {
        if !self.connection.is_live || self.connection.pending_retry != Some(token) {
            return Vec::new();
        }
        self.connection.pending_retry = None;
        info!(attempt = self.connection.attempt_count, "Reconnecting stats feed");
        vec![ChannelCommand::Connect]
    }

    /// Tear down: no further retries, connections or merges.
    pub fn deactivate(&mut self) -> Vec<ChannelCommand> {
        self.connection.is_live = false;
        let mut commands = Vec::with_capacity(2);
        if self.connection.pending_retry.take().is_some() {
            commands.push(ChannelCommand::CancelRetry);
        }
        commands.push(ChannelCommand::Disconnect);
        debug!("Stats channel deactivated");
        commands
    }

    /// Cancel-then-schedule as a single step.
    fn schedule_retry(&mut self, reason: &str) -> Vec<ChannelCommand> {
        let mut commands = Vec::with_capacity(2);
        if self.connection.pending_retry.take().is_some() {
            commands.push(ChannelCommand::CancelRetry);
        }

        self.connection.attempt_count = self.connection.attempt_count.saturating_add(1);
        let delay = self.backoff.delay(self.connection.attempt_count);
        self.next_token += 1;
        let token = RetryToken(self.next_token);
        self.connection.pending_retry = Some(token);

        warn!(
            reason,
            attempt = self.connection.attempt_count,
            delay_ms = delay.as_millis() as u64,
            "Stats feed disconnected, scheduling reconnect"
        );
        commands.push(ChannelCommand::ScheduleRetry { token, delay });
        commands
    }

    #[must_use]
    pub const fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub const fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    /// Snapshot of the consumer-visible state.
    #[must_use]
    pub fn view(&self) -> StatsView {
        StatsView {
            stats: self.stats.clone(),
            is_loading: self.is_loading,
        }
    }
}
