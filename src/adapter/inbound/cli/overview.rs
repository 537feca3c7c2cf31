//! Live statistics overview.
//!
//! [`OverviewModel`] is the read model the dashboard header shows: four
//! metric cards and two latest-activity panels, all derived from the
//! current [`StatsView`]. `watch` and `overview` drive a
//! [`LiveStatsChannel`] and render that model.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::adapter::inbound::cli::output;
use crate::application::stats::StatsView;
use crate::domain::format::{format_count, format_updated_at, format_whole};
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::infrastructure::live::LiveStatsChannel;

const LOADING: &str = "loading...";
const NO_ACTIVITY: &str = "no recent activity";

/// One headline number. `value` is `None` while it is not known yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: Option<String>,
}

/// What a latest-activity panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActivityState {
    Loading,
    NoActivity,
    Activity {
        amount: String,
        updated: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityPanel {
    pub label: &'static str,
    #[serde(flatten)]
    pub state: ActivityState,
}

/// Cards and panels for one [`StatsView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewModel {
    pub is_loading: bool,
    pub cards: Vec<MetricCard>,
    pub panels: Vec<ActivityPanel>,
}

impl OverviewModel {
    #[must_use]
    pub fn from_view(view: &StatsView) -> Self {
        let stats = &view.stats;
        let loading = view.is_loading;

        let amount = |value: Option<Decimal>| value.filter(|_| !loading).map(format_whole);
        let cards = vec![
            MetricCard {
                label: "Total Savings",
                value: amount(stats.total_savings),
            },
            MetricCard {
                label: "Total Loans",
                value: amount(stats.total_loans),
            },
            MetricCard {
                label: "Total Penalties",
                value: amount(stats.total_penalties),
            },
            MetricCard {
                label: "Members",
                value: stats.user_count.filter(|_| !loading).map(format_count),
            },
        ];

        let updated = stats.generated_at.map(format_updated_at);
        let panel = |label, value: Option<Decimal>| ActivityPanel {
            label,
            state: match value {
                _ if loading => ActivityState::Loading,
                Some(amount) if !amount.is_zero() => ActivityState::Activity {
                    amount: format_whole(amount),
                    updated: updated.clone(),
                },
                _ => ActivityState::NoActivity,
            },
        };
        let panels = vec![
            panel("Latest Saving", stats.sum_latest_saving),
            panel("Latest Loan Payments", stats.sum_latest_loan_payments),
        ];

        Self {
            is_loading: loading,
            cards,
            panels,
        }
    }

    /// Print the model in the current output mode.
    pub fn render(&self) {
        if output::is_json() {
            output::json_output(&json!({ "command": "overview", "overview": self }));
            return;
        }

        output::section("Overview");
        for card in &self.cards {
            match &card.value {
                Some(value) => output::field(card.label, output::highlight(value)),
                None => output::field(card.label, output::muted(LOADING)),
            }
        }

        output::section("Latest activity");
        for panel in &self.panels {
            match &panel.state {
                ActivityState::Loading => output::field(panel.label, output::muted(LOADING)),
                ActivityState::NoActivity => {
                    output::field(panel.label, output::muted(NO_ACTIVITY));
                }
                ActivityState::Activity { amount, updated } => {
                    let text = match updated {
                        Some(at) => format!(
                            "{} {}",
                            output::highlight(amount),
                            output::muted(format!("updated {at}"))
                        ),
                        None => output::highlight(amount),
                    };
                    output::field(panel.label, text);
                }
            }
        }
    }
}

/// Stream the overview until Ctrl-C.
pub async fn execute_watch(config: &Config) -> Result<()> {
    output::header(env!("CARGO_PKG_VERSION"));
    output::hint("press Ctrl-C to stop");

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let mut subscription = LiveStatsChannel::from_config(config).activate();
    OverviewModel::from_view(&subscription.current()).render();

    loop {
        tokio::select! {
            biased;

            _ = &mut interrupt => {
                info!("Interrupted, closing stats channel");
                break;
            }
            changed = subscription.changed() => match changed {
                Some(view) => OverviewModel::from_view(&view).render(),
                None => break,
            },
        }
    }

    subscription.deactivate().await;
    Ok(())
}

/// Print the overview once, waiting up to `timeout` for the first snapshot.
pub async fn execute_overview(config: &Config, timeout: Duration) -> Result<()> {
    let subscription = LiveStatsChannel::from_config(config).activate();
    let mut rx = subscription.watch();

    let pb = output::spinner("Waiting for live statistics...");
    let first = tokio::time::timeout(timeout, rx.wait_for(|view| !view.is_loading))
        .await
        .ok()
        .and_then(|result| result.ok().map(|view| view.clone()));
    let view = match first {
        Some(view) => {
            output::spinner_success(&pb, "Statistics received");
            view
        }
        None => {
            output::spinner_warn(
                &pb,
                &format!("No statistics within {}s", timeout.as_secs()),
            );
            subscription.current()
        }
    };

    OverviewModel::from_view(&view).render();
    subscription.deactivate().await;
    Ok(())
}
