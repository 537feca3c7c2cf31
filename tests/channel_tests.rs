//! End-to-end behavior of the live stats channel against a channel-backed
//! feed, with the tokio clock paused so retry delays are exact.

use std::time::Duration;

use coopdash::application::stats::{Backoff, StatsView};
use coopdash::infrastructure::live::{LiveStatsChannel, StatsSubscription};
use coopdash::testkit::stream::{channel_feed, ChannelFeedHandle, ConnectOutcome};
use rust_decimal_macros::dec;
use tokio::time::Instant;

fn activate() -> (StatsSubscription, ChannelFeedHandle) {
    let (feed, handle) = channel_feed();
    let subscription = LiveStatsChannel::new(feed, Backoff::default()).activate();
    (subscription, handle)
}

/// Wait for the next publish, failing the test instead of hanging.
async fn next_view(subscription: &mut StatsSubscription) -> StatsView {
    tokio::time::timeout(Duration::from_secs(300), subscription.changed())
        .await
        .expect("no publish within 300s")
        .expect("channel task stopped")
}

fn gaps(times: &[Instant]) -> Vec<Duration> {
    times.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn starts_loading_with_empty_stats() {
    let (subscription, handle) = activate();
    let view = subscription.current();
    assert!(view.is_loading);
    assert_eq!(view.stats.known_fields(), 0);

    handle.wait_for_connects(1).await;
    subscription.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn snapshots_merge_field_by_field() {
    let (mut subscription, handle) = activate();
    let opened = next_view(&mut subscription).await;
    assert!(opened.is_loading);

    handle.send(r#"{"total_savings": 8500, "generated_at": "2024-11-01T00:00:00Z"}"#);
    let view = next_view(&mut subscription).await;
    assert!(!view.is_loading);
    assert_eq!(view.stats.total_savings, Some(dec!(8500)));
    assert_eq!(view.stats.total_loans, None);

    handle.send(r#"{"total_loans": 1200}"#);
    let view = next_view(&mut subscription).await;
    assert_eq!(view.stats.total_savings, Some(dec!(8500)));
    assert_eq!(view.stats.total_loans, Some(dec!(1200)));
    assert!(view.stats.generated_at.is_some());

    subscription.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn malformed_message_changes_nothing() {
    let (mut subscription, handle) = activate();
    next_view(&mut subscription).await;

    handle.send(r#"{"user_count": 40}"#);
    let before = next_view(&mut subscription).await;

    handle.send("{not json");
    handle.send("[1, 2, 3]");
    handle.send(r#"{"generated_at": "yesterday"}"#);
    let quiet = tokio::time::timeout(Duration::from_secs(5), subscription.changed()).await;
    assert!(quiet.is_err(), "malformed payloads must not publish");
    assert_eq!(subscription.current(), before);

    // the connection survived
    handle.send(r#"{"user_count": 41}"#);
    let after = next_view(&mut subscription).await;
    assert_eq!(after.stats.user_count, Some(41));
    assert_eq!(handle.connect_count(), 1);
    assert_eq!(handle.close_count(), 0);

    subscription.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn number_shapes_do_not_drop_the_snapshot() {
    let (mut subscription, handle) = activate();
    next_view(&mut subscription).await;

    handle.send(r#"{"total_savings": 8500, "user_count": 12.0}"#);
    let view = next_view(&mut subscription).await;
    assert_eq!(view.stats.total_savings, Some(dec!(8500)));
    assert_eq!(view.stats.user_count, Some(12));

    handle.send(r#"{"total_savings": 1e30, "total_loans": 1200}"#);
    let view = next_view(&mut subscription).await;
    assert_eq!(view.stats.total_savings, Some(dec!(8500)));
    assert_eq!(view.stats.total_loans, Some(dec!(1200)));

    subscription.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn drop_then_reopen_after_two_seconds() {
    let (mut subscription, handle) = activate();
    next_view(&mut subscription).await;

    handle.send(r#"{"total_savings": 8500}"#);
    next_view(&mut subscription).await;
    handle.send(r#"{"total_loans": 1200}"#);
    next_view(&mut subscription).await;

    let dropped_at = Instant::now();
    handle.disconnect("network lost");
    let reopened = next_view(&mut subscription).await;

    assert_eq!(dropped_at.elapsed(), Duration::from_millis(2_000));
    assert_eq!(handle.connect_count(), 2);
    assert!(reopened.is_loading);
    // values are kept across the reopen
    assert_eq!(reopened.stats.total_savings, Some(dec!(8500)));
    assert_eq!(reopened.stats.total_loans, Some(dec!(1200)));

    handle.send(r#"{"total_penalties": 300}"#);
    let view = next_view(&mut subscription).await;
    assert!(!view.is_loading);
    assert_eq!(view.stats.total_savings, Some(dec!(8500)));
    assert_eq!(view.stats.total_penalties, Some(dec!(300)));

    subscription.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn failed_opens_back_off_exponentially() {
    let (feed, handle) = channel_feed();
    handle.script_connects((0..6).map(|i| ConnectOutcome::Fail(format!("refused #{i}"))));
    let mut subscription = LiveStatsChannel::new(feed, Backoff::default()).activate();

    // seventh attempt succeeds
    next_view(&mut subscription).await;

    assert_eq!(handle.connect_count(), 7);
    let expected: Vec<Duration> = [2_000, 4_000, 8_000, 16_000, 30_000, 30_000]
        .into_iter()
        .map(Duration::from_millis)
        .collect();
    assert_eq!(gaps(&handle.connect_times()), expected);

    subscription.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn successful_open_resets_backoff() {
    let (feed, handle) = channel_feed();
    handle.script_connects([
        ConnectOutcome::Fail("refused".into()),
        ConnectOutcome::Fail("refused".into()),
    ]);
    let mut subscription = LiveStatsChannel::new(feed, Backoff::default()).activate();
    next_view(&mut subscription).await;
    assert_eq!(handle.connect_count(), 3);

    handle.disconnect("server restart");
    next_view(&mut subscription).await;

    let gaps = gaps(&handle.connect_times());
    assert_eq!(gaps[0], Duration::from_millis(2_000));
    assert_eq!(gaps[1], Duration::from_millis(4_000));
    // the drop after a successful open starts over at attempt 1
    assert_eq!(gaps[2], Duration::from_millis(2_000));

    subscription.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn ended_stream_is_treated_as_close() {
    let (mut subscription, handle) = activate();
    next_view(&mut subscription).await;

    handle.end();
    next_view(&mut subscription).await;

    assert_eq!(handle.connect_count(), 2);
    assert_eq!(gaps(&handle.connect_times()), vec![Duration::from_millis(2_000)]);
    subscription.deactivate().await;
}

#[tokio::test(start_paused = true)]
async fn deactivate_while_open_closes_connection() {
    let (mut subscription, handle) = activate();
    next_view(&mut subscription).await;
    handle.send(r#"{"total_savings": 10}"#);
    let last = next_view(&mut subscription).await;

    let watcher = subscription.watch();
    subscription.deactivate().await;
    assert_eq!(handle.close_count(), 1);

    // nothing reaches the view once deactivated
    handle.send(r#"{"total_savings": 99}"#);
    handle.disconnect("late close");
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(*watcher.borrow(), last);
    assert_eq!(handle.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn deactivate_while_retry_pending_cancels_it() {
    let (feed, handle) = channel_feed();
    handle.script_connects([ConnectOutcome::Fail("refused".into())]);
    let subscription = LiveStatsChannel::new(feed, Backoff::default()).activate();
    handle.wait_for_connects(1).await;

    // the 2s retry is armed; tear down before it fires
    tokio::time::sleep(Duration::from_millis(500)).await;
    subscription.deactivate().await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(handle.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn deactivate_before_first_open_never_connects_again() {
    let (feed, handle) = channel_feed();
    handle.script_connects([ConnectOutcome::Hang]);
    let subscription = LiveStatsChannel::new(feed, Backoff::default()).activate();
    handle.wait_for_connects(1).await;

    let watcher = subscription.watch();
    subscription.deactivate().await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(handle.connect_count(), 1);
    assert_eq!(*watcher.borrow(), StatsView::default());
}

#[tokio::test(start_paused = true)]
async fn independent_subscriptions_do_not_share_state() {
    let (mut first, first_handle) = activate();
    let (mut second, second_handle) = activate();
    next_view(&mut first).await;
    next_view(&mut second).await;

    first_handle.send(r#"{"user_count": 7}"#);
    let view = next_view(&mut first).await;
    assert_eq!(view.stats.user_count, Some(7));
    assert_eq!(second.current().stats.user_count, None);

    first.deactivate().await;
    second_handle.send(r#"{"user_count": 9}"#);
    assert_eq!(next_view(&mut second).await.stats.user_count, Some(9));
    second.deactivate().await;
}
