use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use weatherlink_store::NodeTree;
use weatherlink_sync::fetch::mock::StaticFetcher;
use weatherlink_sync::timer::mock::ManualTimer;
use weatherlink_sync::{
    FieldSynchronizer, Fetcher, PollScheduler, PollState, SourceConfig, TokioTimer,
    TransportError,
};
use weatherlink_types::{NodePath, Value};

const BODY: &str = r#"{"main":{"temp":285.35,"pressure":1021,"humidity":58}}"#;
const INITIAL: Duration = Duration::from_secs(1);
const INTERVAL: Duration = Duration::from_secs(60);

fn scheduler_with(
    fetcher: Arc<dyn Fetcher>,
    timer: Arc<ManualTimer>,
) -> (PollScheduler, Arc<NodeTree>) {
    let settings = SourceConfig::default().settings().unwrap();
    let tree = Arc::new(NodeTree::new());
    let sync = FieldSynchronizer::new(fetcher, tree.clone(), &settings);
    (PollScheduler::new(sync, timer, INITIAL, INTERVAL), tree)
}

/// Blocks inside `fetch` until released.
struct GatedFetcher {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
}

impl GatedFetcher {
    fn new() -> Self {
        Self {
            started: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(BODY.as_bytes().to_vec())
    }
}

// ── State machine ───────────────────────────────────────────────

#[tokio::test]
async fn starts_idle_without_timers() {
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(Arc::new(StaticFetcher::with_body(BODY)), timer.clone());

    assert_eq!(scheduler.state(), PollState::Idle);
    assert_eq!(timer.pending(), 0);
    assert_eq!(scheduler.status().passes, 0);
}

#[tokio::test]
async fn connect_arms_initial_poll() {
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(Arc::new(StaticFetcher::with_body(BODY)), timer.clone());

    scheduler.on_connected();
    assert_eq!(scheduler.state(), PollState::Polling);
    assert_eq!(timer.delays(), vec![INITIAL]);
}

#[tokio::test]
async fn fired_poll_syncs_and_rearms() {
    let fetcher = Arc::new(StaticFetcher::with_body(BODY));
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, tree) = scheduler_with(fetcher.clone(), timer.clone());

    scheduler.on_connected();
    assert!(timer.fire_next().await);

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(timer.delays(), vec![INTERVAL]);
    assert_eq!(
        tree.get(&NodePath::parse("/humidity").unwrap()).await.unwrap().value,
        Some(Value::Int(58))
    );

    assert!(timer.fire_next().await);
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(timer.pending(), 1);

    let status = scheduler.status();
    assert_eq!(status.passes, 2);
    assert_eq!(status.failures, 0);
    assert!(status.last_success_at.is_some());
    assert_eq!(status.last_report.unwrap().published, 3);
}

#[tokio::test]
async fn scenario_d_disconnect_voids_armed_poll() {
    let fetcher = Arc::new(StaticFetcher::with_body(BODY));
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, tree) = scheduler_with(fetcher.clone(), timer.clone());

    scheduler.on_connected();
    scheduler.on_disconnected();
    assert_eq!(scheduler.state(), PollState::Stopped);

    assert!(timer.fire_next().await);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(timer.pending(), 0);
    assert!(tree.is_empty().await);
}

#[tokio::test]
async fn disconnect_after_passes_stops_chain() {
    let fetcher = Arc::new(StaticFetcher::with_body(BODY));
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(fetcher.clone(), timer.clone());

    scheduler.on_connected();
    timer.fire_next().await;
    timer.fire_next().await;
    scheduler.on_disconnected();
    timer.fire_next().await;

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(timer.pending(), 0);
}

#[tokio::test]
async fn reconnect_restarts_polling() {
    let fetcher = Arc::new(StaticFetcher::with_body(BODY));
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(fetcher.clone(), timer.clone());

    scheduler.on_connected();
    scheduler.on_disconnected();
    scheduler.on_connected();
    assert_eq!(scheduler.state(), PollState::Polling);
    assert_eq!(timer.delays(), vec![INITIAL, INITIAL]);

    // Timer from the first connection is void.
    timer.fire_next().await;
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(timer.pending(), 1);

    timer.fire_next().await;
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(timer.delays(), vec![INTERVAL]);
}

#[tokio::test]
async fn connect_while_polling_is_ignored() {
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(Arc::new(StaticFetcher::with_body(BODY)), timer.clone());

    scheduler.on_connected();
    scheduler.on_connected();
    assert_eq!(timer.pending(), 1);
}

#[tokio::test]
async fn disconnect_before_connect_is_stopped() {
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(Arc::new(StaticFetcher::with_body(BODY)), timer.clone());

    scheduler.on_disconnected();
    assert_eq!(scheduler.state(), PollState::Stopped);
    assert_eq!(timer.pending(), 0);
}

// ── Failures ────────────────────────────────────────────────────

#[tokio::test]
async fn failed_pass_is_recorded_and_rearmed() {
    let fetcher = Arc::new(StaticFetcher::failing(TransportError::Request {
        url: "http://api.openweathermap.org/data/2.5/weather".into(),
        message: "dns error".into(),
    }));
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, tree) = scheduler_with(fetcher.clone(), timer.clone());

    scheduler.on_connected();
    timer.fire_next().await;

    let status = scheduler.status();
    assert_eq!(status.passes, 1);
    assert_eq!(status.failures, 1);
    assert!(status.last_error.unwrap().contains("dns error"));
    assert!(status.last_success_at.is_none());
    assert_eq!(timer.delays(), vec![INTERVAL]);
    assert!(tree.is_empty().await);
}

#[tokio::test]
async fn success_clears_last_error() {
    let fetcher = Arc::new(StaticFetcher::with_body(BODY));
    fetcher.queue(Err(TransportError::Body {
        url: "x".into(),
        message: "reset".into(),
    }));
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(fetcher, timer.clone());

    scheduler.on_connected();
    timer.fire_next().await;
    assert!(scheduler.status().last_error.is_some());
    timer.fire_next().await;
    assert!(scheduler.status().last_error.is_none());
}

// ── Reentrancy ──────────────────────────────────────────────────

#[tokio::test]
async fn overlapping_pass_is_skipped() {
    let fetcher = Arc::new(GatedFetcher::new());
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(fetcher.clone(), timer.clone());

    scheduler.on_connected();
    let first = tokio::spawn(timer.take_next().unwrap());
    fetcher.started.notified().await;

    // Reconnect while the first pass is still fetching.
    scheduler.on_disconnected();
    scheduler.on_connected();
    timer.fire_next().await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.status().overlaps, 1);
    // The new connection's opening tick is retried after the initial delay.
    assert_eq!(timer.delays(), vec![INITIAL]);

    fetcher.release.notify_one();
    first.await.unwrap();

    // The old pass finished but does not re-arm.
    assert_eq!(timer.pending(), 1);
    assert_eq!(scheduler.status().passes, 1);

    // The retried opening tick runs a pass and falls back to the interval.
    fetcher.release.notify_one();
    timer.fire_next().await;
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert_eq!(scheduler.status().passes, 2);
    assert_eq!(timer.delays(), vec![INTERVAL]);
}

#[tokio::test]
async fn opening_tick_retries_until_old_pass_ends() {
    let fetcher = Arc::new(GatedFetcher::new());
    let timer = Arc::new(ManualTimer::new());
    let (scheduler, _) = scheduler_with(fetcher.clone(), timer.clone());

    scheduler.on_connected();
    let opening = tokio::spawn(timer.take_next().unwrap());
    fetcher.started.notified().await;
    fetcher.release.notify_one();
    opening.await.unwrap();
    assert_eq!(timer.delays(), vec![INTERVAL]);

    let second = tokio::spawn(timer.take_next().unwrap());
    fetcher.started.notified().await;

    scheduler.on_disconnected();
    scheduler.on_connected();
    timer.fire_next().await;
    timer.fire_next().await;
    assert_eq!(scheduler.status().overlaps, 2);
    assert_eq!(timer.delays(), vec![INITIAL]);

    fetcher.release.notify_one();
    second.await.unwrap();
    assert_eq!(timer.pending(), 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

// ── Tokio timer ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn tokio_timer_polls_on_interval_until_disconnect() {
    let fetcher = Arc::new(StaticFetcher::with_body(BODY));
    let settings = SourceConfig::default().settings().unwrap();
    let tree = Arc::new(NodeTree::new());
    let sync = FieldSynchronizer::new(fetcher.clone(), tree, &settings);
    let timer = Arc::new(TokioTimer::current().unwrap());
    let scheduler = PollScheduler::new(sync, timer, INITIAL, INTERVAL);

    scheduler.on_connected();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fetcher.calls(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 1);

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(fetcher.calls(), 2);

    scheduler.on_disconnected();
    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(fetcher.calls(), 2);
}
