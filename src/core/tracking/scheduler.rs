use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::tracking_models::DEFAULT_INTERVAL_SECS;
use super::tracking_service::TrackingService;
use super::tracking_store::TrackingConfigStore;
use crate::core::stats::{format_stats_message, StatsFetcher};

const FETCH_FAILURE_NOTICE: &str =
    "⚠️ Failed to fetch game stats this cycle. Trying again on the next one.";

#[derive(Debug, thiserror::Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Output seam of the tick loop. The Discord layer implements this over
/// serenity's HTTP client; tests record messages in memory.
#[async_trait]
pub trait StatsSink: Send + Sync {
    async fn deliver(&self, channel_id: u64, message: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

struct GuildTimer {
    handle: JoinHandle<()>,
    interval_tx: watch::Sender<Duration>,
}

/// One independent timer per tracked guild.
///
/// The scheduler holds no authoritative config of its own: every tick
/// re-reads the store, so setter commands take effect on the next tick
/// boundary without touching the running task. The guild map is the single
/// piece of scheduler-owned state, and `start` claims an entry atomically
/// so a double `start` can never spawn a second timer for the same guild.
pub struct TrackingScheduler<S, F, D>
where
    S: TrackingConfigStore + 'static,
    F: StatsFetcher + 'static,
    D: StatsSink + 'static,
{
    service: Arc<TrackingService<S>>,
    fetcher: Arc<F>,
    sink: Arc<D>,
    timers: DashMap<u64, GuildTimer>,
}

impl<S, F, D> TrackingScheduler<S, F, D>
where
    S: TrackingConfigStore + 'static,
    F: StatsFetcher + 'static,
    D: StatsSink + 'static,
{
    pub fn new(service: Arc<TrackingService<S>>, fetcher: Arc<F>, sink: Arc<D>) -> Self {
        Self {
            service,
            fetcher,
            sink,
            timers: DashMap::new(),
        }
    }

    /// Begin ticking for a guild. Idempotent: a second `start` while the
    /// timer is running changes nothing. The first tick fires one full
    /// interval after this call, not immediately.
    pub async fn start(self: &Arc<Self>, guild_id: u64) -> StartOutcome {
        let interval = match self.service.config(guild_id).await {
            Ok(Some(config)) => Duration::from_secs(config.interval_secs),
            Ok(None) => Duration::from_secs(DEFAULT_INTERVAL_SECS),
            Err(err) => {
                tracing::warn!("Failed to read config for guild {}: {}", guild_id, err);
                Duration::from_secs(DEFAULT_INTERVAL_SECS)
            }
        };

        match self.timers.entry(guild_id) {
            Entry::Occupied(_) => StartOutcome::AlreadyRunning,
            Entry::Vacant(slot) => {
                let (interval_tx, interval_rx) = watch::channel(interval);
                let scheduler = Arc::clone(self);
                let handle =
                    tokio::spawn(async move { scheduler.run_loop(guild_id, interval_rx).await });
                slot.insert(GuildTimer {
                    handle,
                    interval_tx,
                });
                tracing::info!("Started tracking timer for guild {}", guild_id);
                StartOutcome::Started
            }
        }
    }

    /// Cancel the guild's timer. A pending tick never fires; an in-flight
    /// fetch is dropped without delivering anything.
    pub fn stop(&self, guild_id: u64) -> StopOutcome {
        match self.timers.remove(&guild_id) {
            Some((_, timer)) => {
                timer.handle.abort();
                tracing::info!("Stopped tracking timer for guild {}", guild_id);
                StopOutcome::Stopped
            }
            None => StopOutcome::NotRunning,
        }
    }

    /// Re-arm a running timer to a new period. The pending sleep restarts
    /// from now with the new duration, so the old deadline never fires.
    /// No-op when the guild has no running timer.
    pub fn update_interval(&self, guild_id: u64, interval_secs: u64) {
        if let Some(timer) = self.timers.get(&guild_id) {
            let _ = timer.interval_tx.send(Duration::from_secs(interval_secs));
        }
    }

    pub fn is_running(&self, guild_id: u64) -> bool {
        self.timers.contains_key(&guild_id)
    }

    async fn run_loop(self: Arc<Self>, guild_id: u64, mut interval_rx: watch::Receiver<Duration>) {
        loop {
            let period = *interval_rx.borrow_and_update();
            tokio::select! {
                _ = tokio::time::sleep(period) => self.tick(guild_id).await,
                changed = interval_rx.changed() => {
                    // Sender dropped means the timer entry is gone; bail out.
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }

    /// One fetch-and-deliver cycle. Runs sequentially within the guild's
    /// loop, so ticks can never overlap even when a fetch outlasts the
    /// interval. Every failure is terminal at this boundary.
    async fn tick(&self, guild_id: u64) {
        let config = match self.service.config(guild_id).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::debug!("No tracking config for guild {}, skipping tick", guild_id);
                return;
            }
            Err(err) => {
                tracing::warn!("Failed to read config for guild {}: {}", guild_id, err);
                return;
            }
        };

        if !config.active {
            tracing::debug!("Tracking inactive for guild {}, skipping tick", guild_id);
            return;
        }
        let (Some(game_id), Some(channel_id)) = (config.game_id, config.channel_id) else {
            tracing::debug!("Tracking config incomplete for guild {}, skipping tick", guild_id);
            return;
        };

        match self.fetcher.fetch(game_id).await {
            Ok(stats) => {
                let message = format_stats_message(&stats, config.milestone_step);
                if let Err(err) = self.sink.deliver(channel_id, &message).await {
                    tracing::warn!("Failed to deliver stats for guild {}: {}", guild_id, err);
                }
            }
            Err(err) => {
                tracing::warn!("Stats fetch failed for guild {}: {}", guild_id, err);
                if let Err(err) = self.sink.deliver(channel_id, FETCH_FAILURE_NOTICE).await {
                    tracing::warn!(
                        "Failed to deliver fetch-failure notice for guild {}: {}",
                        guild_id,
                        err
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::{FetchError, GameStats};
    use crate::core::tracking::tracking_service::tests::MemoryStore;
    use std::sync::Mutex;

    struct StaticFetcher(GameStats);

    #[async_trait]
    impl StatsFetcher for StaticFetcher {
        async fn fetch(&self, _: u64) -> Result<GameStats, FetchError> {
            Ok(self.0)
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl StatsFetcher for FailingFetcher {
        async fn fetch(&self, _: u64) -> Result<GameStats, FetchError> {
            Err(FetchError::Status(500))
        }
    }

    /// Fetcher that takes `delay` of (virtual) time before answering.
    struct SlowFetcher {
        delay: Duration,
        stats: GameStats,
    }

    #[async_trait]
    impl StatsFetcher for SlowFetcher {
        async fn fetch(&self, _: u64) -> Result<GameStats, FetchError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.stats)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<(u64, String)>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.messages.lock().unwrap().len()
        }

        fn last(&self) -> Option<(u64, String)> {
            self.messages.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl StatsSink for RecordingSink {
        async fn deliver(&self, channel_id: u64, message: &str) -> Result<(), DeliveryError> {
            self.messages
                .lock()
                .unwrap()
                .push((channel_id, message.to_string()));
            Ok(())
        }
    }

    const GUILD: u64 = 10;
    const GAME: u64 = 42;
    const CHANNEL: u64 = 7;

    type TestScheduler<F> = TrackingScheduler<MemoryStore, F, RecordingSink>;

    async fn scheduler_with<F: StatsFetcher + 'static>(
        fetcher: F,
        interval_secs: u64,
    ) -> (
        Arc<TestScheduler<F>>,
        Arc<TrackingService<MemoryStore>>,
        Arc<RecordingSink>,
    ) {
        let service = Arc::new(TrackingService::new(MemoryStore::default()));
        service.set_game(GUILD, GAME).await.unwrap();
        service.set_channel(GUILD, CHANNEL).await.unwrap();
        service.set_interval(GUILD, interval_secs).await.unwrap();
        service.set_active(GUILD, true).await.unwrap();

        let sink = Arc::new(RecordingSink::default());
        let scheduler = Arc::new(TrackingScheduler::new(
            Arc::clone(&service),
            Arc::new(fetcher),
            Arc::clone(&sink),
        ));
        (scheduler, service, sink)
    }

    /// Give spawned timer tasks a chance to run under paused time.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_fires_one_full_interval_after_start() {
        let (scheduler, _service, sink) =
            scheduler_with(StaticFetcher(GameStats { playing: 3, visits: 4210 }), 60).await;

        assert_eq!(scheduler.start(GUILD).await, StartOutcome::Started);
        settle().await;

        tokio::time::advance(Duration::from_secs(58)).await;
        settle().await;
        assert_eq!(sink.count(), 0, "tick must not fire before the interval");

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(sink.count(), 1);

        let (channel, message) = sink.last().unwrap();
        assert_eq!(channel, CHANNEL);
        assert!(message.contains("Visits: **4,210**"));
        assert!(message.contains("Next Milestone: **4,300 visits**"));
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let (scheduler, _service, sink) =
            scheduler_with(StaticFetcher(GameStats { playing: 1, visits: 0 }), 60).await;

        assert_eq!(scheduler.start(GUILD).await, StartOutcome::Started);
        assert_eq!(scheduler.start(GUILD).await, StartOutcome::AlreadyRunning);
        settle().await;

        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;
        assert_eq!(sink.count(), 1, "double start must not double deliveries");
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_config_skips_without_delivering() {
        let service = Arc::new(TrackingService::new(MemoryStore::default()));
        service.set_game(GUILD, GAME).await.unwrap();
        // No channel configured.
        service.set_active(GUILD, true).await.unwrap();

        let sink = Arc::new(RecordingSink::default());
        let scheduler = Arc::new(TrackingScheduler::new(
            Arc::clone(&service),
            Arc::new(StaticFetcher(GameStats { playing: 1, visits: 1 })),
            Arc::clone(&sink),
        ));

        scheduler.start(GUILD).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(65 * 3 + 5)).await;
        settle().await;

        assert_eq!(sink.count(), 0);
        // Timer keeps running, self-healing once the channel is set.
        assert!(scheduler.is_running(GUILD));

        service.set_channel(GUILD, CHANNEL).await.unwrap();
        tokio::time::advance(Duration::from_secs(66)).await;
        settle().await;
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_config_skips_without_delivering() {
        let (scheduler, service, sink) =
            scheduler_with(StaticFetcher(GameStats { playing: 1, visits: 1 }), 60).await;
        service.set_active(GUILD, false).await.unwrap();

        scheduler.start(GUILD).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(200)).await;
        settle().await;

        assert_eq!(sink.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_sends_exactly_one_notice() {
        let (scheduler, _service, sink) = scheduler_with(FailingFetcher, 60).await;

        scheduler.start(GUILD).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;

        assert_eq!(sink.count(), 1);
        let (_, message) = sink.last().unwrap();
        assert!(message.contains("Failed to fetch"));
        assert!(!message.contains("Players Online"));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_tick() {
        let (scheduler, _service, sink) =
            scheduler_with(StaticFetcher(GameStats { playing: 1, visits: 1 }), 60).await;

        scheduler.start(GUILD).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(scheduler.stop(GUILD), StopOutcome::Stopped);
        assert_eq!(scheduler.stop(GUILD), StopOutcome::NotRunning);
        assert!(!scheduler.is_running(GUILD));

        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_fetch() {
        let (scheduler, _service, sink) = scheduler_with(
            SlowFetcher {
                delay: Duration::from_secs(10),
                stats: GameStats { playing: 1, visits: 1 },
            },
            60,
        )
        .await;

        scheduler.start(GUILD).await;
        settle().await;
        // Cross the tick boundary so the fetch is in flight, then stop.
        // `sleep` (not `advance`) so the mid-window tick's own timer fires
        // at its intended virtual instant under auto-advance.
        tokio::time::sleep(Duration::from_secs(61)).await;
        settle().await;
        assert_eq!(scheduler.stop(GUILD), StopOutcome::Stopped);

        tokio::time::sleep(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(sink.count(), 0, "pre-stop fetch must be swallowed silently");

        // Restarting delivers only from the fresh timer.
        assert_eq!(scheduler.start(GUILD).await, StartOutcome::Started);
        settle().await;
        tokio::time::sleep(Duration::from_secs(75)).await;
        settle().await;
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_rearms_without_double_firing() {
        let (scheduler, service, sink) =
            scheduler_with(StaticFetcher(GameStats { playing: 1, visits: 1 }), 60).await;

        scheduler.start(GUILD).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;

        service.set_interval(GUILD, 90).await.unwrap();
        scheduler.update_interval(GUILD, 90);
        settle().await;

        // The old 60s deadline (30s away) must never fire.
        tokio::time::advance(Duration::from_secs(58)).await;
        settle().await;
        assert_eq!(sink.count(), 0);

        // New period measured from the re-arm: fires ~90s after it.
        tokio::time::advance(Duration::from_secs(35)).await;
        settle().await;
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_never_overlaps_ticks() {
        let (scheduler, _service, sink) = scheduler_with(
            SlowFetcher {
                delay: Duration::from_secs(30),
                stats: GameStats { playing: 1, visits: 1 },
            },
            60,
        )
        .await;

        scheduler.start(GUILD).await;
        settle().await;

        // Tick starts at 60, delivery at 90, next sleep runs 90..150,
        // second delivery at 180. `sleep` (not `advance`) so timers created
        // mid-window fire at their intended virtual instants.
        tokio::time::sleep(Duration::from_secs(95)).await;
        settle().await;
        assert_eq!(sink.count(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(sink.count(), 1, "next tick waits for the previous delivery");

        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(sink.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_update_while_idle_is_a_noop() {
        let (scheduler, _service, sink) =
            scheduler_with(StaticFetcher(GameStats { playing: 1, visits: 1 }), 60).await;

        scheduler.update_interval(GUILD, 45);
        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;

        assert!(!scheduler.is_running(GUILD));
        assert_eq!(sink.count(), 0);
    }
}
