// Live feed - Interval polling of the live chart and table
use crate::application::counts_service::CountsService;
use crate::domain::traffic::{ChartView, TableRow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Generation number taken when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

struct Versioned<T> {
    generation: u64,
    value: T,
}

/// Holds the latest value of a polled resource.
///
/// A result is only applied when its ticket is newer than the one behind the
/// current value, so a slow response that started earlier cannot overwrite
/// a newer one.
pub struct GenerationSlot<T> {
    issued: AtomicU64,
    current: RwLock<Versioned<T>>,
}

impl<T: Clone> GenerationSlot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            issued: AtomicU64::new(0),
            current: RwLock::new(Versioned {
                generation: 0,
                value: initial,
            }),
        }
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns false when the value was discarded as stale.
    pub async fn apply(&self, ticket: Ticket, value: T) -> bool {
        let mut current = self.current.write().await;
        if ticket.0 <= current.generation {
            return false;
        }
        current.generation = ticket.0;
        current.value = value;
        true
    }

    pub async fn get(&self) -> T {
        self.current.read().await.value.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub chart: ChartView,
    pub table: Vec<TableRow>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct LiveFeed {
    counts: CountsService,
    chart: GenerationSlot<ChartView>,
    table: GenerationSlot<Vec<TableRow>>,
    updates: watch::Sender<LiveSnapshot>,
}

impl LiveFeed {
    pub fn new(counts: CountsService) -> Arc<Self> {
        let (updates, _) = watch::channel(LiveSnapshot::default());
        Arc::new(Self {
            counts,
            chart: GenerationSlot::new(ChartView::default()),
            table: GenerationSlot::new(Vec::new()),
            updates,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        self.updates.borrow().clone()
    }

    pub async fn chart(&self) -> ChartView {
        self.chart.get().await
    }

    pub async fn table(&self) -> Vec<TableRow> {
        self.table.get().await
    }

    /// Fetches the live chart and table concurrently and publishes the result.
    ///
    /// On failure the previous data is kept.
    pub async fn refresh(&self) {
        let chart_ticket = self.chart.begin();
        let table_ticket = self.table.begin();

        let (chart, table) = tokio::join!(self.counts.try_live_chart(), self.counts.try_live_table());

        let mut changed = false;
        match chart {
            Ok(view) => changed |= self.chart.apply(chart_ticket, view).await,
            Err(e) => tracing::warn!("Error fetching live chart data: {}", e),
        }
        match table {
            Ok(rows) => changed |= self.table.apply(table_ticket, rows).await,
            Err(e) => tracing::warn!("Error fetching live detailed counts: {}", e),
        }

        if changed {
            let snapshot = LiveSnapshot {
                chart: self.chart.get().await,
                table: self.table.get().await,
                updated_at: Some(Utc::now()),
            };
            tracing::debug!(
                "Live feed updated: {} series, {} rows",
                snapshot.chart.series.len(),
                snapshot.table.len()
            );
            self.updates.send_replace(snapshot);
        }
    }

    /// Starts polling every `every`, first tick immediately.
    ///
    /// Polling stops when the returned handle is stopped or dropped.
    pub fn start(self: &Arc<Self>, every: Duration) -> LiveFeedHandle {
        let feed = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                feed.refresh().await;
            }
        });
        tracing::info!("Live feed polling every {:?}", every);
        LiveFeedHandle { task }
    }
}

pub struct LiveFeedHandle {
    task: JoinHandle<()>,
}

impl LiveFeedHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for LiveFeedHandle {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("Live feed polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::counts_service::tests::{FakeSensorApi, minute_series, service};
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_stale_ticket_is_discarded() {
        let slot = GenerationSlot::new(0u32);
        let older = slot.begin();
        let newer = slot.begin();

        assert!(slot.apply(newer, 2).await);
        assert!(!slot.apply(older, 1).await);
        assert_eq!(slot.get().await, 2);
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let feed = LiveFeed::new(service(FakeSensorApi {
            live: Mutex::new(Some(vec![minute_series("NB", &[0, 3])])),
            live_detailed: Some(Vec::new()),
            ..Default::default()
        }));
        let mut rx = feed.subscribe();

        feed.refresh().await;

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.chart.categories, vec!["10:01"]);
        assert_eq!(snapshot.chart.series[0].data, vec![3]);
        assert!(snapshot.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_data() {
        let api = FakeSensorApi {
            live: Mutex::new(Some(vec![minute_series("SB", &[5])])),
            ..Default::default()
        };
        let feed = LiveFeed::new(service(api));
        feed.refresh().await;
        assert_eq!(feed.chart().await.series[0].data, vec![5]);

        // live_detailed was never set, so the table fetch keeps failing
        assert!(feed.table().await.is_empty());
        feed.refresh().await;
        assert_eq!(feed.chart().await.series[0].data, vec![5]);
    }

    #[tokio::test]
    async fn test_polling_publishes_on_every_tick() {
        let feed = LiveFeed::new(service(FakeSensorApi {
            live: Mutex::new(Some(vec![minute_series("WB", &[2])])),
            live_detailed: Some(Vec::new()),
            ..Default::default()
        }));
        let mut rx = feed.subscribe();
        let _handle = feed.start(Duration::from_millis(10));

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("first tick should publish")
            .unwrap();
        let first = rx.borrow_and_update().clone();
        assert_eq!(first.chart.series[0].data, vec![2]);
        assert!(first.updated_at.is_some());

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("later ticks should publish again")
            .unwrap();
        assert!(rx.borrow().updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_polling() {
        let feed = LiveFeed::new(service(FakeSensorApi::default()));
        let handle = feed.start(Duration::from_millis(10));
        assert_eq!(Arc::strong_count(&feed), 2);

        handle.stop();

        // Only the LiveFeed's own reference remains once the task is gone
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(Arc::strong_count(&feed), 1);
    }
}
