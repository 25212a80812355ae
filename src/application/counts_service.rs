// Counts service - Read paths for charts, tables, health gaps and sensors
use crate::application::aggregator::{ChartPolicy, TimeSeriesAggregator};
use crate::application::sensor_api::{ApiError, SensorApi};
use crate::domain::query::CountsQuery;
use crate::domain::traffic::{ChartView, HealthGap, SensorInfo, TableRow};
use std::sync::Arc;

/// Fetches sensor data and shapes it for display.
///
/// The `try_*` methods surface upstream errors; the plain methods fail closed
/// to empty results and log the failure.
#[derive(Clone)]
pub struct CountsService {
    api: Arc<dyn SensorApi>,
    history: TimeSeriesAggregator,
    live: TimeSeriesAggregator,
}

impl CountsService {
    pub fn new(api: Arc<dyn SensorApi>, history: ChartPolicy, live: ChartPolicy) -> Self {
        Self {
            api,
            history: TimeSeriesAggregator::new(history),
            live: TimeSeriesAggregator::new(live),
        }
    }

    pub async fn try_counts_chart(&self, query: &CountsQuery) -> Result<ChartView, ApiError> {
        let series = self.api.counts(query).await?;
        // The approach filter is already applied upstream
        Ok(self.history.chart(&series, &[]))
    }

    pub async fn counts_chart(&self, query: &CountsQuery) -> ChartView {
        self.try_counts_chart(query).await.unwrap_or_else(|e| {
            tracing::warn!("Error fetching counts chart: {}", e);
            ChartView::default()
        })
    }

    pub async fn counts_table(&self, query: &CountsQuery) -> Vec<TableRow> {
        match self.api.detailed_counts(query).await {
            Ok(records) => self.history.table(&records),
            Err(e) => {
                tracing::warn!("Error fetching detailed counts: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn try_live_chart(&self) -> Result<ChartView, ApiError> {
        let series = self.api.live_counts().await?;
        Ok(self.live.chart(&series, &[]))
    }

    pub async fn try_live_table(&self) -> Result<Vec<TableRow>, ApiError> {
        let records = self.api.live_detailed_counts().await?;
        Ok(self.live.table(&records))
    }

    pub async fn health_gaps(&self, query: &CountsQuery) -> Vec<HealthGap> {
        match self.api.health_gaps(query).await {
            Ok(gaps) => gaps,
            Err(e) => {
                tracing::warn!("Error fetching health gaps: {}", e);
                Vec::new()
            }
        }
    }

    /// Sensor filter options, always led by the "all" entry.
    pub async fn sensor_options(&self) -> Vec<SensorInfo> {
        let mut options = vec![SensorInfo::all()];
        match self.api.sensors().await {
            Ok(sensors) => options.extend(sensors),
            Err(e) => tracing::warn!("Failed to fetch sensors: {}", e),
        }
        options
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::traffic::{ApproachSeries, Bucket, ClassCountRecord};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    /// In-memory sensor backend. `None` fields answer with a network error.
    #[derive(Default)]
    pub(crate) struct FakeSensorApi {
        pub counts: Option<Vec<ApproachSeries>>,
        pub detailed: Option<Vec<ClassCountRecord>>,
        pub live: Mutex<Option<Vec<ApproachSeries>>>,
        pub live_detailed: Option<Vec<ClassCountRecord>>,
        pub gaps: Option<Vec<HealthGap>>,
        pub sensors: Option<Vec<SensorInfo>>,
    }

    fn down<T>(what: &str) -> Result<T, ApiError> {
        Err(ApiError::Network {
            url: format!("http://backend/{}", what),
            message: "connection refused".to_string(),
        })
    }

    #[async_trait]
    impl SensorApi for FakeSensorApi {
        async fn counts(&self, _query: &CountsQuery) -> Result<Vec<ApproachSeries>, ApiError> {
            self.counts.clone().map_or_else(|| down("counts"), Ok)
        }

        async fn detailed_counts(&self, _query: &CountsQuery) -> Result<Vec<ClassCountRecord>, ApiError> {
            self.detailed.clone().map_or_else(|| down("detailed_counts"), Ok)
        }

        async fn live_counts(&self) -> Result<Vec<ApproachSeries>, ApiError> {
            let live = self.live.lock().unwrap().clone();
            live.map_or_else(|| down("live"), Ok)
        }

        async fn live_detailed_counts(&self) -> Result<Vec<ClassCountRecord>, ApiError> {
            self.live_detailed.clone().map_or_else(|| down("live/detailed_counts"), Ok)
        }

        async fn health_gaps(&self, _query: &CountsQuery) -> Result<Vec<HealthGap>, ApiError> {
            self.gaps.clone().map_or_else(|| down("health/gaps"), Ok)
        }

        async fn sensors(&self) -> Result<Vec<SensorInfo>, ApiError> {
            self.sensors.clone().map_or_else(|| down("info"), Ok)
        }
    }

    pub(crate) fn service(api: FakeSensorApi) -> CountsService {
        CountsService::new(
            Arc::new(api),
            ChartPolicy::history("%H:%M"),
            ChartPolicy::live("%H:%M"),
        )
    }

    pub(crate) fn minute_series(approach: &str, counts: &[u64]) -> ApproachSeries {
        ApproachSeries::new(
            approach,
            counts
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    Bucket::new(Utc.with_ymd_and_hms(2024, 7, 17, 10, i as u32, 0).unwrap(), c)
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_read_failures_fail_closed() {
        let service = service(FakeSensorApi::default());
        let query = CountsQuery::default();

        assert_eq!(service.counts_chart(&query).await, ChartView::default());
        assert!(service.counts_table(&query).await.is_empty());
        assert!(service.health_gaps(&query).await.is_empty());
        assert!(service.try_live_chart().await.is_err());
    }

    #[tokio::test]
    async fn test_history_chart_uses_fixed_axis() {
        let service = service(FakeSensorApi {
            counts: Some(vec![minute_series("NB", &[0, 4]), minute_series("SB", &[1, 0])]),
            ..Default::default()
        });

        let view = service.counts_chart(&CountsQuery::default()).await;
        assert_eq!(view.categories, vec!["10:00", "10:01"]);
        assert_eq!(view.series[0].data, vec![0, 4]);
        assert_eq!(view.series[1].data, vec![1, 0]);
    }

    #[tokio::test]
    async fn test_live_chart_suppresses_zero_buckets() {
        let service = service(FakeSensorApi {
            live: Mutex::new(Some(vec![
                minute_series("NB", &[0, 4, 0]),
                minute_series("SB", &[0, 0, 2]),
            ])),
            ..Default::default()
        });

        let view = service.try_live_chart().await.unwrap();
        assert_eq!(view.categories, vec!["10:01", "10:02"]);
        assert_eq!(view.series[0].data, vec![4, 0]);
        assert_eq!(view.series[1].data, vec![0, 2]);
    }

    fn detailed(minute: u32, column: &str, count: u64) -> ClassCountRecord {
        ClassCountRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 7, 17, 10, minute, 0).unwrap(),
            counts: [(column.parse().unwrap(), count)].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn test_counts_table_keeps_ingestion_order() {
        let service = service(FakeSensorApi {
            detailed: Some(vec![
                detailed(2, "NB_car", 3),
                detailed(0, "SB_bicycle", 1),
                detailed(2, "EB_pedestrian", 2),
            ]),
            ..Default::default()
        });

        let rows = service.counts_table(&CountsQuery::default()).await;
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["10:02", "10:00"]);
        assert_eq!(rows[0].total_count, 5);
        assert_eq!(rows[1].total_count, 1);
    }

    #[tokio::test]
    async fn test_live_table_most_recent_first() {
        let service = service(FakeSensorApi {
            live_detailed: Some(vec![detailed(0, "NB_car", 1), detailed(1, "NB_car", 2)]),
            ..Default::default()
        });

        let rows = service.try_live_table().await.unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["10:01", "10:00"]);
    }

    #[tokio::test]
    async fn test_health_gaps_passed_through() {
        let gap = HealthGap {
            start_time: Utc.with_ymd_and_hms(2024, 7, 17, 9, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 7, 17, 9, 30, 0).unwrap(),
            duration: Some("30m".to_string()),
            status: None,
        };
        let service = service(FakeSensorApi {
            gaps: Some(vec![gap.clone()]),
            ..Default::default()
        });

        assert_eq!(service.health_gaps(&CountsQuery::default()).await, vec![gap]);
    }

    #[tokio::test]
    async fn test_sensor_options_lead_with_all() {
        let online = service(FakeSensorApi {
            sensors: Some(vec![SensorInfo::new("s-1", "Main St")]),
            ..Default::default()
        });
        let options = online.sensor_options().await;
        assert_eq!(options, vec![SensorInfo::all(), SensorInfo::new("s-1", "Main St")]);

        let offline = service(FakeSensorApi::default());
        assert_eq!(offline.sensor_options().await, vec![SensorInfo::all()]);
    }
}
