// Time series aggregation - Shapes bucketed counts into chart series and table rows
use crate::domain::traffic::{
    ApproachSeries, CategoryAxis, ChartSeries, ChartView, ClassCountRecord, TableRow,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// How the shared category axis of a chart is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMode {
    /// Bucket timestamps of the first series, zero buckets included.
    /// Assumes every series reports the same buckets.
    Fixed,
    /// Distinct timestamps across all series in first-seen order, after
    /// dropping zero-count buckets. Used for live feeds where most buckets
    /// are empty.
    UnionSparse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    Ingestion,
    MostRecentFirst,
}

/// Aggregation policy for one chart/table context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPolicy {
    pub axis: AxisMode,
    pub rows: RowOrder,
    /// chrono strftime format used for category and row labels
    pub label_format: String,
}

impl ChartPolicy {
    /// Historical hourly counts: fixed axis with zero fill, rows oldest first.
    pub fn history(label_format: impl Into<String>) -> Self {
        Self {
            axis: AxisMode::Fixed,
            rows: RowOrder::Ingestion,
            label_format: label_format.into(),
        }
    }

    /// Live per-minute counts: zero-suppressed axis, rows newest first.
    pub fn live(label_format: impl Into<String>) -> Self {
        Self {
            axis: AxisMode::UnionSparse,
            rows: RowOrder::MostRecentFirst,
            label_format: label_format.into(),
        }
    }
}

pub fn build_category_axis(series_list: &[ApproachSeries], mode: AxisMode) -> CategoryAxis {
    match mode {
        AxisMode::Fixed => {
            let mut seen = HashSet::new();
            series_list
                .first()
                .map(|s| {
                    s.buckets
                        .iter()
                        .filter(|b| seen.insert(b.timestamp))
                        .map(|b| b.timestamp)
                        .collect()
                })
                .unwrap_or_default()
        }
        AxisMode::UnionSparse => {
            let mut seen = HashSet::new();
            series_list
                .iter()
                .flat_map(|s| s.buckets.iter())
                .filter(|b| b.count > 0)
                .filter(|b| seen.insert(b.timestamp))
                .map(|b| b.timestamp)
                .collect()
        }
    }
}

/// True when `approach` passes the filter. An empty filter or one containing
/// `"all"` lets every approach through.
fn passes_filter(approach: &str, filter: &[String]) -> bool {
    filter.is_empty() || filter.iter().any(|f| f == "all" || f == approach)
}

/// Aligns each approach's buckets to `axis`, filling absent slots with 0.
///
/// Produces one series per approach passing `filter`, in input order, each
/// exactly `axis.len()` long. When an approach reports the same timestamp
/// twice the first bucket wins.
pub fn align_series(
    series_list: &[ApproachSeries],
    axis: &[DateTime<Utc>],
    filter: &[String],
) -> Vec<ChartSeries> {
    series_list
        .iter()
        .filter(|s| passes_filter(&s.approach, filter))
        .map(|s| {
            let mut by_time: HashMap<DateTime<Utc>, u64> = HashMap::with_capacity(s.buckets.len());
            for bucket in &s.buckets {
                by_time.entry(bucket.timestamp).or_insert(bucket.count);
            }

            ChartSeries {
                name: s.approach.clone(),
                data: axis
                    .iter()
                    .map(|t| by_time.get(t).copied().unwrap_or(0))
                    .collect(),
            }
        })
        .collect()
}

pub fn format_label(timestamp: &DateTime<Utc>, label_format: &str) -> String {
    timestamp.format(label_format).to_string()
}

/// Pivots detailed records into one row per timestamp.
///
/// Records sharing a timestamp are merged column by column, and
/// `total_count` is the sum of every per-approach, per-class count in the row.
pub fn to_table_rows(records: &[ClassCountRecord], order: RowOrder, label_format: &str) -> Vec<TableRow> {
    let mut rows: Vec<TableRow> = Vec::new();
    let mut index: HashMap<DateTime<Utc>, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.timestamp).or_insert_with(|| {
            rows.push(TableRow {
                timestamp: record.timestamp,
                label: format_label(&record.timestamp, label_format),
                total_count: 0,
                counts: Default::default(),
            });
            rows.len() - 1
        });

        let row = &mut rows[slot];
        for (key, count) in &record.counts {
            let cell = row.counts.entry(*key).or_insert(0);
            *cell = cell.saturating_add(*count);
            row.total_count = row.total_count.saturating_add(*count);
        }
    }

    if order == RowOrder::MostRecentFirst {
        rows.reverse();
    }

    rows
}

/// Applies a [`ChartPolicy`] to raw series and detailed records.
#[derive(Debug, Clone)]
pub struct TimeSeriesAggregator {
    policy: ChartPolicy,
}

impl TimeSeriesAggregator {
    pub fn new(policy: ChartPolicy) -> Self {
        Self { policy }
    }

    pub fn chart(&self, series_list: &[ApproachSeries], filter: &[String]) -> ChartView {
        let axis = build_category_axis(series_list, self.policy.axis);
        let series = align_series(series_list, &axis, filter);

        tracing::debug!(
            "Aggregated {} series over {} categories ({:?} axis)",
            series.len(),
            axis.len(),
            self.policy.axis
        );

        ChartView {
            categories: axis
                .iter()
                .map(|t| format_label(t, &self.policy.label_format))
                .collect(),
            series,
        }
    }

    pub fn table(&self, records: &[ClassCountRecord]) -> Vec<TableRow> {
        to_table_rows(records, self.policy.rows, &self.policy.label_format)
    }
}
