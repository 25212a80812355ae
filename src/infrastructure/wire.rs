// Wire formats of the sensor backend and generator service, mapped to domain types
use crate::domain::generator::GeneratorStatus;
use crate::domain::traffic::{
    ApproachSeries, Bucket, ClassCountRecord, ColumnKey, HealthGap, SensorInfo,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Deserialize)]
pub struct ApproachDataDto {
    pub approach: String,
    pub hours: Vec<HourlyDataDto>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyDataDto {
    pub time: String,
    pub count: u64,
}

/// Hourly (`hour`) or live per-minute (`minute`) detailed counts.
#[derive(Debug, Deserialize)]
pub struct DetailedCountDto {
    #[serde(alias = "minute")]
    pub hour: String,
    #[serde(rename = "totalCount", default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub results: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapDto {
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SensorDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GeneratorStatusEnvelope {
    pub status: GeneratorStatus,
}

/// Parses an RFC 3339 timestamp, or a naive ISO timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn approach_series_from_wire(dto: ApproachDataDto) -> ApproachSeries {
    let buckets = dto
        .hours
        .into_iter()
        .filter_map(|h| match parse_timestamp(&h.time) {
            Some(ts) => Some(Bucket::new(ts, h.count)),
            None => {
                tracing::warn!("Dropping {} bucket with bad time '{}'", dto.approach, h.time);
                None
            }
        })
        .collect();
    ApproachSeries::new(dto.approach, buckets)
}

pub fn class_counts_from_wire(dto: DetailedCountDto) -> Option<ClassCountRecord> {
    let Some(timestamp) = parse_timestamp(&dto.hour) else {
        tracing::warn!("Dropping detailed count with bad time '{}'", dto.hour);
        return None;
    };

    let mut counts = BTreeMap::new();
    for (key, count) in dto.results {
        match key.parse::<ColumnKey>() {
            Ok(column) => {
                counts.insert(column, count);
            }
            Err(e) => tracing::debug!("Ignoring detailed count column: {}", e),
        }
    }

    if let Some(total) = dto.total_count {
        let summed = counts.values().fold(0u64, |acc, c| acc.saturating_add(*c));
        if summed != total {
            tracing::debug!(
                "Backend total {} differs from column sum {} at {}",
                total,
                summed,
                timestamp
            );
        }
    }

    Some(ClassCountRecord { timestamp, counts })
}

pub fn gap_from_wire(dto: GapDto) -> Option<HealthGap> {
    match (parse_timestamp(&dto.start_time), parse_timestamp(&dto.end_time)) {
        (Some(start_time), Some(end_time)) => Some(HealthGap {
            start_time,
            end_time,
            duration: dto.duration,
            status: dto.status,
        }),
        _ => {
            tracing::warn!("Dropping health gap with bad bounds {}..{}", dto.start_time, dto.end_time);
            None
        }
    }
}

pub fn sensor_from_wire(dto: SensorDto) -> SensorInfo {
    SensorInfo::new(dto.id, dto.name)
}
