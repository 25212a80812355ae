// Traffic count domain models
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Direction of traffic flow at the monitored intersection.
///
/// Declaration order is the canonical order used by approach probability
/// vectors: NB, SB, WB, EB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Approach {
    #[serde(rename = "NB")]
    Northbound,
    #[serde(rename = "SB")]
    Southbound,
    #[serde(rename = "WB")]
    Westbound,
    #[serde(rename = "EB")]
    Eastbound,
}

impl Approach {
    pub fn code(self) -> &'static str {
        match self {
            Approach::Northbound => "NB",
            Approach::Southbound => "SB",
            Approach::Westbound => "WB",
            Approach::Eastbound => "EB",
        }
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Approach {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NB" => Ok(Approach::Northbound),
            "SB" => Ok(Approach::Southbound),
            "WB" => Ok(Approach::Westbound),
            "EB" => Ok(Approach::Eastbound),
            other => Err(format!("unknown approach '{}'", other)),
        }
    }
}

/// Detected object category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Car,
    Motorcycle,
    Pedestrian,
    Bicycle,
    MobilityAid,
}

impl VehicleClass {
    pub fn code(self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Motorcycle => "motorcycle",
            VehicleClass::Pedestrian => "pedestrian",
            VehicleClass::Bicycle => "bicycle",
            VehicleClass::MobilityAid => "mobility_aid",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for VehicleClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(VehicleClass::Car),
            "motorcycle" => Ok(VehicleClass::Motorcycle),
            "pedestrian" => Ok(VehicleClass::Pedestrian),
            "bicycle" => Ok(VehicleClass::Bicycle),
            "mobility_aid" => Ok(VehicleClass::MobilityAid),
            other => Err(format!("unknown vehicle class '{}'", other)),
        }
    }
}

/// A per-approach, per-class table column such as `NB_car`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub approach: Approach,
    pub class: VehicleClass,
}

impl ColumnKey {
    pub fn new(approach: Approach, class: VehicleClass) -> Self {
        Self { approach, class }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.approach, self.class)
    }
}

impl FromStr for ColumnKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The class part may itself contain underscores ("mobility_aid")
        let (approach, class) = s
            .split_once('_')
            .ok_or_else(|| format!("malformed column key '{}'", s))?;
        Ok(Self::new(approach.parse()?, class.parse()?))
    }
}

impl Serialize for ColumnKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
}

impl Bucket {
    pub fn new(timestamp: DateTime<Utc>, count: u64) -> Self {
        Self { timestamp, count }
    }
}

/// Bucketed counts for one approach, as received from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApproachSeries {
    pub approach: String,
    pub buckets: Vec<Bucket>,
}

impl ApproachSeries {
    pub fn new(approach: impl Into<String>, buckets: Vec<Bucket>) -> Self {
        Self {
            approach: approach.into(),
            buckets,
        }
    }
}

/// Chart values aligned positionally to a shared category axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<u64>,
}

pub type CategoryAxis = Vec<DateTime<Utc>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartView {
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// One detailed-count item: per-column counts for a single hour or minute.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCountRecord {
    pub timestamp: DateTime<Utc>,
    pub counts: BTreeMap<ColumnKey, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub total_count: u64,
    pub counts: BTreeMap<ColumnKey, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthGap {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorInfo {
    pub id: String,
    pub name: String,
}

impl SensorInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The catch-all entry listed ahead of the real sensors.
    pub fn all() -> Self {
        Self::new("all", "all")
    }
}
