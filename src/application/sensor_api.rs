// Upstream API traits for sensor data and the generator service
use crate::domain::generator::{GeneratorConfig, GeneratorStatus};
use crate::domain::query::CountsQuery;
use crate::domain::traffic::{ApproachSeries, ClassCountRecord, HealthGap, SensorInfo};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// Non-2xx response; 422 validation bodies land here too.
    #[error("{url} returned status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// The body did not match the expected JSON shape.
    #[error("unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },
}

#[async_trait]
pub trait SensorApi: Send + Sync {
    /// Hourly counts per approach for a date range
    async fn counts(&self, query: &CountsQuery) -> Result<Vec<ApproachSeries>, ApiError>;

    /// Hourly per-approach, per-class counts for a date range
    async fn detailed_counts(&self, query: &CountsQuery) -> Result<Vec<ClassCountRecord>, ApiError>;

    /// Recent per-minute counts per approach
    async fn live_counts(&self) -> Result<Vec<ApproachSeries>, ApiError>;

    /// Recent per-minute per-approach, per-class counts
    async fn live_detailed_counts(&self) -> Result<Vec<ClassCountRecord>, ApiError>;

    /// Sensor downtime windows
    async fn health_gaps(&self, query: &CountsQuery) -> Result<Vec<HealthGap>, ApiError>;

    async fn sensors(&self) -> Result<Vec<SensorInfo>, ApiError>;
}

#[async_trait]
pub trait GeneratorApi: Send + Sync {
    async fn status(&self) -> Result<GeneratorStatus, ApiError>;

    async fn configure(&self, config: &GeneratorConfig) -> Result<(), ApiError>;

    async fn start(&self) -> Result<(), ApiError>;

    async fn stop(&self) -> Result<(), ApiError>;
}
