// HTTP client for the sensor backend and generator service
use crate::application::sensor_api::{ApiError, GeneratorApi, SensorApi};
use crate::domain::generator::{GeneratorConfig, GeneratorStatus};
use crate::domain::query::CountsQuery;
use crate::domain::traffic::{ApproachSeries, ClassCountRecord, HealthGap, SensorInfo};
use crate::infrastructure::config::UpstreamSettings;
use crate::infrastructure::wire::{
    ApproachDataDto, DetailedCountDto, GapDto, GeneratorStatusEnvelope, SensorDto,
    approach_series_from_wire, class_counts_from_wire, gap_from_wire, sensor_from_wire,
};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

const SENSORS_PATH: &str = "/api/v1/sensors";

#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    api_base: String,
    generator_base: String,
}

/// Builds the filter part of a read query.
///
/// `class_param` differs per endpoint: `sensorclass` for counts, `class_type`
/// for health gaps. Filters set to "all" are left out.
pub fn build_query_string(query: &CountsQuery, class_param: &str) -> String {
    let mut params = vec![
        format!("start_date={}", query.range.start.format("%Y-%m-%d")),
        format!("end_date={}", query.range.end.format("%Y-%m-%d")),
    ];
    if let Some(approach) = query.approach.selected() {
        params.push(format!("approach={}", urlencoding::encode(approach.code())));
    }
    if let Some(class) = query.class.selected() {
        params.push(format!("{}={}", class_param, urlencoding::encode(class.code())));
    }
    if let Some(sensor_id) = &query.sensor_id {
        params.push(format!("sensor_id={}", urlencoding::encode(sensor_id)));
    }
    params.join("&")
}

impl HttpApiClient {
    pub fn new(upstream: &UpstreamSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(upstream.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: upstream.api_base_url.trim_end_matches('/').to_string(),
            generator_base: upstream.generator_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn sensors_url(&self, path: &str) -> String {
        format!("{}{}{}", self.api_base, SENSORS_PATH, path)
    }

    fn generator_url(&self, path: &str) -> String {
        format!("{}/generator{}", self.generator_base, path)
    }

    async fn check(url: &str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    fn network_error(url: &str, err: reqwest::Error) -> ApiError {
        ApiError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Self::network_error(&url, e))?;

        let text = Self::check(&url, response)
            .await?
            .text()
            .await
            .map_err(|e| Self::network_error(&url, e))?;

        serde_json::from_str(&text).map_err(|e| ApiError::UnexpectedResponse {
            url,
            message: e.to_string(),
        })
    }

    /// POSTs to the generator; the acknowledgement body is not inspected.
    async fn post(&self, url: String, body: Option<&GeneratorConfig>) -> Result<(), ApiError> {
        tracing::debug!("POST {}", url);
        let mut request = self.client.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Self::network_error(&url, e))?;
        Self::check(&url, response).await?;
        Ok(())
    }
}

#[async_trait]
impl SensorApi for HttpApiClient {
    async fn counts(&self, query: &CountsQuery) -> Result<Vec<ApproachSeries>, ApiError> {
        let url = format!("{}?{}", self.sensors_url("/data/counts"), build_query_string(query, "sensorclass"));
        let dtos: Vec<ApproachDataDto> = self.get_json(url).await?;
        Ok(dtos.into_iter().map(approach_series_from_wire).collect())
    }

    async fn detailed_counts(&self, query: &CountsQuery) -> Result<Vec<ClassCountRecord>, ApiError> {
        let url = format!(
            "{}?{}",
            self.sensors_url("/data/detailed_counts"),
            build_query_string(query, "sensorclass")
        );
        let dtos: Vec<DetailedCountDto> = self.get_json(url).await?;
        Ok(dtos.into_iter().filter_map(class_counts_from_wire).collect())
    }

    async fn live_counts(&self) -> Result<Vec<ApproachSeries>, ApiError> {
        let dtos: Vec<ApproachDataDto> = self.get_json(self.sensors_url("/data/live")).await?;
        Ok(dtos.into_iter().map(approach_series_from_wire).collect())
    }

    async fn live_detailed_counts(&self) -> Result<Vec<ClassCountRecord>, ApiError> {
        let dtos: Vec<DetailedCountDto> = self
            .get_json(self.sensors_url("/data/live/detailed_counts"))
            .await?;
        Ok(dtos.into_iter().filter_map(class_counts_from_wire).collect())
    }

    async fn health_gaps(&self, query: &CountsQuery) -> Result<Vec<HealthGap>, ApiError> {
        let url = format!("{}?{}", self.sensors_url("/health/gaps"), build_query_string(query, "class_type"));
        let dtos: Vec<GapDto> = self.get_json(url).await?;
        Ok(dtos.into_iter().filter_map(gap_from_wire).collect())
    }

    async fn sensors(&self) -> Result<Vec<SensorInfo>, ApiError> {
        let dtos: Vec<SensorDto> = self.get_json(self.sensors_url("/info")).await?;
        Ok(dtos.into_iter().map(sensor_from_wire).collect())
    }
}

#[async_trait]
impl GeneratorApi for HttpApiClient {
    async fn status(&self) -> Result<GeneratorStatus, ApiError> {
        let envelope: GeneratorStatusEnvelope = self.get_json(self.generator_url("/status")).await?;
        Ok(envelope.status)
    }

    async fn configure(&self, config: &GeneratorConfig) -> Result<(), ApiError> {
        self.post(self.generator_url("/configure"), Some(config)).await
    }

    async fn start(&self) -> Result<(), ApiError> {
        self.post(self.generator_url("/start"), None).await
    }

    async fn stop(&self) -> Result<(), ApiError> {
        self.post(self.generator_url("/stop"), None).await
    }
}
