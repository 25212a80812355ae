// HTTP request handlers
use crate::application::generator_controller::ControllerView;
use crate::application::live_feed::LiveSnapshot;
use crate::domain::forms::FormGroup;
use crate::domain::query::{ApproachFilter, ClassFilter, CountsQuery, DateRange};
use crate::domain::traffic::{ChartView, HealthGap, SensorInfo, TableRow};
use crate::presentation::app_state::AppState;
use crate::presentation::error::AppError;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::NaiveDate;
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;

type HandlerResult<T> = Result<Json<T>, AppError>;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub approach: Option<String>,
    pub class: Option<String>,
    pub sensor_id: Option<String>,
}

impl RangeQuery {
    fn parse_date(raw: Option<&str>, fallback: NaiveDate) -> Result<NaiveDate, AppError> {
        match raw {
            None | Some("") => Ok(fallback),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| AppError::BadRequest(format!("invalid date '{}': {}", s, e))),
        }
    }

    fn into_counts_query(self) -> Result<CountsQuery, AppError> {
        let today = DateRange::today();
        let start = Self::parse_date(self.start_date.as_deref(), today.start)?;
        let end = Self::parse_date(self.end_date.as_deref(), today.end)?;

        Ok(CountsQuery {
            range: DateRange::new(start, end).map_err(AppError::BadRequest)?,
            approach: ApproachFilter::parse(self.approach.as_deref()).map_err(AppError::BadRequest)?,
            class: ClassFilter::parse(self.class.as_deref()).map_err(AppError::BadRequest)?,
            sensor_id: self.sensor_id.filter(|id| !id.is_empty() && id != "all"),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SetFieldBody {
    pub value: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Hourly counts per approach for the selected range
pub async fn counts_chart(
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult<ChartView> {
    let query = query.into_counts_query()?;
    Ok(Json(state.counts_service.counts_chart(&query).await))
}

pub async fn counts_table(
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Vec<TableRow>> {
    let query = query.into_counts_query()?;
    Ok(Json(state.counts_service.counts_table(&query).await))
}

/// Fetches once if the poller has not produced anything yet.
async fn ensure_live_data(state: &AppState) {
    if state.live_feed.snapshot().updated_at.is_none() {
        state.live_feed.refresh().await;
    }
}

pub async fn live_chart(State(state): State<Arc<AppState>>) -> Json<ChartView> {
    ensure_live_data(&state).await;
    Json(state.live_feed.chart().await)
}

pub async fn live_table(State(state): State<Arc<AppState>>) -> Json<Vec<TableRow>> {
    ensure_live_data(&state).await;
    Json(state.live_feed.table().await)
}

/// Pushes every new live snapshot as a server-sent event
pub async fn live_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.live_feed.subscribe();

    let stream = async_stream::stream! {
        loop {
            let snapshot: LiveSnapshot = rx.borrow_and_update().clone();
            match Event::default().event("snapshot").json_data(&snapshot) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::warn!("Failed to encode live snapshot: {}", e),
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn health_gaps(
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Vec<HealthGap>> {
    let query = query.into_counts_query()?;
    Ok(Json(state.counts_service.health_gaps(&query).await))
}

pub async fn sensors(State(state): State<Arc<AppState>>) -> Json<Vec<SensorInfo>> {
    Json(state.counts_service.sensor_options().await)
}

/// Current generator view, after a best-effort status fetch
pub async fn generator_view(State(state): State<Arc<AppState>>) -> Json<ControllerView> {
    let mut controller = state.generator.lock().await;
    // A failed fetch is reported through the view's error message
    let _ = controller.refresh_status().await;
    Json(controller.view())
}

pub async fn refresh_generator(State(state): State<Arc<AppState>>) -> HandlerResult<ControllerView> {
    let mut controller = state.generator.lock().await;
    controller.refresh_status().await?;
    Ok(Json(controller.view()))
}

pub async fn set_generator_field(
    Path((group, field)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetFieldBody>,
) -> HandlerResult<ControllerView> {
    let group: FormGroup = group.parse().map_err(AppError::BadRequest)?;
    let mut controller = state.generator.lock().await;
    controller.set_field(group, &field, body.value)?;
    Ok(Json(controller.view()))
}

pub async fn submit_generator(State(state): State<Arc<AppState>>) -> HandlerResult<ControllerView> {
    let mut controller = state.generator.lock().await;
    controller.submit().await?;
    Ok(Json(controller.view()))
}

pub async fn stop_generator(State(state): State<Arc<AppState>>) -> HandlerResult<ControllerView> {
    let mut controller = state.generator.lock().await;
    controller.stop().await?;
    Ok(Json(controller.view()))
}
