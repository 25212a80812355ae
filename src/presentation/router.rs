// Router setup
use crate::presentation::app_state::AppState;
use crate::presentation::handlers;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health_check))
        .route("/charts/counts", get(handlers::counts_chart))
        .route("/charts/live", get(handlers::live_chart))
        .route("/tables/counts", get(handlers::counts_table))
        .route("/tables/live", get(handlers::live_table))
        .route("/live/events", get(handlers::live_events))
        .route("/health/gaps", get(handlers::health_gaps))
        .route("/sensors", get(handlers::sensors))
        .route("/generator", get(handlers::generator_view))
        .route("/generator/refresh", post(handlers::refresh_generator))
        .route("/generator/forms/:group/:field", put(handlers::set_generator_field))
        .route("/generator/submit", post(handlers::submit_generator))
        .route("/generator/stop", post(handlers::stop_generator))
        // SSE responses are left uncompressed by the default predicate
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
