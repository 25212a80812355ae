// Application state for HTTP handlers
use crate::application::counts_service::CountsService;
use crate::application::generator_controller::GeneratorConfigController;
use crate::application::live_feed::LiveFeed;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub counts_service: CountsService,
    pub live_feed: Arc<LiveFeed>,
    /// Serializes generator actions so status responses apply in call order
    pub generator: Arc<Mutex<GeneratorConfigController>>,
}
