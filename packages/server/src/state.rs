use std::sync::Arc;

use crate::config::AppConfig;
use crate::ingest::IngestPipeline;
use crate::repository::ComponentStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: Arc<IngestPipeline>,
    pub records: Arc<dyn ComponentStore>,
}
