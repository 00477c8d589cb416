use std::sync::Arc;

use tagtrail_domain::{IngestionService, QueryService};

/// Shared handler state: the two domain services plus the pre-shared
/// ingestion credential.
#[derive(Clone)]
pub struct ApiState {
    pub ingestion: Arc<IngestionService>,
    pub query: Arc<QueryService>,
    pub api_key: Arc<str>,
}

impl ApiState {
    pub fn new(ingestion: Arc<IngestionService>, query: Arc<QueryService>, api_key: &str) -> Self {
        Self {
            ingestion,
            query,
            api_key: Arc::from(api_key),
        }
    }
}
