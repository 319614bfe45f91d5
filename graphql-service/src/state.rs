//! Application state for the GraphQL service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::schema::{build_schema, ApiSchema};
use crate::store::CatalogStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub schema: ApiSchema,
    pub catalog: Arc<dyn CatalogStore>,
}

impl AppState {
    /// Creates a new application state around the given catalog.
    pub fn new(config: AppConfig, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            schema: build_schema(catalog.clone()),
            config,
            catalog,
        }
    }
}
