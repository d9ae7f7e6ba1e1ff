//! Shared application state

use std::sync::Arc;

use crate::dashboard::Dashboard;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Log engine and note readers
    pub dashboard: Dashboard,
    /// Bearer token required on `/api` routes, if set
    pub api_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(dashboard: Dashboard, api_token: Option<String>) -> Self {
        let api_token: Option<Arc<str>> = api_token.filter(|t| !t.is_empty()).map(Arc::from);
        if api_token.is_some() {
            tracing::info!("API token authentication enabled");
        }
        Self {
            dashboard,
            api_token,
        }
    }
}
