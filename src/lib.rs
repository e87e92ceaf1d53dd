pub mod api_client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod views;

use std::sync::Arc;

// Контекст, который передаётся экрану при создании: настройки и клиент API
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub api: api_client::ApiClient,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Arc<Self>, error::ApiError> {
        let api = api_client::ApiClient::from_config(&config.api)?;
        Ok(Arc::new(Self { config, api }))
    }
}
