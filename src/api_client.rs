use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::ApiConfig,
    error::ApiError,
    models::{Event, LocationId, LocationItem, Paginated, SearchQuery},
};

/// Данные сессии, которые передаются клиенту явно при создании.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
}

/// Клиент REST API событий
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let session = Session {
            token: config.token.clone(),
        };
        Self::new(&config.base_url, Duration::from_secs(config.timeout_seconds), &session)
    }

    pub fn new(base_url: &str, timeout: Duration, session: &Session) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|_| ApiError::InvalidBaseUrl(base_url.clone()))?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &session.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn countries(&self) -> Result<Vec<LocationItem>, ApiError> {
        self.get_json("/events/countries", None).await
    }

    pub async fn cities(&self, country_id: LocationId) -> Result<Vec<LocationItem>, ApiError> {
        self.get_json(&format!("/events/countries/{country_id}/cities"), None)
            .await
    }

    pub async fn districts(&self, city_id: LocationId) -> Result<Vec<LocationItem>, ApiError> {
        self.get_json(&format!("/events/cities/{city_id}/districts"), None)
            .await
    }

    pub async fn search_events(&self, query: &SearchQuery) -> Result<Paginated<Event>, ApiError> {
        let query = query.to_query_string()?;
        self.get_json("/events/search", Some(&query)).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = match query {
            Some(query) => format!("{}{}?{}", self.base_url, path, query),
            None => format!("{}{}", self.base_url, path),
        };
        debug!("GET {}", url);

        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}
