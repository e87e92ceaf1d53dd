use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Размер страницы поиска по умолчанию.
pub const DEFAULT_PAGE_SIZE: u32 = 8;
/// Расстояние до низа документа (в пикселях), при котором подгружается следующая страница.
pub const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 300.0;
/// Окно debounce для событий прокрутки.
pub const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
    pub feed: FeedConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub rust_log: String,
}

// Настройки REST API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Токен сессии передаётся явно, а не читается из глобального хранилища.
    pub token: Option<String>,
}

// Настройки ленты событий
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub page_size: u32,
    pub scroll_threshold_px: f64,
    pub scroll_debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            rust_log: "event_hub=debug".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/v1".to_string(),
            timeout_seconds: 30,
            token: None,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
            scroll_debounce_ms: DEFAULT_SCROLL_DEBOUNCE_MS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let page_size = parse_var("FEED_PAGE_SIZE", defaults.feed.page_size)?;
        if page_size == 0 {
            return Err(ConfigError::NotPositive { name: "FEED_PAGE_SIZE" });
        }

        Ok(Config {
            app: AppConfig {
                environment: env::var("ENVIRONMENT").unwrap_or(defaults.app.environment),
                rust_log: env::var("RUST_LOG").unwrap_or(defaults.app.rust_log),
            },
            api: ApiConfig {
                base_url: env::var("API_BASE_URL").unwrap_or(defaults.api.base_url),
                timeout_seconds: parse_var("API_TIMEOUT_SECONDS", defaults.api.timeout_seconds)?,
                token: env::var("API_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            },
            feed: FeedConfig {
                page_size,
                scroll_threshold_px: parse_var(
                    "SCROLL_THRESHOLD_PX",
                    defaults.feed.scroll_threshold_px,
                )?,
                scroll_debounce_ms: parse_var(
                    "SCROLL_DEBOUNCE_MS",
                    defaults.feed.scroll_debounce_ms,
                )?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    parse_value(name, env::var(name).ok(), default)
}

fn parse_value<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_feed_constants() {
        let config = Config::default();
        assert_eq!(config.feed.page_size, 8);
        assert_eq!(config.feed.scroll_threshold_px, 300.0);
        assert_eq!(config.feed.scroll_debounce_ms, 100);
        assert!(config.api.token.is_none());
    }

    #[test]
    fn missing_value_falls_back_to_default() {
        let value: u64 = parse_value("SCROLL_DEBOUNCE_MS", None, 100).unwrap();
        assert_eq!(value, 100);
    }

    #[test]
    fn present_value_is_parsed() {
        let value: u32 = parse_value("FEED_PAGE_SIZE", Some(" 12 ".to_string()), 8).unwrap();
        assert_eq!(value, 12);
    }

    #[test]
    fn garbage_value_is_reported_with_its_name() {
        let err = parse_value::<u64>("API_TIMEOUT_SECONDS", Some("soon".to_string()), 30)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("API_TIMEOUT_SECONDS"));
        assert!(message.contains("soon"));
    }
}
