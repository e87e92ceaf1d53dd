#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use event_hub::{
    api_client::{ApiClient, Session},
    config::{ApiConfig, Config, FeedConfig},
    services::FeedState,
    AppState,
};

pub const SEARCH: &str = "/api/v1/events/search";

pub fn base_url(server: &MockServer) -> String {
    format!("{}/api/v1", server.uri())
}

pub fn api_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&base_url(server), Duration::from_secs(5), &Session::default()).unwrap()
}

pub fn state_for(server: &MockServer) -> Arc<AppState> {
    let config = Config {
        api: ApiConfig {
            base_url: base_url(server),
            timeout_seconds: 5,
            token: None,
        },
        feed: FeedConfig {
            scroll_debounce_ms: 30,
            ..FeedConfig::default()
        },
        ..Config::default()
    };
    AppState::new(config).unwrap()
}

/// События с id из диапазона.
pub fn events(ids: std::ops::Range<i64>) -> Vec<Value> {
    ids.map(|id| json!({"id": id, "title": format!("Event {id}"), "date": "2025-01-10"}))
        .collect()
}

pub fn page(items: Vec<Value>, total_count: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"items": items, "totalCount": total_count}))
}

pub fn ids(state: &FeedState) -> Vec<i64> {
    state
        .events
        .iter()
        .filter_map(|e| e.id().and_then(Value::as_i64))
        .collect()
}

/// Ждёт состояния ленты, удовлетворяющего условию.
pub async fn settle(
    rx: &mut watch::Receiver<FeedState>,
    done: impl FnMut(&FeedState) -> bool,
) -> FeedState {
    tokio::time::timeout(Duration::from_secs(3), rx.wait_for(done))
        .await
        .expect("feed did not settle in time")
        .expect("feed channel closed")
        .clone()
}

/// Turkey (1) с Istanbul (5) и Izmir (6); Georgia (2) с Tbilisi (7).
pub async fn mount_catalog(server: &MockServer) {
    mount_slow_catalog(server, Duration::ZERO).await;
}

/// Тот же справочник, но список стран отвечает с задержкой.
pub async fn mount_slow_catalog(server: &MockServer, countries_delay: Duration) {
    let routes = [
        ("/api/v1/events/countries", json!([{"id": 1, "name": "Turkey"}, {"id": 2, "name": "Georgia"}])),
        ("/api/v1/events/countries/1/cities", json!([{"id": 5, "name": "Istanbul"}, {"id": 6, "name": "Izmir"}])),
        ("/api/v1/events/countries/2/cities", json!([{"id": 7, "name": "Tbilisi"}])),
        ("/api/v1/events/cities/5/districts", json!([{"id": 50, "name": "Kadikoy"}, {"id": 51, "name": "Besiktas"}])),
        ("/api/v1/events/cities/6/districts", json!([{"id": 60, "name": "Konak"}])),
        ("/api/v1/events/cities/7/districts", json!([])),
    ];
    for (route, body) in routes {
        let delay = if route.ends_with("/countries") { countries_delay } else { Duration::ZERO };
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .mount(server)
            .await;
    }
}
