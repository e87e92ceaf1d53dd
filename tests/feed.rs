mod common;

use chrono::NaiveDate;
use std::time::Duration;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use event_hub::{
    api_client::{ApiClient, Session},
    models::FilterSnapshot,
    services::{EventFeed, FetchOutcome},
};

use common::{api_for, base_url, events, ids, page, settle, SEARCH};

fn feed_for(server: &MockServer) -> EventFeed {
    EventFeed::new(api_for(server), 8)
}

async fn mount_page(server: &MockServer, number: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("pageNumber", number))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn new_search_replaces_events_and_points_at_page_two() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page(events(0..8), 20)).await;
    let feed = feed_for(&server);
    let snapshot = FilterSnapshot::default();

    // Номер страницы при новом поиске игнорируется
    let outcome = feed.fetch_page(&snapshot, 5, true).await;

    assert_eq!(outcome, FetchOutcome::Loaded { received: 8 });
    let state = feed.state();
    assert_eq!(state.events.len(), 8);
    assert_eq!(state.page_number, 2);
    assert_eq!(state.total_pages, 3);
    assert!(!state.loading);
    assert_eq!(state.generation, 1);

    // Повторный новый поиск не накапливает, а заменяет
    feed.fetch_page(&snapshot, 1, true).await;
    assert_eq!(feed.state().events.len(), 8);
    assert_eq!(feed.state().generation, 2);
}

#[tokio::test]
async fn incremental_fetch_appends_without_dedup() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page(events(0..8), 16)).await;
    // Сервер вернул пересекающиеся записи: клиент их не фильтрует
    mount_page(&server, "2", page(events(6..14), 16)).await;
    let feed = feed_for(&server);
    let snapshot = FilterSnapshot::default();

    feed.fetch_page(&snapshot, 1, true).await;
    let before = feed.state().events.len();
    let outcome = feed.fetch_page(&snapshot, 2, false).await;

    assert_eq!(outcome, FetchOutcome::Loaded { received: 8 });
    let state = feed.state();
    assert_eq!(state.events.len(), before + 8);
    assert_eq!(&ids(&state)[6..10], &[6, 7, 6, 7]);
    assert_eq!(state.page_number, 3);
    assert!(!state.has_more());
}

#[tokio::test]
async fn total_pages_follows_every_response() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page(events(0..8), 16)).await;
    mount_page(&server, "2", page(events(8..16), 17)).await;
    let feed = feed_for(&server);
    let snapshot = FilterSnapshot::default();

    feed.fetch_page(&snapshot, 1, true).await;
    assert_eq!(feed.state().total_pages, 2);

    feed.fetch_more(&snapshot).await;
    let state = feed.state();
    assert_eq!(state.total_pages, 3);
    assert!(state.can_load_more());
}

#[tokio::test]
async fn incremental_fetch_in_flight_blocks_another() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page(events(0..8), 24)).await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("pageNumber", "2"))
        .respond_with(page(events(8..16), 24).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    let feed = feed_for(&server);
    let snapshot = FilterSnapshot::default();
    feed.fetch_page(&snapshot, 1, true).await;

    let first = {
        let feed = feed.clone();
        let snapshot = snapshot.clone();
        tokio::spawn(async move { feed.fetch_page(&snapshot, 2, false).await })
    };
    let mut updates = feed.subscribe();
    settle(&mut updates, |s| s.loading_more).await;

    let second = feed.fetch_page(&snapshot, 2, false).await;
    assert_eq!(second, FetchOutcome::Skipped);
    assert_eq!(feed.state().page_number, 2);

    assert_eq!(first.await.unwrap(), FetchOutcome::Loaded { received: 8 });
    assert_eq!(feed.state().page_number, 3);
    assert_eq!(feed.state().events.len(), 16);
}

#[tokio::test]
async fn failed_new_search_sets_error() {
    let server = MockServer::start().await;
    mount_page(&server, "1", ResponseTemplate::new(500)).await;
    let feed = feed_for(&server);

    let outcome = feed.fetch_page(&FilterSnapshot::default(), 1, true).await;

    assert!(matches!(outcome, FetchOutcome::Failed(_)));
    let state = feed.state();
    assert!(state.events.is_empty());
    assert!(!state.loading);
    assert!(state.error.as_deref().unwrap().contains("500"));
    assert!(state.error_more.is_none());
}

#[tokio::test]
async fn failed_incremental_fetch_keeps_events_until_retry() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page(events(0..8), 16)).await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("pageNumber", "2"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let feed = feed_for(&server);
    let snapshot = FilterSnapshot::default();
    feed.fetch_page(&snapshot, 1, true).await;

    let outcome = feed.fetch_more(&snapshot).await;
    assert!(matches!(outcome, FetchOutcome::Failed(_)));
    let state = feed.state();
    assert_eq!(state.events.len(), 8);
    assert_eq!(state.page_number, 2);
    assert!(state.error_more.is_some());
    assert!(state.error.is_none());

    // Прокрутка не повторяет запрос, пока висит ошибка
    assert_eq!(feed.fetch_more(&snapshot).await, FetchOutcome::Skipped);

    mount_page(&server, "2", page(events(8..16), 16)).await;
    let outcome = feed.retry_more(&snapshot).await;
    assert_eq!(outcome, FetchOutcome::Loaded { received: 8 });
    let state = feed.state();
    assert_eq!(state.events.len(), 16);
    assert!(state.error_more.is_none());
}

#[tokio::test]
async fn retry_without_error_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page(events(0..8), 16)).await;
    let feed = feed_for(&server);
    let snapshot = FilterSnapshot::default();
    feed.fetch_page(&snapshot, 1, true).await;

    assert_eq!(feed.retry_more(&snapshot).await, FetchOutcome::Skipped);
    assert_eq!(feed.state().page_number, 2);
}

#[tokio::test]
async fn stale_search_response_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("CountryIds", "1"))
        .respond_with(page(events(100..108), 8).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("CountryIds", "2"))
        .respond_with(page(events(200..203), 3))
        .mount(&server)
        .await;
    let feed = feed_for(&server);
    let turkey = FilterSnapshot {
        selected_country: Some(1),
        ..FilterSnapshot::default()
    };
    let georgia = FilterSnapshot {
        selected_country: Some(2),
        ..FilterSnapshot::default()
    };

    let slow = tokio::spawn(feed.new_search(turkey));
    let fresh = feed.new_search(georgia).await;

    assert_eq!(fresh, FetchOutcome::Loaded { received: 3 });
    assert_eq!(slow.await.unwrap(), FetchOutcome::Stale);
    let state = feed.state();
    assert_eq!(ids(&state), vec![200, 201, 202]);
    assert_eq!(state.total_pages, 1);
    assert_eq!(state.generation, 2);
}

#[tokio::test]
async fn new_search_abandons_incremental_in_flight() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page(events(0..8), 16)).await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("pageNumber", "2"))
        .respond_with(page(events(8..16), 16).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    let feed = feed_for(&server);
    let snapshot = FilterSnapshot::default();
    feed.fetch_page(&snapshot, 1, true).await;

    let more = {
        let feed = feed.clone();
        let snapshot = snapshot.clone();
        tokio::spawn(async move { feed.fetch_more(&snapshot).await })
    };
    let mut updates = feed.subscribe();
    settle(&mut updates, |s| s.loading_more).await;

    feed.fetch_page(&snapshot, 1, true).await;
    assert!(!feed.state().loading_more);

    assert_eq!(more.await.unwrap(), FetchOutcome::Stale);
    let state = feed.state();
    assert_eq!(state.events.len(), 8);
    assert_eq!(state.page_number, 2);
}

#[tokio::test]
async fn query_carries_filters_and_shifted_date() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page(vec![], 0)).await;
    let feed = feed_for(&server);
    let snapshot = FilterSnapshot {
        selected_country: Some(1),
        selected_cities: vec![5, 6],
        selected_districts: vec![50],
        from_date: NaiveDate::from_ymd_opt(2024, 12, 24),
    };

    feed.fetch_page(&snapshot, 1, true).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert_eq!(
        query,
        "pageNumber=1&pageSize=8&SortBy=date&CountryIds=1&CityIds=5&CityIds=6\
         &DistrictIds=50&FromDate=2024-12-23"
    );
    let state = feed.state();
    assert_eq!(state.total_pages, 0);
    assert!(!state.has_more());
}

#[tokio::test]
async fn session_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(page(events(0..2), 2))
        .expect(1)
        .mount(&server)
        .await;
    let session = Session {
        token: Some("s3cret".to_string()),
    };
    let api = ApiClient::new(&base_url(&server), Duration::from_secs(5), &session).unwrap();
    let feed = EventFeed::new(api, 8);

    let outcome = feed.fetch_page(&FilterSnapshot::default(), 1, true).await;

    assert_eq!(outcome, FetchOutcome::Loaded { received: 2 });
}
