use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use event_hub::{
    config::Config,
    services::FeedState,
    views::{CatalogStatus, EventHub, ScrollMetrics},
    AppState,
};

// Условная высота карточки события и окна при отрисовке в терминале
const ROW_HEIGHT: f64 = 120.0;
const VIEWPORT_HEIGHT: f64 = 900.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Event Hub ({})", config.app.environment);
    let wait_limit = Duration::from_secs(config.api.timeout_seconds + 5);

    let state = AppState::new(config)?;
    info!("Using API at {}", state.api.base_url());

    let hub = EventHub::mount(state);
    let mut updates = hub.feed().subscribe();

    match hub.catalog_ready().await {
        CatalogStatus::Failed(message) => error!("Location filters unavailable: {}", message),
        _ => {
            let catalog = hub.panel().catalog();
            println!(
                "Locations: {} countries, {} cities, {} districts",
                catalog.countries.len(),
                catalog.cities.len(),
                catalog.districts.len()
            );
        }
    }

    tokio::time::timeout(wait_limit, updates.wait_for(|s| s.generation > 0 && !s.loading))
        .await??;

    // Прокручиваем ленту до конца, пока сервер отдаёт страницы
    loop {
        let feed = hub.feed().state();
        if let Some(message) = &feed.error {
            error!("Search failed: {}", message);
            break;
        }
        if let Some(message) = &feed.error_more {
            warn!("Could not load page {}: {}", feed.page_number, message);
            break;
        }
        if !feed.has_more() {
            break;
        }

        let document_height = feed.events.len() as f64 * ROW_HEIGHT;
        hub.on_scroll(ScrollMetrics {
            scroll_top: (document_height - VIEWPORT_HEIGHT).max(0.0),
            viewport_height: VIEWPORT_HEIGHT,
            document_height,
        });

        let page = feed.page_number;
        tokio::time::timeout(
            wait_limit,
            updates.wait_for(|s| {
                s.page_number > page || s.error_more.is_some() || s.error.is_some()
            }),
        )
        .await??;
    }

    render(&hub.feed().state());
    Ok(())
}

fn render(feed: &FeedState) {
    println!(
        "Events: {} loaded, {} page(s) total",
        feed.events.len(),
        feed.total_pages
    );
    for event in &feed.events {
        println!(
            "- {} | {} | {} | by {} | {} going, {} likes",
            event.date().unwrap_or("-"),
            event.title().unwrap_or("(untitled)"),
            event.location_label().unwrap_or_else(|| "-".to_string()),
            event.creator_name().unwrap_or("unknown"),
            event.participant_count().unwrap_or(0),
            event.like_count().unwrap_or(0),
        );
    }
}
