use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info};

use crate::{
    api_client::ApiClient,
    models::{FilterSnapshot, LocationCatalog},
    services::{load_catalog, EventFeed, FetchOutcome},
    views::{FilterPanel, ScrollMetrics, ScrollWatcher},
    AppState,
};

/// Состояние загрузки справочника локаций.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    Loading,
    Loaded,
    Failed(String),
}

/// Экран "Event Hub": справочник локаций, панель фильтров и бесконечная лента.
///
/// При создании параллельно запускает загрузку справочника и первый поиск: лента не
/// ждёт справочника, панель получает его, когда он придёт. Каждый новый снимок
/// фильтров запускает новый поиск, прокрутка к низу догружает следующую страницу.
/// При удалении хаба слушатель прокрутки отключается, незавершённая загрузка
/// справочника отменяется, а изменения фильтров больше не отслеживаются.
pub struct EventHub {
    panel: Arc<FilterPanel>,
    feed: EventFeed,
    catalog_status: watch::Receiver<CatalogStatus>,
    scroll: ScrollWatcher,
    catalog_task: JoinHandle<()>,
    searches: JoinHandle<()>,
}

impl EventHub {
    pub fn mount(state: Arc<AppState>) -> Self {
        Self::mount_at(state, Local::now().date_naive())
    }

    /// То же, что `mount`, но с явной "сегодняшней" датой для фильтра по умолчанию.
    pub fn mount_at(state: Arc<AppState>, today: NaiveDate) -> Self {
        let panel = Arc::new(FilterPanel::new(
            Arc::new(LocationCatalog::default()),
            FilterSnapshot::starting_from(today),
        ));
        let feed = EventFeed::new(state.api.clone(), state.config.feed.page_size);

        let (status, catalog_status) = watch::channel(CatalogStatus::Loading);
        let catalog_task = tokio::spawn(load_locations(state.api.clone(), panel.clone(), status));
        let searches = tokio::spawn(run_searches(feed.clone(), panel.subscribe()));

        let threshold = state.config.feed.scroll_threshold_px;
        let delay = Duration::from_millis(state.config.feed.scroll_debounce_ms);
        let scroll = {
            let feed = feed.clone();
            let snapshots = panel.subscribe();
            ScrollWatcher::attach(delay, move |metrics: ScrollMetrics| {
                let feed = feed.clone();
                let snapshot = snapshots.borrow().clone();
                async move {
                    if metrics.is_near_bottom(threshold) {
                        feed.fetch_more(&snapshot).await;
                    }
                }
            })
        };

        info!("Event hub mounted");
        Self {
            panel,
            feed,
            catalog_status,
            scroll,
            catalog_task,
            searches,
        }
    }

    pub fn panel(&self) -> &FilterPanel {
        &self.panel
    }

    pub fn feed(&self) -> &EventFeed {
        &self.feed
    }

    pub fn catalog_status(&self) -> CatalogStatus {
        self.catalog_status.borrow().clone()
    }

    /// Сообщение об ошибке загрузки справочника, если она была.
    pub fn catalog_error(&self) -> Option<String> {
        match &*self.catalog_status.borrow() {
            CatalogStatus::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Ждёт окончания загрузки справочника.
    pub async fn catalog_ready(&self) -> CatalogStatus {
        let mut status = self.catalog_status.clone();
        // Канал закрывается только вместе с задачей загрузки
        let _ = status.wait_for(|s| *s != CatalogStatus::Loading).await;
        self.catalog_status()
    }

    pub fn on_scroll(&self, metrics: ScrollMetrics) {
        self.scroll.notify(metrics);
    }

    /// Кнопка "повторить" под лентой после ошибки догрузки.
    pub async fn retry_more(&self) -> FetchOutcome {
        self.feed.retry_more(&self.panel.snapshot()).await
    }
}

impl Drop for EventHub {
    fn drop(&mut self) {
        self.catalog_task.abort();
        self.searches.abort();
    }
}

/// Загружает справочник и передаёт его панели.
///
/// Частично загруженный справочник не сохраняется: при ошибке панель остаётся пустой.
async fn load_locations(
    api: ApiClient,
    panel: Arc<FilterPanel>,
    status: watch::Sender<CatalogStatus>,
) {
    match load_catalog(&api).await {
        Ok(catalog) => {
            panel.set_catalog(catalog);
            status.send_replace(CatalogStatus::Loaded);
        }
        Err(e) => {
            error!("Location catalog failed to load: {}", e);
            status.send_replace(CatalogStatus::Failed(e.to_string()));
        }
    }
}

/// Запускает новый поиск для текущего снимка и для каждого следующего.
///
/// Поиски не ждут друг друга: порядок результатов обеспечивает счётчик поколений в ленте.
async fn run_searches(feed: EventFeed, mut snapshots: watch::Receiver<FilterSnapshot>) {
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        tokio::spawn(feed.new_search(snapshot));

        if snapshots.changed().await.is_err() {
            break;
        }
    }
}
