//! feed.rs
//!
//! Постраничная загрузка событий для бесконечной ленты.
//!
//! Ключевые моменты:
//! 1.  **Новый поиск** (смена фильтров) сбрасывает накопленный список и запрашивает
//!     первую страницу. Каждый новый поиск увеличивает `generation`; ответ, пришедший
//!     для устаревшего поколения, отбрасывается целиком.
//! 2.  **Догрузка** (прокрутка к низу) добавляет следующую страницу в конец списка
//!     без дедупликации. Одновременно в полёте может быть только одна догрузка.
//! 3.  Состояние хранится в `watch`-канале: изменения применяются синхронно внутри
//!     `send_if_modified`, подписчики (отрисовка, тесты) видят каждое изменение.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api_client::ApiClient,
    error::ApiError,
    models::{Event, FilterSnapshot, Paginated, SearchQuery},
};

/// Состояние ленты, которое отрисовывает экран.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    /// События в порядке поступления; повторы между страницами сохраняются.
    pub events: Vec<Event>,
    /// Номер следующей страницы (с 1).
    pub page_number: u32,
    pub total_pages: u32,
    /// Идёт первая загрузка или новый поиск.
    pub loading: bool,
    /// Идёт догрузка следующей страницы.
    pub loading_more: bool,
    pub error: Option<String>,
    pub error_more: Option<String>,
    /// Номер текущего поиска.
    pub generation: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            page_number: 1,
            total_pages: 0,
            loading: false,
            loading_more: false,
            error: None,
            error_more: None,
            generation: 0,
        }
    }
}

impl FeedState {
    pub fn has_more(&self) -> bool {
        self.page_number <= self.total_pages
    }

    /// Можно ли догружать по прокрутке прямо сейчас.
    pub fn can_load_more(&self) -> bool {
        !self.loading && !self.loading_more && self.error_more.is_none() && self.has_more()
    }
}

/// Чем закончился вызов загрузки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Ответ применён к состоянию.
    Loaded { received: usize },
    /// Запрос не отправлялся.
    Skipped,
    /// Ответ пришёл для устаревшего поиска и был отброшен.
    Stale,
    /// Запрос завершился ошибкой; сообщение сохранено в состоянии.
    Failed(String),
}

pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let pages = total_count.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Лента событий поверх `/events/search`.
#[derive(Clone)]
pub struct EventFeed {
    api: ApiClient,
    page_size: u32,
    state: Arc<watch::Sender<FeedState>>,
}

/// Что нужно знать завершению запроса о том, как он начинался.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    generation: u64,
    page_number: u32,
    is_new_search: bool,
}

impl EventFeed {
    pub fn new(api: ApiClient, page_size: u32) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            api,
            page_size: page_size.max(1),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Загружает страницу событий для снимка фильтров.
    ///
    /// При `is_new_search` номер страницы игнорируется и берётся первая страница,
    /// накопленный список очищается. Иначе страница добавляется в конец списка;
    /// если другая догрузка ещё в полёте, вызов ничего не делает.
    pub async fn fetch_page(
        &self,
        snapshot: &FilterSnapshot,
        page_number: u32,
        is_new_search: bool,
    ) -> FetchOutcome {
        let ticket = if is_new_search {
            Some(self.begin_new_search())
        } else {
            self.begin_more(Some(page_number), |state| !state.loading_more)
        };

        match ticket {
            Some(ticket) => self.run(snapshot, ticket).await,
            None => {
                debug!("Incremental fetch already in flight, skipping page {}", page_number);
                FetchOutcome::Skipped
            }
        }
    }

    /// Новый поиск: состояние сбрасывается сразу при вызове, запрос выполняет возвращённый future.
    ///
    /// Поколение назначается синхронно, поэтому порядок вызовов совпадает с порядком поколений,
    /// даже если сами запросы запущены в разных задачах.
    pub fn new_search(
        &self,
        snapshot: FilterSnapshot,
    ) -> impl Future<Output = FetchOutcome> + Send + 'static {
        let ticket = self.begin_new_search();
        let feed = self.clone();
        async move { feed.run(&snapshot, ticket).await }
    }

    /// Догрузка по прокрутке: следующая страница, если она есть и ничего не мешает.
    pub async fn fetch_more(&self, snapshot: &FilterSnapshot) -> FetchOutcome {
        match self.begin_more(None, FeedState::can_load_more) {
            Some(ticket) => self.run(snapshot, ticket).await,
            None => FetchOutcome::Skipped,
        }
    }

    /// Повторяет неудавшуюся догрузку той же страницы.
    pub async fn retry_more(&self, snapshot: &FilterSnapshot) -> FetchOutcome {
        let ticket = self.begin_more(None, |state| {
            state.error_more.is_some() && !state.loading && !state.loading_more
        });
        match ticket {
            Some(ticket) => {
                info!("Retrying page {} after a failed incremental fetch", ticket.page_number);
                self.run(snapshot, ticket).await
            }
            None => FetchOutcome::Skipped,
        }
    }

    fn begin_new_search(&self) -> Ticket {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.events.clear();
            state.page_number = 1;
            state.total_pages = 0;
            state.loading = true;
            // Догрузка прошлого поиска больше не актуальна
            state.loading_more = false;
            state.error = None;
            state.error_more = None;
            generation = state.generation;
        });

        Ticket {
            generation,
            page_number: 1,
            is_new_search: true,
        }
    }

    /// Проверка и установка `loading_more` происходят под одной блокировкой канала.
    /// Без явного номера берётся следующая страница из состояния.
    fn begin_more(
        &self,
        page_number: Option<u32>,
        allowed: impl FnOnce(&FeedState) -> bool,
    ) -> Option<Ticket> {
        let mut ticket = None;
        self.state.send_if_modified(|state| {
            if !allowed(state) {
                return false;
            }
            state.loading_more = true;
            state.error_more = None;
            ticket = Some(Ticket {
                generation: state.generation,
                page_number: page_number.unwrap_or(state.page_number),
                is_new_search: false,
            });
            true
        });
        ticket
    }

    async fn run(&self, snapshot: &FilterSnapshot, ticket: Ticket) -> FetchOutcome {
        let query = SearchQuery::from_snapshot(snapshot, ticket.page_number, self.page_size);
        info!(
            "Searching events: page={}, new_search={}, generation={}",
            ticket.page_number, ticket.is_new_search, ticket.generation
        );

        let result = self.api.search_events(&query).await;
        self.complete(ticket, result)
    }

    fn complete(&self, ticket: Ticket, result: Result<Paginated<Event>, ApiError>) -> FetchOutcome {
        let page_size = self.page_size;
        let mut outcome = FetchOutcome::Stale;

        self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }

            match result {
                Ok(page) => {
                    let received = page.items.len();
                    // totalCount может меняться между запросами, пересчитываем каждый раз
                    state.total_pages = total_pages(page.total_count, page_size);
                    if ticket.is_new_search {
                        state.events = page.items;
                        state.page_number = 2;
                        state.loading = false;
                    } else {
                        state.events.extend(page.items);
                        state.page_number += 1;
                        state.loading_more = false;
                    }
                    outcome = FetchOutcome::Loaded { received };
                }
                Err(e) => {
                    let message = e.to_string();
                    if ticket.is_new_search {
                        state.error = Some(message.clone());
                        state.loading = false;
                    } else {
                        state.error_more = Some(message.clone());
                        state.loading_more = false;
                    }
                    outcome = FetchOutcome::Failed(message);
                }
            }
            true
        });

        match &outcome {
            FetchOutcome::Stale => debug!(
                "Discarding response for page {} of stale search generation {}",
                ticket.page_number, ticket.generation
            ),
            FetchOutcome::Failed(message) => {
                warn!("Event search for page {} failed: {}", ticket.page_number, message)
            }
            _ => {}
        }
        outcome
    }
}
