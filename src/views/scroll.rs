use std::future::Future;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

/// Положение прокрутки окна в момент события.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    /// До низа документа осталось не больше `threshold` пикселей.
    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.scroll_top + self.viewport_height >= self.document_height - threshold
    }
}

/// Слушатель прокрутки с debounce по заднему фронту.
///
/// Серия событий, между которыми проходит меньше `delay`, схлопывается в один вызов
/// обработчика с последним положением. При удалении слушателя задача останавливается
/// вместе с недождавшимся таймером.
pub struct ScrollWatcher {
    events: mpsc::UnboundedSender<ScrollMetrics>,
    task: JoinHandle<()>,
}

impl ScrollWatcher {
    pub fn attach<F, Fut>(delay: Duration, on_settle: F) -> Self
    where
        F: FnMut(ScrollMetrics) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (events, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce(rx, delay, on_settle));
        Self { events, task }
    }

    pub fn notify(&self, metrics: ScrollMetrics) {
        // Канал закрыт только после detach
        let _ = self.events.send(metrics);
    }

    /// Отключает слушатель; задача и недождавшийся таймер останавливаются в `Drop`.
    pub fn detach(self) {}
}

impl Drop for ScrollWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce<F, Fut>(
    mut rx: mpsc::UnboundedReceiver<ScrollMetrics>,
    delay: Duration,
    mut on_settle: F,
) where
    F: FnMut(ScrollMetrics) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut pending: Option<ScrollMetrics> = None;
    loop {
        match pending {
            None => match rx.recv().await {
                Some(metrics) => pending = Some(metrics),
                None => break,
            },
            Some(metrics) => {
                tokio::select! {
                    next = rx.recv() => match next {
                        // Новое событие перезапускает таймер
                        Some(next) => pending = Some(next),
                        None => break,
                    },
                    _ = tokio::time::sleep(delay) => {
                        pending = None;
                        debug!("Scroll settled at {:?}", metrics);
                        tokio::spawn(on_settle(metrics));
                    }
                }
            }
        }
    }
}
