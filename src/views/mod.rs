pub mod event_hub;
pub mod filter_panel;
pub mod scroll;

pub use event_hub::{CatalogStatus, EventHub};
pub use filter_panel::FilterPanel;
pub use scroll::{ScrollMetrics, ScrollWatcher};
