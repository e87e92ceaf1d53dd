pub mod catalog;
pub mod feed;

pub use catalog::load_catalog;
pub use feed::{EventFeed, FeedState, FetchOutcome};
