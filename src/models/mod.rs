pub mod event;
pub mod filter;
pub mod location;
pub mod search;

pub use event::{Event, Paginated};
pub use filter::FilterSnapshot;
pub use location::{City, Country, District, LocationCatalog, LocationId, LocationItem};
pub use search::SearchQuery;
