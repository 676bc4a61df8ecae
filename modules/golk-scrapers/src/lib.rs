pub mod areas;
pub mod destinations;
pub mod distance;
pub mod fetcher;
pub mod maps;
pub mod output;
pub mod places;
pub mod sitemap;

pub use fetcher::{with_retry, BrowserlessFetcher, HttpFetcher, PageFetcher};
pub use maps::{ListingKind, MapsScraper};
