pub mod client;
pub mod loader;
pub mod migrate;
pub mod query_runner;
pub mod reader;
pub mod writer;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use client::GraphClient;
pub use loader::{BulkLoader, LoadError, LoadPlan, LoadReport};
pub use migrate::migrate;
pub use neo4rs::query;
pub use query_runner::{QueryError, QueryRunner};
pub use reader::{UpdateStats, WeatherReader, WeatherRecord};
pub use writer::{AreaWeatherState, ResetCounts, WeatherWriter};
