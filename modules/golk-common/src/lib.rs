pub mod config;
pub mod error;
pub mod schema;
pub mod types;
pub mod weather;

pub use config::Config;
pub use error::GolkError;
pub use types::*;
pub use weather::*;
