pub mod coordinates;
pub mod error;
pub mod open_meteo;
pub mod planner;
pub mod scheduler;
pub mod traits;
pub mod updater;

pub use coordinates::{read_coordinates, AreaCoordinate};
pub use error::{CoordinatesError, OpenMeteoError};
pub use open_meteo::OpenMeteoClient;
pub use planner::{plan_updates, PlannedUpdate};
pub use scheduler::{SchedulerStatus, WeatherScheduler};
pub use traits::{GraphWeatherStore, WeatherSource, WeatherStore};
pub use updater::{BatchOutcome, LocationOutcome, MonthUpdateOutcome, WeatherUpdater};
