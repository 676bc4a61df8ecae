use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use golk_common::{CurrentConditions, Month, MonthlyWeather};
use golk_graph::{
    AreaWeatherState, GraphClient, ResetCounts, UpdateStats, WeatherReader, WeatherWriter,
};

use crate::open_meteo::OpenMeteoClient;

// --- WeatherSource trait ---

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Readings for `hour` (0-23, Sri Lanka time).
    async fn current_conditions(&self, lat: f64, lon: f64, hour: u32) -> Result<CurrentConditions>;

    /// Per-month climate over the year before `today`. Months without data are absent.
    async fn monthly_climate(
        &self,
        lat: f64,
        lon: f64,
        today: NaiveDate,
    ) -> Result<BTreeMap<Month, MonthlyWeather>>;
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn current_conditions(&self, lat: f64, lon: f64, hour: u32) -> Result<CurrentConditions> {
        Ok(OpenMeteoClient::current_conditions(self, lat, lon, hour).await?)
    }

    async fn monthly_climate(
        &self,
        lat: f64,
        lon: f64,
        today: NaiveDate,
    ) -> Result<BTreeMap<Month, MonthlyWeather>> {
        Ok(OpenMeteoClient::monthly_climate(self, lat, lon, today).await?)
    }
}

// --- WeatherStore trait ---

#[async_trait]
pub trait WeatherStore: Send + Sync {
    async fn area_weather_states(&self) -> Result<Vec<AreaWeatherState>>;
    async fn write_month(
        &self,
        area: &str,
        weather: &MonthlyWeather,
        last_updated: DateTime<Utc>,
    ) -> Result<()>;
    async fn ensure_month(&self, month: Month) -> Result<()>;
    async fn link_area_month(&self, area: &str, month: Month) -> Result<bool>;
    async fn reset_update_timestamps(&self) -> Result<ResetCounts>;
    async fn update_stats(&self) -> Result<UpdateStats>;
}

/// The Neo4j-backed store.
pub struct GraphWeatherStore {
    reader: WeatherReader,
    writer: WeatherWriter,
}

impl GraphWeatherStore {
    pub fn new(client: GraphClient) -> Self {
        Self {
            reader: WeatherReader::new(client.clone()),
            writer: WeatherWriter::new(client),
        }
    }
}

#[async_trait]
impl WeatherStore for GraphWeatherStore {
    async fn area_weather_states(&self) -> Result<Vec<AreaWeatherState>> {
        Ok(self.writer.area_weather_states().await?)
    }

    async fn write_month(
        &self,
        area: &str,
        weather: &MonthlyWeather,
        last_updated: DateTime<Utc>,
    ) -> Result<()> {
        Ok(self.writer.write_month(area, weather, last_updated).await?)
    }

    async fn ensure_month(&self, month: Month) -> Result<()> {
        Ok(self.writer.ensure_month(month).await?)
    }

    async fn link_area_month(&self, area: &str, month: Month) -> Result<bool> {
        Ok(self.writer.link_area_month(area, month).await?)
    }

    async fn reset_update_timestamps(&self) -> Result<ResetCounts> {
        Ok(self.writer.reset_update_timestamps().await?)
    }

    async fn update_stats(&self) -> Result<UpdateStats> {
        Ok(self.reader.update_stats().await?)
    }
}
