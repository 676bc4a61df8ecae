use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use golk_common::{parse_timestamp, sri_lanka_time, Month, MonthlyWeather};
use tracing::{info, warn};

use crate::coordinates::{read_coordinates, AreaCoordinate};
use crate::planner::plan_updates;
use crate::traits::{WeatherSource, WeatherStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationOutcome {
    /// No current reading was available; nothing written.
    Skipped,
    Refreshed { months_written: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub planned: usize,
    pub attempted: usize,
    pub succeeded: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthUpdateOutcome {
    pub areas_selected: usize,
    pub linked: usize,
    pub refreshed: usize,
}

pub struct WeatherUpdater {
    source: Arc<dyn WeatherSource>,
    store: Arc<dyn WeatherStore>,
    coordinates_path: PathBuf,
    batch_size: usize,
    update_interval_hours: f64,
}

impl WeatherUpdater {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        store: Arc<dyn WeatherStore>,
        coordinates_path: impl Into<PathBuf>,
        batch_size: usize,
        update_interval_hours: f64,
    ) -> Self {
        Self {
            source,
            store,
            coordinates_path: coordinates_path.into(),
            batch_size,
            update_interval_hours,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn update_interval_hours(&self) -> f64 {
        self.update_interval_hours
    }

    pub fn store(&self) -> &Arc<dyn WeatherStore> {
        &self.store
    }

    fn coordinates(&self) -> Result<Vec<AreaCoordinate>> {
        read_coordinates(&self.coordinates_path)
            .with_context(|| format!("reading {}", self.coordinates_path.display()))
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let secs = (self.update_interval_hours * 3600.0).round() as i64;
        now - chrono::Duration::seconds(secs)
    }

    /// Refresh all twelve months for one area.
    ///
    /// Errors only when every month write failed.
    pub async fn update_location(
        &self,
        area: &str,
        lat: f64,
        lon: f64,
        now: DateTime<Utc>,
    ) -> Result<LocationOutcome> {
        let local = sri_lanka_time(now);

        let current = match self.source.current_conditions(lat, lon, local.hour()).await {
            Ok(c) => c,
            Err(e) => {
                warn!(area, error = %e, "No current weather data, skipping");
                return Ok(LocationOutcome::Skipped);
            }
        };

        let mut monthly = match self.source.monthly_climate(lat, lon, local.date()).await {
            Ok(m) => m,
            Err(e) => {
                warn!(area, error = %e, "No historical weather data");
                Default::default()
            }
        };

        if let Some(this_month) = Month::from_number(local.month()) {
            if let Some(entry) = monthly.get_mut(&this_month) {
                entry.overlay_current(current);
            }
        }

        let mut written = 0;
        for month in Month::ALL {
            let data = monthly
                .remove(&month)
                .unwrap_or_else(|| MonthlyWeather::placeholder(month));
            match self.store.write_month(area, &data, now).await {
                Ok(()) => written += 1,
                Err(e) => warn!(area, month = %month, error = %e, "Failed to write month"),
            }
        }

        if written == 0 {
            return Err(anyhow!("no months written for {area}"));
        }
        info!(area, months = written, "Updated weather");
        Ok(LocationOutcome::Refreshed {
            months_written: written,
        })
    }

    /// Refresh up to `batch_size` due areas. Resets all stamps first if nothing is due.
    pub async fn update_batch(&self, now: DateTime<Utc>) -> Result<BatchOutcome> {
        info!(batch_size = self.batch_size, "Starting weather batch update");

        let coords = self.coordinates()?;
        let cutoff = self.cutoff(now);

        let states = self.store.area_weather_states().await?;
        let mut plan = plan_updates(&coords, &states, cutoff);

        if plan.is_empty() {
            warn!("No locations need updating, resetting timestamps");
            self.store.reset_update_timestamps().await?;
            let states = self.store.area_weather_states().await?;
            plan = plan_updates(&coords, &states, cutoff);
        }

        let planned = plan.len();
        info!(planned, "Locations due for update");

        let mut outcome = BatchOutcome {
            planned,
            ..Default::default()
        };
        for location in plan.into_iter().take(self.batch_size) {
            outcome.attempted += 1;
            match self
                .update_location(&location.area, location.latitude, location.longitude, now)
                .await
            {
                Ok(LocationOutcome::Refreshed { .. }) => outcome.succeeded += 1,
                Ok(LocationOutcome::Skipped) => {}
                Err(e) => warn!(area = location.area.as_str(), error = %e, "Failed to update location"),
            }
        }

        info!(
            succeeded = outcome.succeeded,
            attempted = outcome.attempted,
            "Weather batch complete"
        );
        self.log_stats(now).await;
        Ok(outcome)
    }

    async fn log_stats(&self, now: DateTime<Utc>) {
        match self.store.update_stats().await {
            Ok(stats) => {
                info!(
                    areas_with_weather = stats.areas_with_weather,
                    total_areas = stats.total_areas,
                    "Weather coverage"
                );
                if let Some(oldest) = stats.oldest_update.as_deref().and_then(parse_timestamp) {
                    info!(
                        days_old = (now - oldest).num_days(),
                        oldest = %oldest,
                        "Oldest weather update"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Failed to read weather stats"),
        }
    }

    /// Ensure `month`'s node exists, link the selected areas to it, and refresh them.
    /// `areas: None` selects every area in the coordinates file.
    pub async fn update_month(
        &self,
        month: Month,
        areas: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Result<MonthUpdateOutcome> {
        let coords: Vec<AreaCoordinate> = self
            .coordinates()?
            .into_iter()
            .filter(|c| areas.map_or(true, |wanted| wanted.iter().any(|a| a == &c.area)))
            .collect();

        info!(month = %month, areas = coords.len(), "Updating month");
        self.store.ensure_month(month).await?;

        let mut outcome = MonthUpdateOutcome {
            areas_selected: coords.len(),
            ..Default::default()
        };
        for c in &coords {
            match self.store.link_area_month(&c.area, month).await {
                Ok(true) => outcome.linked += 1,
                Ok(false) => warn!(area = c.area.as_str(), "Area not in graph, not linked"),
                Err(e) => warn!(area = c.area.as_str(), error = %e, "Failed to link area"),
            }
            match self.update_location(&c.area, c.latitude, c.longitude, now).await {
                Ok(LocationOutcome::Refreshed { .. }) => outcome.refreshed += 1,
                Ok(LocationOutcome::Skipped) => {}
                Err(e) => warn!(area = c.area.as_str(), error = %e, "Failed to update location"),
            }
        }

        info!(month = %month, refreshed = outcome.refreshed, "Month update complete");
        Ok(outcome)
    }
}
