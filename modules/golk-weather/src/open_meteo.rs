//! Open-Meteo forecast and archive endpoints (JSON API).

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use golk_common::{describe_weather, CurrentConditions, Month, MonthlyWeather};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::OpenMeteoError;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
const TIMEZONE: &str = "Asia/Colombo";

const MAX_RETRIES: u32 = 5;
/// Base backoff for retries. Actual delay is base * 2^attempt + jitter.
const RETRY_BASE: Duration = Duration::from_millis(200);

/// Days with more precipitation than this count as rainy.
const RAINY_DAY_MM: f64 = 0.1;

// --- Wire types ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub hourly: Option<HourlySeries>,
    #[serde(default)]
    pub daily: Option<DailySeries>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveResponse {
    #[serde(default)]
    pub daily: Option<DailySeries>,
}

/// One archived day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub precipitation: Option<f64>,
    pub max_wind: Option<f64>,
}

// --- Pure transforms ---

fn value_at(series: &[Option<f64>], idx: usize) -> Option<f64> {
    series.get(idx).copied().flatten()
}

fn last_value(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Extract readings for `hour` (clamped to the last available hour) and today's daily values.
pub fn current_from_forecast(resp: &ForecastResponse, hour: u32) -> Option<CurrentConditions> {
    let hourly = resp.hourly.as_ref()?;
    let daily = resp.daily.as_ref()?;
    let len = hourly.temperature_2m.len();
    if len == 0 {
        return None;
    }
    let idx = (hour as usize).min(len - 1);

    let temp = value_at(&hourly.temperature_2m, idx)?;
    let precipitation_prob = value_at(&hourly.precipitation_probability, idx).unwrap_or(0.0);
    let wind_speed = value_at(&hourly.wind_speed_10m, idx).unwrap_or(0.0);

    Some(CurrentConditions {
        temp,
        max_temp: last_value(&daily.temperature_2m_max).unwrap_or(temp),
        min_temp: last_value(&daily.temperature_2m_min).unwrap_or(temp),
        precipitation: last_value(&daily.precipitation_sum).unwrap_or(0.0),
        precipitation_prob,
        wind_speed,
        description: describe_weather(temp, precipitation_prob, wind_speed).to_string(),
    })
}

/// Zip the archive's parallel arrays into per-day rows, dropping unparseable dates.
pub fn daily_observations(daily: &DailySeries) -> Vec<DailyObservation> {
    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            Some(DailyObservation {
                date,
                max_temp: value_at(&daily.temperature_2m_max, i),
                min_temp: value_at(&daily.temperature_2m_min, i),
                precipitation: value_at(&daily.precipitation_sum, i),
                max_wind: value_at(&daily.wind_speed_10m_max, i),
            })
        })
        .collect()
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Group days by calendar month and summarise each month.
///
/// Temperatures and wind are means over days with a value; precipitation is the
/// month total; `precip_prob` is the share of days above the rainy-day threshold.
pub fn aggregate_monthly(days: &[DailyObservation]) -> BTreeMap<Month, MonthlyWeather> {
    let mut groups: BTreeMap<Month, Vec<&DailyObservation>> = BTreeMap::new();
    for day in days {
        if let Some(month) = Month::from_number(day.date.month()) {
            groups.entry(month).or_default().push(day);
        }
    }

    groups
        .into_iter()
        .map(|(month, days)| {
            let mean_max = mean(days.iter().map(|d| d.max_temp));
            let mean_min = mean(days.iter().map(|d| d.min_temp));
            let total_precip: f64 = days.iter().filter_map(|d| d.precipitation).sum();
            let avg_wind = mean(days.iter().map(|d| d.max_wind));
            let rainy = days
                .iter()
                .filter(|d| d.precipitation.is_some_and(|p| p > RAINY_DAY_MM))
                .count();
            let precip_prob = rainy as f64 / days.len() as f64 * 100.0;
            let avg_temp = (mean_max + mean_min) / 2.0;

            (
                month,
                MonthlyWeather {
                    month,
                    season: month.season(),
                    description: describe_weather(avg_temp, precip_prob, avg_wind).to_string(),
                    avg_temp,
                    avg_precip: total_precip,
                    avg_wind,
                    precip_prob,
                    current: None,
                },
            )
        })
        .collect()
}

/// Archive window ending two days before `today` (archive lag) and spanning 365 days.
pub fn archive_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = today - chrono::Duration::days(2);
    let start = end - chrono::Duration::days(365);
    (start, end)
}

// --- Client ---

#[derive(Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    forecast_url: String,
    archive_url: String,
    max_retries: u32,
    retry_base: Duration,
}

impl OpenMeteoClient {
    pub fn new() -> Result<Self, OpenMeteoError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            forecast_url: FORECAST_URL.to_string(),
            archive_url: ARCHIVE_URL.to_string(),
            max_retries: MAX_RETRIES,
            retry_base: RETRY_BASE,
        })
    }

    /// Point both endpoints somewhere else (self-hosted Open-Meteo, tests).
    pub fn with_base_urls(mut self, forecast: impl Into<String>, archive: impl Into<String>) -> Self {
        self.forecast_url = forecast.into();
        self.archive_url = archive.into();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base = base;
        self
    }

    /// GET with retries on transport errors and 5xx responses.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, OpenMeteoError> {
        let mut attempt = 0;
        loop {
            let result = self.http.get(url).query(params).send().await;
            let retryable = match result {
                Ok(resp) if resp.status().is_success() => {
                    let body = resp.text().await?;
                    return serde_json::from_str(&body)
                        .map_err(|e| OpenMeteoError::Decode(e.to_string()));
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    let err = OpenMeteoError::Api { status, message };
                    if status < 500 {
                        return Err(err);
                    }
                    err
                }
                Err(e) => OpenMeteoError::from(e),
            };

            if attempt >= self.max_retries {
                return Err(retryable);
            }
            let backoff = self.retry_base * 2u32.pow(attempt);
            let jitter = Duration::from_millis(rand::rng().random_range(0..100));
            warn!(
                url,
                attempt = attempt + 1,
                backoff_ms = backoff.as_millis() as u64,
                error = %retryable,
                "Open-Meteo request failed, retrying after backoff"
            );
            tokio::time::sleep(backoff + jitter).await;
            attempt += 1;
        }
    }

    pub async fn forecast(&self, lat: f64, lon: f64) -> Result<ForecastResponse, OpenMeteoError> {
        let params = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            (
                "hourly",
                "temperature_2m,precipitation_probability,wind_speed_10m".to_string(),
            ),
            (
                "daily",
                "temperature_2m_max,temperature_2m_min,precipitation_sum".to_string(),
            ),
            ("timezone", TIMEZONE.to_string()),
            ("forecast_days", "1".to_string()),
        ];
        self.get_json(&self.forecast_url, &params).await
    }

    pub async fn archive(
        &self,
        lat: f64,
        lon: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ArchiveResponse, OpenMeteoError> {
        let params = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            (
                "daily",
                "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max"
                    .to_string(),
            ),
            ("timezone", TIMEZONE.to_string()),
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ];
        self.get_json(&self.archive_url, &params).await
    }

    /// Readings for the current local hour. `now_hour` is 0-23 in Sri Lanka time.
    pub async fn current_conditions(
        &self,
        lat: f64,
        lon: f64,
        now_hour: u32,
    ) -> Result<CurrentConditions, OpenMeteoError> {
        let resp = self.forecast(lat, lon).await?;
        current_from_forecast(&resp, now_hour)
            .ok_or_else(|| OpenMeteoError::NoData(format!("no hourly forecast for ({lat}, {lon})")))
    }

    /// Monthly climate over the past year.
    pub async fn monthly_climate(
        &self,
        lat: f64,
        lon: f64,
        today: NaiveDate,
    ) -> Result<BTreeMap<Month, MonthlyWeather>, OpenMeteoError> {
        let (start, end) = archive_window(today);
        let resp = self.archive(lat, lon, start, end).await?;
        let days = resp
            .daily
            .as_ref()
            .map(daily_observations)
            .unwrap_or_default();
        debug!(lat, lon, days = days.len(), "Archive days fetched");
        if days.is_empty() {
            return Err(OpenMeteoError::NoData(format!(
                "no archive days for ({lat}, {lon})"
            )));
        }
        Ok(aggregate_monthly(&days))
    }
}
