use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use golk_common::{Month, MonthSelector};
use golk_graph::{WeatherReader, WeatherRecord};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::error_json;
use crate::{AppState, WeatherServices};

/// Read side of `/weather/{month}`.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn weather(&self, selector: MonthSelector) -> Result<Vec<WeatherRecord>>;
}

#[async_trait]
impl WeatherLookup for WeatherReader {
    async fn weather(&self, selector: MonthSelector) -> Result<Vec<WeatherRecord>> {
        Ok(match selector {
            MonthSelector::Month(m) => self.weather_for_month(m).await?,
            MonthSelector::All => self.weather_all_months().await?,
        })
    }
}

#[derive(Deserialize)]
pub struct AreasQuery {
    areas: Option<String>,
}

/// Comma-separated, trimmed, blanks dropped. Empty means every area.
pub fn parse_areas(raw: Option<&str>) -> Option<Vec<String>> {
    let areas: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    (!areas.is_empty()).then_some(areas)
}

fn services(state: &AppState) -> Result<&WeatherServices, Response> {
    state.weather.as_ref().ok_or_else(|| {
        error_json(
            StatusCode::SERVICE_UNAVAILABLE,
            "Weather services are not configured",
        )
    })
}

pub async fn weather_by_month(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
) -> Response {
    let services = match services(&state) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let selector: MonthSelector = match month.parse() {
        Ok(s) => s,
        Err(e) => return error_json(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match services.lookup.weather(selector).await {
        Ok(records) if records.is_empty() => error_json(
            StatusCode::NOT_FOUND,
            format!("No weather data found for {selector}"),
        ),
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            warn!(error = %e, month = %selector, "Failed to load weather");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load weather")
        }
    }
}

pub async fn update_month(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
    Query(params): Query<AreasQuery>,
) -> Response {
    let services = match services(&state) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let month: Month = match month.parse() {
        Ok(m) => m,
        Err(e) => return error_json(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let areas = parse_areas(params.areas.as_deref());

    let updater = services.updater.clone();
    let requested = areas.clone();
    tokio::spawn(async move {
        match updater
            .update_month(month, requested.as_deref(), Utc::now())
            .await
        {
            Ok(outcome) => info!(
                month = %month,
                selected = outcome.areas_selected,
                linked = outcome.linked,
                refreshed = outcome.refreshed,
                "Month update finished"
            ),
            Err(e) => error!(error = %e, month = %month, "Month update failed"),
        }
    });

    Json(json!({
        "message": format!("Weather update for {month} started in the background"),
        "month": month.name(),
        "areas": areas,
    }))
    .into_response()
}

pub async fn scheduler_status(State(state): State<Arc<AppState>>) -> Response {
    match services(&state) {
        Ok(s) => Json(s.scheduler.status()).into_response(),
        Err(resp) => resp,
    }
}

pub async fn scheduler_refresh(State(state): State<Arc<AppState>>) -> Response {
    let services = match services(&state) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let scheduler = services.scheduler.clone();
    tokio::spawn(async move {
        match scheduler.force_refresh().await {
            Ok(outcome) => info!(
                planned = outcome.planned,
                succeeded = outcome.succeeded,
                "Forced weather refresh finished"
            ),
            Err(e) => error!(error = %e, "Forced weather refresh failed"),
        }
    });

    Json(json!({ "message": "Weather refresh started in the background" })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_are_split_and_trimmed() {
        assert_eq!(
            parse_areas(Some(" Kandy, Ella ,,Galle")),
            Some(vec!["Kandy".to_string(), "Ella".into(), "Galle".into()])
        );
    }

    #[test]
    fn blank_areas_mean_all() {
        assert_eq!(parse_areas(None), None);
        assert_eq!(parse_areas(Some(" , ")), None);
    }
}
