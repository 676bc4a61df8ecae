//! Pairwise driving distances from the Google Distance Matrix API.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DISTANCE_MATRIX_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    /// Meters.
    value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrivingDistance {
    pub text: String,
    pub km: f64,
}

/// One CSV row. Failed lookups carry `N/A` and an empty km column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceRow {
    #[serde(rename = "Location 1")]
    pub location_1: String,
    #[serde(rename = "Location 2")]
    pub location_2: String,
    #[serde(rename = "Driving Distance")]
    pub driving_distance: String,
    #[serde(rename = "Distance_in_KM")]
    pub distance_in_km: Option<f64>,
}

/// Every unordered pair `(i, j)` with `i < j`.
pub fn unordered_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

fn parse_matrix(body: MatrixResponse) -> Result<DrivingDistance> {
    if body.status != "OK" {
        anyhow::bail!(
            "Distance Matrix status {}: {}",
            body.status,
            body.error_message.unwrap_or_default()
        );
    }
    let element = body
        .rows
        .into_iter()
        .next()
        .and_then(|r| r.elements.into_iter().next())
        .ok_or_else(|| anyhow::anyhow!("empty Distance Matrix response"))?;
    if element.status != "OK" {
        anyhow::bail!("element status {}", element.status);
    }
    let distance = element
        .distance
        .ok_or_else(|| anyhow::anyhow!("element has no distance"))?;
    Ok(DrivingDistance {
        text: distance.text,
        km: (distance.value / 10.0).round() / 100.0,
    })
}

pub struct DistanceMatrixClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    pair_delay: Duration,
}

impl DistanceMatrixClient {
    pub fn new(http: reqwest::Client, api_key: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: DISTANCE_MATRIX_URL.to_string(),
            pair_delay: Duration::from_millis(100),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_pair_delay(mut self, delay: Duration) -> Self {
        self.pair_delay = delay;
        self
    }

    pub async fn driving_distance(&self, origin: &str, destination: &str) -> Result<DrivingDistance> {
        let body: MatrixResponse = self
            .http
            .get(&self.base_url)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("mode", "driving"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_matrix(body)
    }

    /// Distances for every unordered pair of `locations`.
    pub async fn all_pairs(&self, locations: &[String]) -> Vec<DistanceRow> {
        let mut rows = Vec::new();
        for (i, j) in unordered_pairs(locations.len()) {
            if !rows.is_empty() {
                tokio::time::sleep(self.pair_delay).await;
            }
            let (a, b) = (&locations[i], &locations[j]);
            let row = match self.driving_distance(a, b).await {
                Ok(d) => DistanceRow {
                    location_1: a.clone(),
                    location_2: b.clone(),
                    driving_distance: d.text,
                    distance_in_km: Some(d.km),
                },
                Err(e) => {
                    warn!(from = %a, to = %b, error = %e, "Distance lookup failed");
                    DistanceRow {
                        location_1: a.clone(),
                        location_2: b.clone(),
                        driving_distance: "N/A".to_string(),
                        distance_in_km: None,
                    }
                }
            };
            info!(from = %a, to = %b, distance = %row.driving_distance, "Processed pair");
            rows.push(row);
        }
        rows
    }
}
