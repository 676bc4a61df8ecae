//! Tourist attractions from the Google Places text search API.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
/// A `next_page_token` only becomes valid a short while after it is issued.
const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);

const OUTDOOR_TYPES: &[&str] = &[
    "park",
    "natural_feature",
    "waterfall",
    "hiking_area",
    "mountain",
    "zoo",
    "garden",
];
const INDOOR_TYPES: &[&str] = &[
    "museum",
    "art_gallery",
    "shopping_mall",
    "aquarium",
    "theater",
    "library",
    "church",
    "temple",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivityType {
    Outdoor,
    Indoor,
}

/// First recognised type wins; unrecognised places default to outdoor.
pub fn classify_activity(types: &[String]) -> ActivityType {
    types
        .iter()
        .find_map(|t| {
            if OUTDOOR_TYPES.contains(&t.as_str()) {
                Some(ActivityType::Outdoor)
            } else if INDOOR_TYPES.contains(&t.as_str()) {
                Some(ActivityType::Indoor)
            } else {
                None
            }
        })
        .unwrap_or(ActivityType::Outdoor)
}

pub fn place_link(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    place_id: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttractionRow {
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Place to Visit")]
    pub place: String,
    #[serde(rename = "Activity Type")]
    pub activity_type: ActivityType,
    #[serde(rename = "Google Map Link")]
    pub link: String,
}

fn rows_from(district: &str, area: &str, results: Vec<PlaceResult>) -> Vec<AttractionRow> {
    results
        .into_iter()
        .map(|p| AttractionRow {
            district: district.to_string(),
            area: area.to_string(),
            activity_type: classify_activity(&p.types),
            link: place_link(&p.place_id),
            place: p.name,
        })
        .collect()
}

pub struct PlacesClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    page_delay: Duration,
}

impl PlacesClient {
    pub fn new(http: reqwest::Client, api_key: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: TEXT_SEARCH_URL.to_string(),
            page_delay: PAGE_TOKEN_DELAY,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    async fn text_search(&self, query: &str, page_token: Option<&str>) -> Result<TextSearchResponse> {
        let mut params = vec![("query", query), ("key", self.api_key.as_str())];
        if let Some(token) = page_token {
            params.push(("pagetoken", token));
        }
        let body: TextSearchResponse = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body),
            other => anyhow::bail!(
                "Places status {other}: {}",
                body.error_message.as_deref().unwrap_or_default()
            ),
        }
    }

    /// All pages of `tourist attractions in {area}, {district}`.
    pub async fn attractions(&self, district: &str, area: &str) -> Result<Vec<AttractionRow>> {
        let query = format!("tourist attractions in {area}, {district}");
        let mut page = self.text_search(&query, None).await?;
        let mut rows = Vec::new();
        loop {
            rows.extend(rows_from(district, area, std::mem::take(&mut page.results)));
            let Some(token) = page.next_page_token.take() else {
                break;
            };
            tokio::time::sleep(self.page_delay).await;
            page = self.text_search(&query, Some(&token)).await?;
        }
        Ok(rows)
    }

    /// Attractions for every `(district, area)`; failures are logged and skipped.
    pub async fn attractions_for(&self, areas: &[(String, String)]) -> Vec<AttractionRow> {
        let mut all = Vec::new();
        for (district, area) in areas {
            info!(district, area, "Searching attractions");
            match self.attractions(district, area).await {
                Ok(rows) => all.extend(rows),
                Err(e) => warn!(district, area, error = %e, "Attraction search failed"),
            }
        }
        all
    }
}
