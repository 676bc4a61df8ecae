//! Google Maps search-result scrapers (hotels, restaurants, police stations).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{info, warn};

use crate::fetcher::{with_retry, PageFetcher};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
const TINYURL_API: &str = "https://tinyurl.com/api-create.php";
const FETCH_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

pub const RESULT_CARD_SELECTOR: &str = "div.Nv2PK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Hotels,
    Restaurants,
}

impl ListingKind {
    pub fn query(self, area: &str) -> String {
        match self {
            Self::Hotels => format!("hotels in {area}"),
            Self::Restaurants => format!("restaurants in {area}"),
        }
    }

    /// Name of the CSV column holding the listing name.
    pub fn column(self) -> &'static str {
        match self {
            Self::Hotels => "hotel",
            Self::Restaurants => "restaurant",
        }
    }

    pub fn default_max(self) -> usize {
        match self {
            Self::Hotels => 10,
            Self::Restaurants => 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub area: String,
    pub name: String,
    pub rating: String,
    pub link: String,
}

impl Listing {
    pub fn record(&self) -> [&str; 4] {
        [&self.area, &self.name, &self.rating, &self.link]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoliceStation {
    pub name: String,
    pub address: String,
    pub area: String,
}

pub fn search_url(query: &str) -> String {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|t| urlencoding::encode(t).into_owned())
        .collect();
    format!("{MAPS_SEARCH_URL}{}", terms.join("+"))
}

pub fn police_query(area: &str) -> String {
    format!("police station in {area}, Sri Lanka")
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(el: ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .map(text_of)
        .find(|t| !t.is_empty())
}

/// Parse listing cards from a rendered results page. Names are deduplicated,
/// missing ratings become `N/A`.
pub fn parse_listings(html: &str, area: &str, max: usize) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let card = Selector::parse(r#"div[jsaction*="mouseover:pane"], div.Nv2PK"#).unwrap();
    let name_sel = Selector::parse(".fontHeadlineSmall").unwrap();
    let rating_sel = Selector::parse("span.fontBodyMedium > span, span.MW4etd").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();

    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for element in document.select(&card) {
        if listings.len() >= max {
            break;
        }
        let Some(name) = first_text(element, &name_sel) else {
            continue;
        };
        if !seen.insert(name.clone()) {
            continue;
        }
        let rating = first_text(element, &rating_sel).unwrap_or_else(|| "N/A".to_string());
        let link = element
            .select(&link_sel)
            .filter_map(|a| a.value().attr("href"))
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| "N/A".to_string());

        listings.push(Listing {
            area: area.to_string(),
            name,
            rating,
            link,
        });
    }
    listings
}

/// Parse police station cards. The address is the first `·` segment of the
/// second detail line.
pub fn parse_police(html: &str, area: &str, max: usize) -> Vec<PoliceStation> {
    let document = Html::parse_document(html);
    let card = Selector::parse(RESULT_CARD_SELECTOR).unwrap();
    let name_sel = Selector::parse(".fontHeadlineSmall").unwrap();
    let detail_sel = Selector::parse("div.W4Efsd").unwrap();

    document
        .select(&card)
        .filter_map(|element| {
            let name = first_text(element, &name_sel)?;
            let address = element
                .select(&detail_sel)
                .map(text_of)
                .filter(|t| !t.is_empty())
                .nth(1)
                .map(|line| line.split('·').next().unwrap_or("").trim().to_string())
                .unwrap_or_default();
            Some(PoliceStation {
                name,
                address,
                area: area.to_string(),
            })
        })
        .take(max)
        .collect()
}

// --- Link shortening ---

#[async_trait]
pub trait LinkShortener: Send + Sync {
    async fn shorten(&self, url: &str) -> Result<String>;
}

pub struct TinyUrl {
    http: reqwest::Client,
}

impl TinyUrl {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl LinkShortener for TinyUrl {
    async fn shorten(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(TINYURL_API)
            .query(&[("url", url)])
            .send()
            .await?
            .error_for_status()?;
        let short = resp.text().await?.trim().to_string();
        if !short.starts_with("http") {
            anyhow::bail!("unexpected TinyURL response: {short}");
        }
        Ok(short)
    }
}

// --- Scraper ---

pub struct MapsScraper {
    fetcher: Arc<dyn PageFetcher>,
    shortener: Option<Arc<dyn LinkShortener>>,
    area_delay: Duration,
}

impl MapsScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            shortener: None,
            area_delay: Duration::from_secs(3),
        }
    }

    pub fn with_shortener(mut self, shortener: Arc<dyn LinkShortener>) -> Self {
        self.shortener = Some(shortener);
        self
    }

    pub fn with_area_delay(mut self, delay: Duration) -> Self {
        self.area_delay = delay;
        self
    }

    async fn fetch_search(&self, query: &str) -> Result<String> {
        let url = search_url(query);
        with_retry(query, FETCH_ATTEMPTS, RETRY_DELAY, || self.fetcher.fetch(&url)).await
    }

    async fn shorten(&self, link: String) -> String {
        let Some(shortener) = &self.shortener else {
            return link;
        };
        if link == "N/A" {
            return link;
        }
        match shortener.shorten(&link).await {
            Ok(short) => short,
            Err(e) => {
                warn!(error = %e, "Link shortening failed, keeping original");
                link
            }
        }
    }

    pub async fn listings(&self, kind: ListingKind, area: &str, max: usize) -> Result<Vec<Listing>> {
        let html = self.fetch_search(&kind.query(area)).await?;
        let mut listings = parse_listings(&html, area, max);
        for listing in &mut listings {
            listing.link = self.shorten(std::mem::take(&mut listing.link)).await;
        }
        Ok(listings)
    }

    pub async fn police(&self, area: &str, max: usize) -> Result<Vec<PoliceStation>> {
        let html = self.fetch_search(&police_query(area)).await?;
        Ok(parse_police(&html, area, max))
    }

    /// Scrape every area in order; a failed area is logged and skipped.
    pub async fn listings_for_areas(
        &self,
        kind: ListingKind,
        areas: &[String],
        max: usize,
    ) -> Vec<Listing> {
        let mut all = Vec::new();
        for (i, area) in areas.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.area_delay).await;
            }
            info!(area, kind = kind.column(), "Scraping listings");
            match self.listings(kind, area, max).await {
                Ok(found) => {
                    info!(area, count = found.len(), "Listings found");
                    all.extend(found);
                }
                Err(e) => warn!(area, error = %e, "Failed to scrape area"),
            }
        }
        all
    }

    pub async fn police_for_areas(&self, areas: &[String], max: usize) -> Vec<PoliceStation> {
        let mut all = Vec::new();
        for (i, area) in areas.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.area_delay).await;
            }
            match self.police(area, max).await {
                Ok(found) => {
                    info!(area, count = found.len(), "Police stations found");
                    all.extend(found);
                }
                Err(e) => warn!(area, error = %e, "Failed to scrape police stations"),
            }
        }
        all
    }
}
