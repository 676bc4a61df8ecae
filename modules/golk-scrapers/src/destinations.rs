//! TripAdvisor attraction listing pages.

use std::time::Duration;

use rand::Rng;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{info, warn};

use crate::fetcher::PageFetcher;

pub const DEFAULT_BASE_URL: &str = "https://www.tripadvisor.com/Attractions-g293961-Activities";
const PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Rating")]
    pub rating: String,
}

/// `{base}-oa{offset}-Sri_Lanka.html` for offsets `0, 30, ...`.
pub fn page_urls(base_url: &str, pages: usize) -> Vec<String> {
    (0..pages)
        .map(|p| format!("{base_url}-oa{}-Sri_Lanka.html", p * PAGE_SIZE))
        .collect()
}

/// Items need both a name and a location.
pub fn parse_destinations(html: &str) -> Vec<Destination> {
    let document = Html::parse_document(html);
    let item_sel = Selector::parse("div.attraction_element").unwrap();
    let name_sel = Selector::parse("div.listing_title").unwrap();
    let location_sel = Selector::parse("div.address").unwrap();
    let rating_sel = Selector::parse("span.ui_bubble_rating").unwrap();

    document
        .select(&item_sel)
        .filter_map(|item| {
            let name = item.select(&name_sel).next()?;
            let location = item.select(&location_sel).next()?;
            let rating = item
                .select(&rating_sel)
                .next()
                .and_then(|r| r.value().attr("alt"))
                .unwrap_or("No rating");
            Some(Destination {
                name: name.text().collect::<String>().trim().to_string(),
                location: location.text().collect::<String>().trim().to_string(),
                rating: rating.to_string(),
            })
        })
        .collect()
}

pub struct DestinationScraper<'a> {
    fetcher: &'a dyn PageFetcher,
    min_delay: Duration,
    max_delay: Duration,
}

impl<'a> DestinationScraper<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher) -> Self {
        Self {
            fetcher,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(5),
        }
    }

    pub fn with_delay_range(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min;
        self.max_delay = max.max(min);
        self
    }

    fn jitter(&self) -> Duration {
        let (lo, hi) = (self.min_delay.as_millis() as u64, self.max_delay.as_millis() as u64);
        if hi <= lo {
            return self.min_delay;
        }
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }

    /// Scrape `pages` listing pages. A page that fails to load counts as empty.
    pub async fn scrape(&self, base_url: &str, pages: usize) -> Vec<Destination> {
        let mut all = Vec::new();
        for url in page_urls(base_url, pages) {
            tokio::time::sleep(self.jitter()).await;
            info!(url, "Scraping attractions page");
            match self.fetcher.fetch(&url).await {
                Ok(html) => {
                    let found = parse_destinations(&html);
                    info!(url, count = found.len(), "Attractions parsed");
                    all.extend(found);
                }
                Err(e) => warn!(url, error = %e, "Failed to fetch page"),
            }
        }
        all
    }
}
