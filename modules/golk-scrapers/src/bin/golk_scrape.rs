use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use golk_scrapers::areas::{default_areas, district_area_pairs};
use golk_scrapers::destinations::{self, DestinationScraper};
use golk_scrapers::distance::DistanceMatrixClient;
use golk_scrapers::maps::{self, TinyUrl};
use golk_scrapers::places::PlacesClient;
use golk_scrapers::sitemap::{self, SitemapDownloader};
use golk_scrapers::{output, BrowserlessFetcher, HttpFetcher, ListingKind, MapsScraper};

#[derive(Parser)]
#[command(name = "golk-scrape", about = "Collect source CSVs for the GoLK travel graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hotels per area from Google Maps
    Hotels(MapsArgs),
    /// Restaurants per area from Google Maps
    Restaurants(MapsArgs),
    /// Police stations per area from Google Maps
    Police(MapsArgs),
    /// Driving distance for every pair of areas
    Distances {
        #[arg(long, env = "GOOGLE_MAPS_API_KEY")]
        api_key: String,
        #[arg(long, value_delimiter = ',')]
        areas: Vec<String>,
        #[arg(long, default_value = "driving_distances.csv")]
        output: PathBuf,
    },
    /// Tourist attractions per district area from Google Places
    Places {
        #[arg(long, env = "GOOGLE_MAPS_API_KEY")]
        api_key: String,
        #[arg(long, default_value = "all_tourist_attractions.csv")]
        output: PathBuf,
    },
    /// TripAdvisor attraction listings
    Destinations {
        #[arg(long, default_value = destinations::DEFAULT_BASE_URL)]
        base_url: String,
        #[arg(long, default_value_t = 5)]
        pages: usize,
        #[arg(long, default_value = "sri_lanka_tourist_destinations.csv")]
        output: PathBuf,
    },
    /// Download and unpack the Booking.com hotel sitemap files
    Sitemap {
        #[arg(long, default_value = sitemap::DEFAULT_SITEMAP_URL)]
        url: String,
        /// JSON file with `headers` and `cookies`; refreshed cookies are written back
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
        #[arg(long, default_value = "./temp")]
        output_dir: PathBuf,
        #[arg(long, default_value_t = 5)]
        delay_secs: u64,
    },
}

#[derive(Args)]
struct MapsArgs {
    #[arg(long, env = "BROWSERLESS_URL")]
    browserless_url: String,
    #[arg(long, env = "BROWSERLESS_TOKEN")]
    browserless_token: Option<String>,
    /// Comma-separated areas (defaults to the built-in list)
    #[arg(long, value_delimiter = ',')]
    areas: Vec<String>,
    #[arg(long)]
    max: Option<usize>,
    /// Shorten map links through TinyURL
    #[arg(long)]
    shorten: bool,
    #[arg(long, default_value_t = 3)]
    area_delay_secs: u64,
    #[arg(long)]
    output: Option<PathBuf>,
}

fn areas_or_default(areas: Vec<String>) -> Vec<String> {
    if areas.is_empty() {
        default_areas()
    } else {
        areas
    }
}

fn maps_scraper(args: &MapsArgs) -> Result<MapsScraper> {
    let fetcher = BrowserlessFetcher::new(&args.browserless_url, args.browserless_token.as_deref())?
        .wait_for(maps::RESULT_CARD_SELECTOR, 20_000);
    let mut scraper = MapsScraper::new(Arc::new(fetcher))
        .with_area_delay(Duration::from_secs(args.area_delay_secs));
    if args.shorten {
        scraper = scraper.with_shortener(Arc::new(TinyUrl::new(reqwest::Client::new())));
    }
    Ok(scraper)
}

async fn run_listings(kind: ListingKind, args: MapsArgs, default_output: &str) -> Result<()> {
    let scraper = maps_scraper(&args)?;
    let areas = areas_or_default(args.areas);
    let rows = scraper
        .listings_for_areas(kind, &areas, args.max.unwrap_or(kind.default_max()))
        .await;
    let path = args.output.unwrap_or_else(|| default_output.into());
    output::write_listings(&path, kind, &rows)?;
    Ok(())
}

/// Added on top of `RUST_LOG`.
const LOG_DIRECTIVE: &str = "golk=info";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LOG_DIRECTIVE.parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Hotels(args) => run_listings(ListingKind::Hotels, args, "all_hotels.csv").await?,
        Command::Restaurants(args) => {
            run_listings(ListingKind::Restaurants, args, "all_restaurants.csv").await?
        }
        Command::Police(args) => {
            let scraper = maps_scraper(&args)?;
            let areas = areas_or_default(args.areas);
            let rows = scraper.police_for_areas(&areas, args.max.unwrap_or(20)).await;
            if rows.is_empty() {
                tracing::warn!("No police stations found");
            } else {
                let path = args.output.unwrap_or_else(|| "police_stations.csv".into());
                output::write_rows(&path, &rows)?;
            }
        }
        Command::Distances { api_key, areas, output } => {
            let client = DistanceMatrixClient::new(reqwest::Client::new(), &api_key);
            let rows = client.all_pairs(&areas_or_default(areas)).await;
            output::write_rows(&output, &rows)?;
        }
        Command::Places { api_key, output } => {
            let client = PlacesClient::new(reqwest::Client::new(), &api_key);
            let rows = client.attractions_for(&district_area_pairs()).await;
            output::write_rows(&output, &rows)?;
        }
        Command::Destinations { base_url, pages, output } => {
            let fetcher = HttpFetcher::new("https://www.tripadvisor.com/")?;
            let rows = DestinationScraper::new(&fetcher).scrape(&base_url, pages).await;
            if rows.is_empty() {
                tracing::warn!("No attractions scraped");
            } else {
                output::write_rows(&output, &rows)?;
            }
        }
        Command::Sitemap {
            url,
            config,
            output_dir,
            delay_secs,
        } => {
            let downloader = SitemapDownloader::new(&config)?
                .with_download_delay(Duration::from_secs(delay_secs));
            let files = downloader.download_all(&url, &output_dir).await?;
            tracing::info!(files = files.len(), "Sitemap download complete");
        }
    }

    Ok(())
}
