use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::GolkError;

/// Application configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: Option<String>,

    // LLM
    pub openai_api_key: String,
    pub deployment_name: String,
    pub openai_base_url: Option<String>,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Weather updater
    pub weather_batch_size: usize,
    pub weather_update_interval_hours: f64,
    pub scheduler_interval_minutes: u64,
    pub weather_scheduler_enabled: bool,
    pub coordinates_csv: PathBuf,

    // Chat pipeline
    pub query_examples_path: PathBuf,

    // Scraping
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub google_maps_api_key: Option<String>,
}

/// One year. Longer staleness windows never refresh anything.
const MAX_UPDATE_INTERVAL_HOURS: f64 = 24.0 * 366.0;

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, GolkError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GolkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, GolkError> {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| GolkError::Config(format!("{key} environment variable is required")))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let weather_update_interval_hours: f64 = parse_or(&lookup, "WEATHER_UPDATE_INTERVAL", 2.0)?;
        if !(weather_update_interval_hours > 0.0
            && weather_update_interval_hours <= MAX_UPDATE_INTERVAL_HOURS)
        {
            return Err(GolkError::Config(format!(
                "WEATHER_UPDATE_INTERVAL must be between 0 and {MAX_UPDATE_INTERVAL_HOURS} hours, got {weather_update_interval_hours}"
            )));
        }

        Ok(Self {
            neo4j_uri: required("NEO4J_URI")?,
            neo4j_user: required("NEO4J_USER")?,
            neo4j_password: required("NEO4J_PASSWORD")?,
            neo4j_database: optional("NEO4J_DATABASE"),
            openai_api_key: required("OPENAI_API_KEY")?,
            deployment_name: optional("DEPLOYMENT_NAME")
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            openai_base_url: optional("OPENAI_BASE_URL"),
            api_host: optional("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: parse_or(&lookup, "API_PORT", 8000)?,
            weather_batch_size: parse_or(&lookup, "WEATHER_BATCH_SIZE", 58)?,
            weather_update_interval_hours,
            scheduler_interval_minutes: parse_or(&lookup, "SCHEDULER_INTERVAL_MINUTES", 2)?,
            weather_scheduler_enabled: parse_or(&lookup, "WEATHER_SCHEDULER_ENABLED", true)?,
            coordinates_csv: optional("COORDINATES_CSV")
                .unwrap_or_else(|| "data/Coordinates.csv".to_string())
                .into(),
            query_examples_path: optional("QUERY_EXAMPLES_PATH")
                .unwrap_or_else(|| "data/query_examples.json".to_string())
                .into(),
            browserless_url: optional("BROWSERLESS_URL"),
            browserless_token: optional("BROWSERLESS_TOKEN"),
            google_maps_api_key: optional("GOOGLE_MAPS_API_KEY"),
        })
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().take(5).map(char::len_utf8).sum::<usize>();
            format!("{}...({} chars)", &val[..n], val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  NEO4J_URI: {}", self.neo4j_uri);
        tracing::info!("  NEO4J_PASSWORD: {}", preview(&self.neo4j_password));
        tracing::info!("  OPENAI_API_KEY: {}", preview(&self.openai_api_key));
        tracing::info!("  DEPLOYMENT_NAME: {}", self.deployment_name);
        tracing::info!("  BROWSERLESS_TOKEN: {}", preview_opt(&self.browserless_token));
        tracing::info!("  GOOGLE_MAPS_API_KEY: {}", preview_opt(&self.google_maps_api_key));
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, GolkError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| GolkError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}
