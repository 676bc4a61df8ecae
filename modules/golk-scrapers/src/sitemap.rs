//! Booking.com sitemap index: discover, download and unpack the hotel dumps.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_SITEMAP_URL: &str = "https://www.booking.com/sitembk-hotel-index.xml";
pub const COOKIE_ORIGIN: &str = "https://www.booking.com";
const MIN_SITEMAP_LEN: usize = 100;

/// Headers and cookies replayed on every request, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session config {}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Merge `cookies` into the stored set and rewrite the file.
    pub fn save_cookies(path: &Path, cookies: BTreeMap<String, String>) -> Result<()> {
        let mut config = Self::load(path)?;
        config.cookies.extend(cookies);
        fs::write(path, serde_json::to_string_pretty(&config)?)?;
        Ok(())
    }

    fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
        Ok(headers)
    }
}

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x1f, 0x8b])
}

/// Gunzip when the payload is gzip, otherwise pass it through.
pub fn maybe_gunzip(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !is_gzip(&bytes) {
        return Ok(bytes);
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes.as_slice()).read_to_end(&mut out)?;
    Ok(out)
}

pub fn validate_sitemap(content: &str) -> Result<()> {
    if content.trim().len() < MIN_SITEMAP_LEN {
        anyhow::bail!("Sitemap content appears to be empty or too short");
    }
    if !content.contains("<?xml") {
        debug!(preview = %content.chars().take(500).collect::<String>(), "Not XML");
        anyhow::bail!("Invalid sitemap format");
    }
    Ok(())
}

/// Text of the first child element of every top-level entry.
pub fn parse_sitemap(content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(content.trim());
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut depth = 0usize;
    let mut first_child_seen = false;
    let mut capturing = false;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                depth += 1;
                match depth {
                    2 => first_child_seen = false,
                    3 if !first_child_seen => {
                        first_child_seen = true;
                        capturing = true;
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(_) if depth == 2 => first_child_seen = true,
            Event::Text(t) if capturing => text.push_str(&t.unescape()?),
            Event::CData(c) if capturing => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::End(_) => {
                if depth == 3 && capturing {
                    capturing = false;
                    if !text.is_empty() {
                        urls.push(std::mem::take(&mut text));
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if urls.is_empty() {
        anyhow::bail!("No URLs found in sitemap");
    }
    if !urls.iter().any(|u| is_english_us(u)) {
        warn!("No English (US) URLs found in sitemap");
    }
    info!(count = urls.len(), "Parsed sitemap");
    Ok(urls)
}

fn is_english_us(url: &str) -> bool {
    url.contains("en-us") || url.contains("en_us")
}

pub fn english_us_urls(urls: &[String]) -> Vec<String> {
    urls.iter().filter(|u| u.contains("en-us")).cloned().collect()
}

/// Output path for a downloaded archive with its `.gz` suffix removed.
pub fn extracted_name(url: &str) -> Result<String> {
    let name = url
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow::anyhow!("URL has no file name: {url}"))?;
    Ok(name.strip_suffix(".gz").unwrap_or(name).to_string())
}

/// Write `bytes` as `{dir}/{name}.gz`, unpack it next to itself, then delete the archive.
pub fn unpack_into(dir: &Path, url: &str, bytes: &[u8]) -> Result<PathBuf> {
    let name = extracted_name(url)?;
    let gz_path = dir.join(format!("{name}.gz"));
    let out_path = dir.join(&name);

    fs::write(&gz_path, bytes)?;
    {
        let mut decoder = GzDecoder::new(File::open(&gz_path)?);
        let mut out = File::create(&out_path)?;
        io::copy(&mut decoder, &mut out)
            .with_context(|| format!("Failed to gunzip {}", gz_path.display()))?;
    }
    fs::remove_file(&gz_path)?;
    Ok(out_path)
}

pub struct SitemapDownloader {
    http: reqwest::Client,
    jar: Arc<Jar>,
    config_path: PathBuf,
    download_delay: Duration,
}

impl SitemapDownloader {
    pub fn new(config_path: &Path) -> Result<Self> {
        let config = SessionConfig::load(config_path)?;
        let origin = Url::parse(COOKIE_ORIGIN)?;
        let jar = Arc::new(Jar::default());
        for (name, value) in &config.cookies {
            jar.add_cookie_str(&format!("{name}={value}"), &origin);
        }
        let http = reqwest::Client::builder()
            .default_headers(config.header_map()?)
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            jar,
            config_path: config_path.to_path_buf(),
            download_delay: Duration::from_secs(5),
        })
    }

    pub fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Failed to fetch {url}: HTTP {status}");
        }
        Ok(resp.bytes().await?.to_vec())
    }

    fn persist_cookies(&self) -> Result<()> {
        let origin = Url::parse(COOKIE_ORIGIN)?;
        let Some(header) = self.jar.cookies(&origin) else {
            return Ok(());
        };
        let cookies = parse_cookie_header(header.to_str()?);
        SessionConfig::save_cookies(&self.config_path, cookies)
    }

    pub async fn fetch_sitemap(&self, url: &str) -> Result<Vec<String>> {
        info!(url, "Fetching sitemap");
        let bytes = self.get_bytes(url).await?;
        self.persist_cookies()?;
        let content = String::from_utf8(maybe_gunzip(bytes)?)?;
        validate_sitemap(&content)?;
        parse_sitemap(&content)
    }

    /// Download every English (US) archive sequentially into `output_dir`.
    pub async fn download_all(&self, sitemap_url: &str, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let urls = english_us_urls(&self.fetch_sitemap(sitemap_url).await?);
        if urls.is_empty() {
            anyhow::bail!("No English (US) URLs found");
        }
        fs::create_dir_all(output_dir)?;
        info!(count = urls.len(), "Downloading sitemap files");

        let mut written = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.download_delay).await;
            }
            let bytes = self.get_bytes(url).await?;
            let path = unpack_into(output_dir, url, &bytes)?;
            debug!(path = %path.display(), "Extracted");
            written.push(path);
        }
        info!(files = written.len(), "All files downloaded and extracted");
        Ok(written)
    }
}

fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
