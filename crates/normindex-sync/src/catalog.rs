//! Catalog of importable codes, fetched from the site's table of contents
//! feed and cached with a TTL.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const FEED_PATH: &str = "gii-toc.xml";
const CACHE_TTL_HOURS: i64 = 24;
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch catalog: {0}")]
    Fetch(String),

    #[error("failed to parse catalog: {0}")]
    Parse(String),
}

/// One importable code from the remote catalog feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub title: String,
    pub url: String,
}

/// Remote source of the raw catalog feed.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_feed(&self) -> Result<Vec<u8>, CatalogError>;
}

/// Catalog feed source backed by gesetze-im-internet.de.
pub struct GiiCatalogSource {
    client: reqwest::Client,
    url: String,
}

impl GiiCatalogSource {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| CatalogError::Fetch(err.to_string()))?;
        Ok(Self {
            client,
            url: format!("{}/{FEED_PATH}", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CatalogSource for GiiCatalogSource {
    async fn fetch_feed(&self) -> Result<Vec<u8>, CatalogError> {
        info!(url = %self.url, "fetching catalog feed");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| CatalogError::Fetch(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Fetch(format!(
                "catalog source returned {status} for {}",
                self.url
            )));
        }
        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|err| CatalogError::Fetch(err.to_string()))
    }
}

/// Parse the catalog feed into entries.
///
/// Items with a missing title or link, or whose link does not follow the
/// `…/{code}/xml.zip` pattern, are skipped individually; a malformed
/// entry never aborts the whole fetch.
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<CatalogEntry>, CatalogError> {
    let text =
        std::str::from_utf8(bytes).map_err(|err| CatalogError::Parse(err.to_string()))?;
    let doc =
        roxmltree::Document::parse(text).map_err(|err| CatalogError::Parse(err.to_string()))?;

    let mut entries = Vec::new();
    for item in doc.descendants().filter(|n| n.has_tag_name("item")) {
        let title = item
            .children()
            .find(|c| c.has_tag_name("title"))
            .and_then(|c| c.text())
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let url = item
            .children()
            .find(|c| c.has_tag_name("link"))
            .and_then(|c| c.text())
            .map(str::trim)
            .filter(|u| !u.is_empty());

        let (Some(title), Some(url)) = (title, url) else {
            warn!("skipping catalog item with missing title or link");
            continue;
        };
        let Some(code) = code_from_url(url) else {
            warn!(url, "could not extract code from catalog url");
            continue;
        };

        entries.push(CatalogEntry {
            code: code.to_string(),
            title: title.to_string(),
            url: url.to_string(),
        });
    }

    info!(count = entries.len(), "parsed catalog feed");
    Ok(entries)
}

/// Extract the code from a catalog URL like
/// `https://www.gesetze-im-internet.de/bgb/xml.zip`.
fn code_from_url(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.gesetze-im-internet.de/")?;
    let code = rest.strip_suffix("/xml.zip")?;
    (!code.is_empty() && !code.contains('/')).then_some(code)
}

struct Snapshot {
    entries: Arc<Vec<CatalogEntry>>,
    fetched_at: DateTime<Utc>,
}

/// TTL-cached view of the importable-code catalog.
///
/// The cache holds the last-fetched entry list and its timestamp and is
/// replaced atomically as a pair. Two callers observing an expired cache
/// at the same time at worst fetch twice; the last writer wins.
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    ttl: Duration,
    cache: RwLock<Option<Snapshot>>,
}

impl CatalogService {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self::with_ttl(source, Duration::hours(CACHE_TTL_HOURS))
    }

    pub fn with_ttl(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Cached entries when fresh, otherwise fetch-and-parse and replace
    /// the cache.
    pub async fn get_catalog(&self) -> Result<Arc<Vec<CatalogEntry>>, CatalogError> {
        {
            let cache = self.cache.read().await;
            if let Some(snapshot) = cache.as_ref()
                && Utc::now().signed_duration_since(snapshot.fetched_at) < self.ttl
            {
                debug!("using cached catalog");
                return Ok(Arc::clone(&snapshot.entries));
            }
        }

        let feed = self.source.fetch_feed().await?;
        let entries = Arc::new(parse_catalog(&feed)?);
        *self.cache.write().await = Some(Snapshot {
            entries: Arc::clone(&entries),
            fetched_at: Utc::now(),
        });
        Ok(entries)
    }

    /// Whether a code exists in the catalog. Exact, case-sensitive match.
    /// A fetch failure propagates: "unknown", not "invalid".
    pub async fn is_valid_code(&self, code: &str) -> Result<bool, CatalogError> {
        let catalog = self.get_catalog().await?;
        Ok(catalog.iter().any(|entry| entry.code == code))
    }
}
