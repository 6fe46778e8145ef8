use crate::error::{Result, ScanError};
use crate::transport::HttpTransport;
use serde::{Deserialize, Serialize};
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use sitemap::structs::Location;
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause before every nested sitemap fetch, to bound the request rate against the origin.
pub const NESTED_SITEMAP_DELAY: Duration = Duration::from_millis(500);

pub type ResolverProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapNode {
    /// `<sitemapindex>`: locations of child sitemaps.
    Index(Vec<String>),
    /// `<urlset>`: page locations, which may still point at nested sitemaps.
    UrlSet(Vec<String>),
}

impl SitemapNode {
    /// Parse a sitemap document. Malformed XML, an entry without a usable `<loc>`,
    /// or a document mixing `<sitemap>` and `<url>` entries is rejected as a whole.
    ///
    /// `<loc>` text may be plain or wrapped in CDATA. Locations come back in the
    /// normalized form of the `url` crate, not as the raw source text: the host is
    /// lowercased, an empty path becomes `/`, unsafe characters are percent-encoded
    /// and IDN hosts are punycoded.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut children = Vec::new();
        let mut entries = Vec::new();
        let xml = unwrap_cdata(xml);

        for entity in SiteMapReader::new(xml.as_bytes()) {
            match entity {
                SiteMapEntity::SiteMap(entry) => children.push(location_to_string(entry.loc)?),
                SiteMapEntity::Url(entry) => entries.push(location_to_string(entry.loc)?),
                SiteMapEntity::Err(error) => {
                    return Err(ScanError::Parse(format!("malformed sitemap XML: {:?}", error)));
                }
            }
        }

        match (children.is_empty(), entries.is_empty()) {
            (false, false) => Err(ScanError::Parse(
                "document mixes <sitemap> and <url> entries".to_string(),
            )),
            (false, true) => Ok(SitemapNode::Index(children)),
            _ => Ok(SitemapNode::UrlSet(entries)),
        }
    }

    pub fn locations(&self) -> &[String] {
        match self {
            SitemapNode::Index(children) => children,
            SitemapNode::UrlSet(entries) => entries,
        }
    }

    pub fn into_locations(self) -> Vec<String> {
        match self {
            SitemapNode::Index(children) => children,
            SitemapNode::UrlSet(entries) => entries,
        }
    }
}

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// `SiteMapReader` only collects plain character data, so CDATA sections are
/// rewritten as escaped text first. An unterminated section is left untouched
/// for the XML reader to reject.
fn unwrap_cdata(xml: &str) -> Cow<'_, str> {
    if !xml.contains(CDATA_OPEN) {
        return Cow::Borrowed(xml);
    }

    let mut unwrapped = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find(CDATA_OPEN) {
        unwrapped.push_str(&rest[..start]);
        let section = &rest[start + CDATA_OPEN.len()..];
        let Some(end) = section.find(CDATA_CLOSE) else {
            unwrapped.push_str(&rest[start..]);
            return Cow::Owned(unwrapped);
        };
        for c in section[..end].chars() {
            match c {
                '&' => unwrapped.push_str("&amp;"),
                '<' => unwrapped.push_str("&lt;"),
                '>' => unwrapped.push_str("&gt;"),
                _ => unwrapped.push(c),
            }
        }
        rest = &section[end + CDATA_CLOSE.len()..];
    }
    unwrapped.push_str(rest);
    Cow::Owned(unwrapped)
}

fn location_to_string(location: Location) -> Result<String> {
    match location {
        Location::Url(url) => Ok(url.to_string()),
        _ => Err(ScanError::Parse("entry without a valid <loc>".to_string())),
    }
}

/// Locations ending in `.xml` are always treated as nested sitemaps, never as pages.
/// A content page whose URL happens to end in `.xml` is misclassified; this is a known
/// approximation.
pub fn is_nested_sitemap(location: &str) -> bool {
    location.ends_with(".xml")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveStats {
    pub sitemaps_fetched: usize,
    pub sitemaps_failed: usize,
    /// References to a sitemap that was already visited in this run.
    pub sitemaps_skipped: usize,
    pub pages: usize,
}

enum WorkItem {
    Page(String),
    Sitemap { url: String, nested: bool },
}

impl WorkItem {
    fn from_location(location: String) -> Self {
        if is_nested_sitemap(&location) {
            WorkItem::Sitemap {
                url: location,
                nested: true,
            }
        } else {
            WorkItem::Page(location)
        }
    }
}

pub struct SitemapResolver {
    transport: Arc<dyn HttpTransport>,
    nested_delay: Duration,
    progress_callback: Option<ResolverProgressCallback>,
}

impl SitemapResolver {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            nested_delay: NESTED_SITEMAP_DELAY,
            progress_callback: None,
        }
    }

    pub fn with_nested_delay(mut self, delay: Duration) -> Self {
        self.nested_delay = delay;
        self
    }

    pub fn with_progress_callback(mut self, callback: ResolverProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Flatten the sitemap graph rooted at `root_url` into page URLs, in document order.
    /// Never fails: a sitemap that cannot be fetched or parsed contributes nothing.
    pub async fn resolve(&self, root_url: &str) -> Vec<String> {
        self.resolve_with_stats(root_url).await.0
    }

    pub async fn resolve_with_stats(&self, root_url: &str) -> (Vec<String>, ResolveStats) {
        info!("Resolving sitemap {}", root_url);

        let mut visited: HashSet<String> = HashSet::new();
        let mut pages = Vec::new();
        let mut stats = ResolveStats::default();

        // LIFO worklist; children are pushed in reverse so pops follow document order,
        // expanding nested sitemaps inline exactly where they are referenced.
        let mut worklist = vec![WorkItem::Sitemap {
            url: root_url.to_string(),
            nested: false,
        }];

        while let Some(item) = worklist.pop() {
            let (url, nested) = match item {
                WorkItem::Page(url) => {
                    pages.push(url);
                    continue;
                }
                WorkItem::Sitemap { url, nested } => (url, nested),
            };

            if !visited.insert(url.clone()) {
                debug!("Sitemap {} already visited, skipping", url);
                stats.sitemaps_skipped += 1;
                continue;
            }

            if nested && !self.nested_delay.is_zero() {
                tokio::time::sleep(self.nested_delay).await;
            }

            if let Some(ref callback) = self.progress_callback {
                callback(url.clone());
            }

            let node = match self.fetch_node(&url).await {
                Ok(node) => node,
                Err(e) => {
                    warn!("Skipping sitemap {}: {}", url, e);
                    stats.sitemaps_failed += 1;
                    continue;
                }
            };
            stats.sitemaps_fetched += 1;

            let kind = match node {
                SitemapNode::Index(_) => "index",
                SitemapNode::UrlSet(_) => "urlset",
            };
            debug!("Sitemap {} is a {} with {} locations", url, kind, node.locations().len());

            worklist.extend(node.into_locations().into_iter().rev().map(WorkItem::from_location));
        }

        stats.pages = pages.len();
        info!(
            "Resolved {} pages from {} sitemaps ({} failed)",
            stats.pages, stats.sitemaps_fetched, stats.sitemaps_failed
        );

        (pages, stats)
    }

    async fn fetch_node(&self, url: &str) -> Result<SitemapNode> {
        debug!("Fetching sitemap {}", url);

        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(ScanError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        SitemapNode::parse(&response.body)
    }
}
