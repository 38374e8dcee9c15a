//! Catalog scraping: turns the public product catalog page into [`CatalogItem`] records.

use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Product catalog page scraped when no override is configured.
pub const DEFAULT_CATALOG_URL: &str = "https://www.shl.com/solutions/products/product-catalog/";
/// Origin prefixed onto relative product links.
pub const DEFAULT_ORIGIN: &str = "https://www.shl.com";
/// Tile selectors tried in order until one matches.
pub const DEFAULT_TILE_SELECTORS: &[&str] = &["div.custom__table-responsive", "li.product-item"];
/// Name assigned to tiles without a link.
pub const UNKNOWN_NAME: &str = "Unknown";
/// URL assigned to tiles without a link.
pub const UNKNOWN_URL: &str = "#";

/// User agent sent with catalog requests unless overridden.
pub const DEFAULT_USER_AGENT: &str =
    concat!("assessment-recommender/", env!("CARGO_PKG_VERSION"));

/// One assessment product scraped from the catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Visible product name.
    pub name: String,
    /// Absolute product URL (or `#` when the tile had no link).
    pub url: String,
    /// Tile text mentions remote testing.
    pub supports_remote: bool,
    /// Tile text mentions adaptive or IRT testing.
    pub supports_adaptive: bool,
}

impl CatalogItem {
    /// Builds an item from its parts.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        supports_remote: bool,
        supports_adaptive: bool,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            supports_remote,
            supports_adaptive,
        }
    }
}

/// Errors raised while configuring the extractor.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A tile selector failed to parse as CSS.
    #[error("invalid tile selector `{selector}`: {message}")]
    Selector {
        /// Offending selector text.
        selector: String,
        /// Parser diagnostic.
        message: String,
    },
    /// The catalog URL or origin is not a valid absolute URL.
    #[error("invalid url `{input}`: {source}")]
    Url {
        /// Offending input.
        input: String,
        /// Underlying parse failure.
        #[source]
        source: url::ParseError,
    },
    /// At least one tile selector is required.
    #[error("no tile selectors configured")]
    NoStrategies,
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    /// A shared refresh that this caller waited on failed.
    #[error("catalog refresh failed: {0}")]
    Refresh(String),
}

/// A named CSS selector that locates product tiles.
#[derive(Debug, Clone)]
pub struct TileStrategy {
    css: String,
    selector: Selector,
}

impl TileStrategy {
    /// Parses a CSS selector into a strategy.
    pub fn parse(css: &str) -> Result<Self, CatalogError> {
        let selector = Selector::parse(css).map_err(|err| CatalogError::Selector {
            selector: css.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }

    /// Raw selector text.
    pub fn css(&self) -> &str {
        &self.css
    }

    fn select<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.selector).collect()
    }
}

/// Ordered fallback chain of tile strategies; the first one with matches wins.
#[derive(Debug, Clone)]
pub struct TileStrategies {
    strategies: Vec<TileStrategy>,
}

impl TileStrategies {
    /// Builds the chain from selector strings, preserving their order.
    pub fn from_css<S: AsRef<str>>(selectors: &[S]) -> Result<Self, CatalogError> {
        if selectors.is_empty() {
            return Err(CatalogError::NoStrategies);
        }
        let strategies = selectors
            .iter()
            .map(|css| TileStrategy::parse(css.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { strategies })
    }

    fn pick_tiles<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for strategy in &self.strategies {
            let tiles = strategy.select(document);
            if !tiles.is_empty() {
                debug!(selector = strategy.css(), tiles = tiles.len(), "tile strategy matched");
                return tiles;
            }
        }
        Vec::new()
    }
}

impl Default for TileStrategies {
    fn default() -> Self {
        Self {
            strategies: DEFAULT_TILE_SELECTORS
                .iter()
                .map(|css| TileStrategy::parse(css).expect("built-in tile selector"))
                .collect(),
        }
    }
}

/// Fetches the catalog page and parses its tiles.
#[derive(Clone)]
pub struct CatalogExtractor {
    client: Client,
    catalog_url: Url,
    origin: String,
    strategies: TileStrategies,
    anchor: Selector,
}

impl CatalogExtractor {
    /// Builds an extractor for `catalog_url`, prefixing relative links with `origin`.
    pub fn new(
        catalog_url: &str,
        origin: &str,
        timeout: Duration,
        user_agent: &str,
        strategies: TileStrategies,
    ) -> Result<Self, CatalogError> {
        let catalog_url = parse_url(catalog_url)?;
        let origin = parse_url(origin)?.as_str().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            catalog_url,
            origin,
            strategies,
            anchor: Selector::parse("a[href]").expect("anchor selector"),
        })
    }

    /// Downloads and parses the catalog.
    ///
    /// Network errors, timeouts and non-2xx statuses are logged and yield an empty list.
    pub async fn fetch(&self) -> Vec<CatalogItem> {
        match self.download().await {
            Ok(body) => {
                let items = self.parse(&body);
                debug!(url = %self.catalog_url, items = items.len(), "catalog parsed");
                items
            }
            Err(err) => {
                warn!(url = %self.catalog_url, error = %err, "catalog fetch failed");
                Vec::new()
            }
        }
    }

    async fn download(&self) -> Result<String, reqwest::Error> {
        self.client
            .get(self.catalog_url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// Parses catalog HTML into items in document order.
    pub fn parse(&self, html: &str) -> Vec<CatalogItem> {
        let document = Html::parse_document(html);
        self.strategies
            .pick_tiles(&document)
            .into_iter()
            .map(|tile| self.item_from_tile(tile))
            .collect()
    }

    fn item_from_tile(&self, tile: ElementRef<'_>) -> CatalogItem {
        let (name, url) = match tile.select(&self.anchor).next() {
            Some(anchor) => {
                let name = collapse_whitespace(&anchor.text().collect::<String>());
                let href = anchor.value().attr("href").unwrap_or_default();
                (name, self.absolute_link(href))
            }
            None => (UNKNOWN_NAME.to_string(), UNKNOWN_URL.to_string()),
        };

        let text = tile_text(tile).to_lowercase();
        let supports_remote = text.contains("remote");
        let supports_adaptive = text.contains("adaptive") || text.contains("irt");

        CatalogItem {
            name,
            url,
            supports_remote,
            supports_adaptive,
        }
    }

    /// Absolute `http*` links are kept; anything else is appended to the origin,
    /// with a `/` inserted for bare paths such as `view/x`.
    fn absolute_link(&self, href: &str) -> String {
        let href = href.trim();
        if href.starts_with("http") {
            return href.to_string();
        }
        if href.is_empty() || href.starts_with(['/', '?', '#']) {
            format!("{}{href}", self.origin)
        } else {
            format!("{}/{href}", self.origin)
        }
    }
}

fn parse_url(input: &str) -> Result<Url, CatalogError> {
    Url::parse(input).map_err(|source| CatalogError::Url {
        input: input.to_string(),
        source,
    })
}

fn tile_text(tile: ElementRef<'_>) -> String {
    tile.text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> CatalogExtractor {
        CatalogExtractor::new(
            DEFAULT_CATALOG_URL,
            DEFAULT_ORIGIN,
            Duration::from_secs(10),
            DEFAULT_USER_AGENT,
            TileStrategies::default(),
        )
        .unwrap()
    }

    fn extractor_for(catalog_url: &str, origin: &str, timeout: Duration) -> CatalogExtractor {
        CatalogExtractor::new(
            catalog_url,
            origin,
            timeout,
            "catalog-test/1.0",
            TileStrategies::default(),
        )
        .unwrap()
    }

    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/catalog")
    }

    const TILE_PAGE: &str = r#"<li class="product-item"><a href="/x">Listed</a></li>"#;

    #[test]
    fn parses_primary_tiles_in_order() {
        let html = r#"
            <html><body>
              <div class="custom__table-responsive">
                <a href="/products/verify-coding/"> Verify  Coding
                   Skills </a>
                <span>Remote Testing</span>
              </div>
              <div class="custom__table-responsive">
                <a href="https://example.com/opq">OPQ Personality</a>
                <span>Adaptive/IRT</span>
              </div>
            </body></html>
        "#;

        let items = extractor().parse(html);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Verify Coding Skills");
        assert_eq!(items[0].url, "https://www.shl.com/products/verify-coding/");
        assert!(items[0].supports_remote);
        assert!(!items[0].supports_adaptive);
        assert_eq!(items[1].url, "https://example.com/opq");
        assert!(!items[1].supports_remote);
        assert!(items[1].supports_adaptive);
    }

    #[test]
    fn falls_back_to_secondary_selector() {
        let html = r#"
            <ul>
              <li class="product-item"><a href="/a">Numerical Reasoning</a> IRT scored</li>
              <li class="product-item">No link here, REMOTE only</li>
            </ul>
        "#;

        let items = extractor().parse(html);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Numerical Reasoning");
        assert!(items[0].supports_adaptive);
        assert_eq!(items[1].name, UNKNOWN_NAME);
        assert_eq!(items[1].url, UNKNOWN_URL);
        assert!(items[1].supports_remote);
    }

    #[test]
    fn primary_selector_wins_when_both_match() {
        let html = r#"
            <div class="custom__table-responsive"><a href="/x">Primary</a></div>
            <li class="product-item"><a href="/y">Secondary</a></li>
        "#;

        let items = extractor().parse(html);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Primary");
    }

    #[test]
    fn unmatched_or_empty_documents_yield_nothing() {
        let extractor = extractor();
        assert!(extractor.parse("").is_empty());
        assert!(extractor.parse("<p>nothing to see</p>").is_empty());
        assert!(extractor.parse("<<<div class=").is_empty());
    }

    #[test]
    fn rejects_bad_selectors() {
        let err = TileStrategies::from_css(&["div[["]).unwrap_err();
        assert!(matches!(err, CatalogError::Selector { .. }));

        let empty: [&str; 0] = [];
        assert!(matches!(
            TileStrategies::from_css(&empty),
            Err(CatalogError::NoStrategies)
        ));
    }

    #[test]
    fn custom_strategy_order_is_respected() {
        let strategies = TileStrategies::from_css(&["article.tile", "li.product-item"]).unwrap();
        let extractor = CatalogExtractor::new(
            DEFAULT_CATALOG_URL,
            DEFAULT_ORIGIN,
            Duration::from_secs(1),
            DEFAULT_USER_AGENT,
            strategies,
        )
        .unwrap();
        let html = r#"<article class="tile"><a href="p">Custom</a></article>"#;

        let items = extractor.parse(html);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://www.shl.com/p");
    }

    #[test]
    fn relative_links_are_prefixed_with_origin() {
        let extractor = extractor_for(
            DEFAULT_CATALOG_URL,
            "https://example.com/catalog/",
            Duration::from_secs(1),
        );
        let html = r#"
            <li class="product-item"><a href="/view/a">Slash</a></li>
            <li class="product-item"><a href="view/b">Bare</a></li>
            <li class="product-item"><a href="?page=2">Query</a></li>
            <li class="product-item"><a href="//cdn.example.com/c">Scheme relative</a></li>
        "#;

        let urls: Vec<String> = extractor.parse(html).into_iter().map(|item| item.url).collect();

        assert_eq!(
            urls,
            vec![
                "https://example.com/catalog/view/a",
                "https://example.com/catalog/view/b",
                "https://example.com/catalog?page=2",
                "https://example.com/catalog//cdn.example.com/c",
            ]
        );
    }

    #[tokio::test]
    async fn unreachable_catalog_yields_empty_list() {
        let extractor = extractor_for(
            "http://127.0.0.1:9/catalog",
            DEFAULT_ORIGIN,
            Duration::from_millis(500),
        );

        assert!(extractor.fetch().await.is_empty());
    }

    #[tokio::test]
    async fn served_catalog_is_parsed() {
        let app = axum::Router::new().route("/catalog", axum::routing::get(|| async { TILE_PAGE }));
        let url = serve(app).await;

        let items = extractor_for(&url, DEFAULT_ORIGIN, Duration::from_secs(5)).fetch().await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://www.shl.com/x");
    }

    #[tokio::test]
    async fn server_error_status_yields_empty_list() {
        let app = axum::Router::new().route(
            "/catalog",
            axum::routing::get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, TILE_PAGE) }),
        );
        let url = serve(app).await;

        let extractor = extractor_for(&url, DEFAULT_ORIGIN, Duration::from_secs(5));

        assert!(extractor.fetch().await.is_empty());
    }

    #[tokio::test]
    async fn stalled_catalog_times_out_empty() {
        let app = axum::Router::new().route(
            "/catalog",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                TILE_PAGE
            }),
        );
        let url = serve(app).await;
        let extractor = extractor_for(&url, DEFAULT_ORIGIN, Duration::from_millis(200));

        let started = std::time::Instant::now();
        assert!(extractor.fetch().await.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
    }

    #[tokio::test]
    async fn configured_user_agent_is_sent() {
        let app = axum::Router::new().route(
            "/catalog",
            axum::routing::get(|headers: axum::http::HeaderMap| async move {
                let agent = headers
                    .get(axum::http::header::USER_AGENT)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                format!(r#"<li class="product-item"><a href="/ua">{agent}</a></li>"#)
            }),
        );
        let url = serve(app).await;

        let items = extractor_for(&url, DEFAULT_ORIGIN, Duration::from_secs(5)).fetch().await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "catalog-test/1.0");
    }
}
