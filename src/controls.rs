//! Service settings shared by the HTTP server and the command-line recommender.

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser};

use crate::catalog::{
    CatalogError, CatalogExtractor, TileStrategies, DEFAULT_CATALOG_URL, DEFAULT_ORIGIN,
    DEFAULT_USER_AGENT,
};
use crate::source::{CachedCatalog, CatalogSource, LiveCatalog};

/// Tunable knobs that bound catalog fetching and ranking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceControls {
    catalog_url: String,
    origin: String,
    fetch_timeout: Duration,
    user_agent: String,
    tile_selectors: Vec<String>,
    default_top_n: usize,
    catalog_ttl: Duration,
}

impl ServiceControls {
    /// Constructs a new set of service controls.
    pub fn new(
        catalog_url: String,
        origin: String,
        fetch_timeout: Duration,
        user_agent: String,
        tile_selectors: Vec<String>,
        default_top_n: usize,
        catalog_ttl: Duration,
    ) -> Self {
        Self {
            catalog_url,
            origin,
            fetch_timeout,
            user_agent,
            tile_selectors,
            default_top_n,
            catalog_ttl,
        }
    }

    /// Catalog page to scrape.
    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    /// Result count used when a request omits `top_n`.
    pub fn default_top_n(&self) -> usize {
        self.default_top_n
    }

    /// How long a fetched catalog is reused; zero fetches on every request.
    pub fn catalog_ttl(&self) -> Duration {
        self.catalog_ttl
    }

    /// Builds the extractor described by these controls.
    pub fn build_extractor(&self) -> Result<CatalogExtractor, CatalogError> {
        let strategies = TileStrategies::from_css(&self.tile_selectors)?;
        CatalogExtractor::new(
            &self.catalog_url,
            &self.origin,
            self.fetch_timeout,
            &self.user_agent,
            strategies,
        )
    }

    /// Builds the catalog source: live per request, or TTL-cached when a TTL is set.
    pub fn build_source(&self) -> Result<Arc<dyn CatalogSource>, CatalogError> {
        let live = LiveCatalog::new(self.build_extractor()?);
        if self.catalog_ttl.is_zero() {
            Ok(Arc::new(live))
        } else {
            Ok(Arc::new(CachedCatalog::new(live, self.catalog_ttl)))
        }
    }
}

impl Default for ServiceControls {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            fetch_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tile_selectors: crate::catalog::DEFAULT_TILE_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_top_n: 10,
            catalog_ttl: Duration::ZERO,
        }
    }
}

/// Catalog scraping options shared by every binary.
#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Catalog page scraped for products
    #[arg(long, env = "RECOMMENDER_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Origin prefixed onto relative product links
    #[arg(long, env = "RECOMMENDER_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// Seconds before a catalog fetch is abandoned
    #[arg(
        long,
        env = "RECOMMENDER_FETCH_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout_secs: u64,

    /// User agent sent with catalog requests
    #[arg(long, env = "RECOMMENDER_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Tile selectors tried in order, comma separated
    #[arg(
        long,
        env = "RECOMMENDER_TILE_SELECTORS",
        default_value = "div.custom__table-responsive,li.product-item"
    )]
    pub tile_selectors: String,
}

impl CatalogArgs {
    /// Combines the catalog options with ranking and caching settings.
    pub fn build_controls(&self, default_top_n: usize, catalog_ttl: Duration) -> ServiceControls {
        ServiceControls::new(
            self.catalog_url.clone(),
            self.origin.clone(),
            Duration::from_secs(self.fetch_timeout_secs),
            self.user_agent.clone(),
            self.selectors_vec(),
            default_top_n,
            catalog_ttl,
        )
    }

    fn selectors_vec(&self) -> Vec<String> {
        self.tile_selectors
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Command-line interface of the HTTP server.
#[derive(Parser, Debug, Clone)]
#[command(name = "assessment-recommender", about = "Assessment catalog recommender")]
pub struct Cli {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "RECOMMENDER_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Catalog scraping options
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Results returned when a request omits top_n
    #[arg(long, env = "RECOMMENDER_DEFAULT_TOP_N", default_value_t = 10)]
    pub default_top_n: usize,

    /// Seconds to reuse a fetched catalog (0 = fetch on every request)
    #[arg(long, env = "RECOMMENDER_CATALOG_TTL_SECS", default_value_t = 0)]
    pub catalog_ttl_secs: u64,
}

impl Cli {
    /// Converts the parsed CLI into `ServiceControls`.
    pub fn build_controls(&self) -> ServiceControls {
        self.catalog
            .build_controls(self.default_top_n, Duration::from_secs(self.catalog_ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_service_defaults() {
        let cli = Cli::parse_from(["recommender"]);
        let controls = cli.build_controls();
        assert_eq!(controls, ServiceControls::default());
        assert_eq!(controls.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(controls.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn user_agent_can_be_overridden() {
        let cli = Cli::parse_from(["recommender", "--user-agent", "catalog-bot/2.0"]);
        assert_eq!(cli.build_controls().user_agent, "catalog-bot/2.0");
    }

    #[test]
    fn zero_fetch_timeout_is_rejected() {
        let err = Cli::try_parse_from(["recommender", "--fetch-timeout-secs", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli::parse_from(["recommender", "--fetch-timeout-secs", "1"]);
        assert_eq!(cli.build_controls().fetch_timeout, Duration::from_secs(1));
    }

    #[test]
    fn selectors_are_split_and_trimmed() {
        let cli = Cli::parse_from([
            "recommender",
            "--tile-selectors",
            " article.tile , ,li.product-item",
            "--catalog-ttl-secs",
            "300",
        ]);
        let controls = cli.build_controls();
        assert_eq!(controls.tile_selectors, ["article.tile", "li.product-item"]);
        assert_eq!(controls.catalog_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn invalid_selector_surfaces_when_building_source() {
        let cli = Cli::parse_from(["recommender", "--tile-selectors", "div[["]);
        assert!(cli.build_controls().build_source().is_err());
    }
}
