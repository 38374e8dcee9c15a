#![warn(missing_docs)]
//! Core library entry points for the assessment recommender.

pub mod api;
pub mod catalog;
pub mod controls;
pub mod ranker;
pub mod recommend;
pub mod source;
pub mod vectorizer;

pub use api::{router, AppState, ErrorBody};
pub use catalog::{CatalogError, CatalogExtractor, CatalogItem, TileStrategies, TileStrategy};
pub use controls::{CatalogArgs, Cli, ServiceControls};
pub use ranker::{cosine_similarity, rank, Ranked};
pub use recommend::{assemble, recommend, Recommendation, ScoredItem};
pub use source::{CachedCatalog, Catalog, CatalogSource, LiveCatalog, StaticCatalog};
pub use vectorizer::{tokenize, FeatureSpace, SparseVector};

/// Installs the fmt subscriber used by the binaries, honoring `RUST_LOG`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
