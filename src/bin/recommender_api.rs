use std::net::SocketAddr;

use anyhow::{Context, Result};
use assessment_recommender::{init_tracing, router, AppState, Cli};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let controls = cli.build_controls();
    let source = controls
        .build_source()
        .context("invalid catalog configuration")?;
    let state = AppState::new(source, controls.default_top_n());
    let app = router(state);

    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        catalog = controls.catalog_url(),
        ttl_secs = controls.catalog_ttl().as_secs(),
        "assessment recommender listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
