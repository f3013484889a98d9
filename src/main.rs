//! Quorum server - multi-party approval over HTTP

use clap::Parser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quorum::approval::ProposalCoordinator;
use quorum::config::{Config, GovernanceFile};
use quorum::ledger::{HttpExecutor, TransferBuilder};
use quorum::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quorum=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    let executor = HttpExecutor::with_timeout(&config.ledger_url, config.ledger_timeout())?;
    let builder = match &config.wallet_address {
        Some(address) => TransferBuilder::with_source(address.as_str().into()),
        None => TransferBuilder::new(),
    };

    let mut coordinator = ProposalCoordinator::new(Arc::new(builder), Arc::new(executor));
    if let Some(path) = config.governance_path()? {
        let (registry, policy) = GovernanceFile::load(path)?.into_parts();
        tracing::info!(
            path = %path.display(),
            owners = registry.owner_count(),
            rules = policy.rules.len(),
            "Loaded governance"
        );
        coordinator = coordinator.with_governance(registry, policy);
    } else {
        tracing::warn!(
            "Starting with open governance: no owners and threshold 0, so any single \
             endorsement, even from a non-owner, executes a ledger transfer"
        );
    }

    let state = AppState::new(coordinator);

    let app = quorum::api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
