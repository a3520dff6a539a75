//! Process entry point: load config → authenticate → load catalog → plan
//! and run the scheduler → serve the egress HTTP/WebSocket surface.
//!
//! Wiring only — no scheduling logic lives here. See
//! [`tick_relay::scheduler`] for the Subscription Scheduler itself.

use std::sync::Arc;

use tick_relay::catalog::{CatalogSource, HttpCatalogSource};
use tick_relay::client::BrokerClient;
use tick_relay::config::Config;
use tick_relay::error::Result;
use tick_relay::{auth, constants, egress, scheduler, store, supervisor};

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal startup error");
        std::process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let production = matches!(
        std::env::var("FLASK_ENV").as_deref(),
        Ok("production") | Ok("prod")
    );

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);
    if production {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    tracing::info!(
        max_connections = config.max_connections,
        symbols_per_connection = config.symbols_per_connection,
        "configuration loaded"
    );

    let session = auth::authenticator_for(&config.auth_method)
        .authenticate()
        .await?;
    tracing::info!(client_id = %session.client_id, "authenticated");

    // Instrument catalog fetch, cached locally for `catalog_cache_ttl`.
    let catalog_client = BrokerClient::new(&session, constants::API_BASE_URL);
    let catalog_source = HttpCatalogSource::new(
        catalog_client,
        "instruments_cache.json",
        config.catalog_cache_ttl,
    );
    let instruments = catalog_source.load().await?;
    tracing::info!(count = instruments.len(), "instrument catalog loaded");

    let tick_store = Arc::new(store::TickStore::new());
    let connection_supervisor = Arc::new(supervisor::ConnectionSupervisor::with_retry_policy(
        &session,
        tick_store.clone(),
        config.max_retries,
        config.retry_delay,
    ));

    let workers = scheduler::run(&instruments, connection_supervisor.clone(), &config).await?;
    tracing::info!(worker_count = workers.len(), "rotation workers launched");

    let egress_state = egress::EgressState::new(tick_store.subscribe(), config.deploy_dir.clone());
    let app = egress::router(egress_state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| {
            tick_relay::error::RelayError::InvalidArgument(format!(
                "failed to bind {}: {e}",
                config.bind_addr
            ))
        })?;
    tracing::info!(addr = %config.bind_addr, "egress server listening");

    let shutdown_supervisor = connection_supervisor.clone();
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        shutdown_supervisor.shutdown().await;
    });

    serve
        .await
        .map_err(|e| tick_relay::error::RelayError::InvalidArgument(e.to_string()))?;

    for worker in workers {
        worker.abort();
    }

    Ok(())
}
