use std::{sync::Arc, time::Duration};

use tracing::info;
use tracing_subscriber::EnvFilter;

use defi_exchange_backend::{
    api::{router, server},
    config::Config,
    db,
    market::service::KucoinPriceSource,
    middleware::SessionStore,
    scheduler::RefreshJob,
    wallets::service::WalletService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::mongodb::connect(&config.mongodb_uri, &config.mongodb_name).await?;
    info!("Connected to MongoDB");

    // Top token refresh
    let price_source = Arc::new(KucoinPriceSource::new()?);
    let wallet_service = WalletService::new(price_source, config.top_tokens.symbols.clone());
    let refresh_job = RefreshJob::from_config(wallet_service.clone(), &config.top_tokens)?;
    info!(schedule = %config.top_tokens.schedule, "Scheduling top token refresh");
    let refresh_handle = refresh_job.spawn();

    let sessions = SessionStore::new();
    let purge_handle = sessions.spawn_purge(Duration::from_secs(15 * 60));

    let routes = router::RouteTable::standard(db, wallet_service)?;
    let app = router::build_app(&config, routes, sessions)?;

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("🚀 Server running on port {}!", config.port);

    server::serve(listener, app, server::shutdown_signal()).await?;

    refresh_handle.stop();
    purge_handle.abort();
    info!("Server stopped");

    Ok(())
}
