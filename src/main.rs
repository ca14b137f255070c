use anyhow::Result;
use std::sync::Arc;

use supernova_dashboard::api::SupernovaClient;
use supernova_dashboard::core::{logging, Config, HealthChecker};
use supernova_dashboard::governance::VoteAggregator;
use supernova_dashboard::monitoring::{self, DashboardState, SyncMetrics};
use supernova_dashboard::session::{AuthService, SessionContext, SqliteSessionStore};
use supernova_dashboard::sync::SyncLoop;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🚀 SUPERNOVA_2177 dashboard starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Backend: {}", config.api.base_url);

    // Session
    let store = Arc::new(SqliteSessionStore::open(&config.session.database_path).await?);
    let session = Arc::new(SessionContext::init(store).await?);

    let client = Arc::new(SupernovaClient::new(&config.api, session.clone())?);
    let auth = AuthService::new(client.clone(), session.clone());

    let profile = match auth.restore().await {
        Some(profile) => Some(profile),
        None => match (&config.session.username, &config.session.password) {
            (Some(username), Some(password)) => match auth.login(username, password).await {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Login as '{}' failed: {}", username, e);
                    None
                }
            },
            _ => None,
        },
    };
    match &profile {
        Some(user) => tracing::info!("Signed in as {} ({})", user.username, user.species),
        None => tracing::info!("Running signed out"),
    }

    // Sync loop
    let health = HealthChecker::new().with_session(session.clone());
    let metrics = Arc::new(SyncMetrics::new()?);

    let sync = Arc::new(SyncLoop::new(
        client.clone(),
        health.clone(),
        metrics.clone(),
        config.sync.clone(),
    ));
    let snapshot = sync.snapshot_handle();
    let sync_handle = sync.clone().spawn();

    // Dashboard endpoint
    let state = DashboardState {
        health: health.clone(),
        snapshot,
        metrics,
        aggregator: Arc::new(VoteAggregator::new(config.governance.weights)),
        api_base_url: client.base_url().to_string(),
    };
    let port = config.monitoring.dashboard_port;
    tokio::spawn(async move { monitoring::serve(state, port).await });

    // Keep running
    let mut status_tick = tokio::time::interval(tokio::time::Duration::from_secs(60));
    status_tick.tick().await;
    loop {
        tokio::select! {
            _ = status_tick.tick() => {
                let status = health.get_status().await;
                let snapshot = sync.snapshot().await;
                tracing::info!(
                    "Dashboard status: {} (uptime: {}s, cycle: {}, proposals: {})",
                    status.status,
                    status.uptime_seconds,
                    snapshot.cycle,
                    snapshot.proposals.len()
                );
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    tracing::info!("🛑 Shutting down...");
    sync_handle.stop().await;
    session.teardown().await;

    Ok(())
}
