use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{CandleSource, CatalogCommand, Config};
use engine::{summary_lines, BinanceKlines, CatalogSettings, Cataloger};
use strategy::StrategyRegistry;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {e}"));
    info!(
        instruments = ?cfg.instruments(),
        timeframe_secs = cfg.timeframe_secs,
        martingale_depth = cfg.martingale_depth,
        "Catalogador starting"
    );

    // ── Strategy registry ─────────────────────────────────────────────────────
    let registry = StrategyRegistry::load(cfg.strategy_config_path.as_deref())
        .unwrap_or_else(|e| panic!("Failed to load strategies: {e}"));

    // ── Candle source ─────────────────────────────────────────────────────────
    let source: Arc<dyn CandleSource> = Arc::new(
        BinanceKlines::new(cfg.binance_base_url.clone())
            .unwrap_or_else(|e| panic!("Failed to build Binance client: {e}")),
    );

    // ── Cataloger ─────────────────────────────────────────────────────────────
    let (cataloger, handle) =
        Cataloger::new(CatalogSettings::from(&cfg), source, Arc::new(registry));

    // ── Console summary after every published cycle ───────────────────────────
    let mut updates = handle.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            for line in summary_lines(&snapshot) {
                info!("{line}");
            }
        }
    });

    // ── Dashboard API ─────────────────────────────────────────────────────────
    let api_state = api::AppState {
        snapshot: handle.subscribe(),
        catalog_state: handle.state_handle(),
    };
    let port = cfg.dashboard_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "Dashboard API stopped");
        }
    });

    // ── Run until Ctrl-C ──────────────────────────────────────────────────────
    let cataloger_task = tokio::spawn(cataloger.run());
    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received.");

    handle.send(CatalogCommand::Shutdown).await;
    if let Err(e) = cataloger_task.await {
        error!(error = %e, "Cataloger task failed");
    }
    info!("Catalogador stopped.");
}
