use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use common::{
    CandleSequence, CandleSource, CatalogCommand, CatalogState, Config, Result, SkipReason,
    Snapshot,
};
use strategy::StrategyRegistry;

use crate::report::SnapshotBuilder;

/// What the cataloger fetches and how often.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub instruments: Vec<String>,
    pub timeframe_secs: u32,
    pub candle_count: usize,
    pub martingale_depth: usize,
    pub refresh: Duration,
}

impl From<&Config> for CatalogSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            instruments: cfg.instruments(),
            timeframe_secs: cfg.timeframe_secs,
            candle_count: cfg.candle_count,
            martingale_depth: cfg.martingale_depth,
            refresh: Duration::from_secs(cfg.refresh_secs),
        }
    }
}

/// Cloneable handle passed to readers (API, console).
#[derive(Clone)]
pub struct CatalogHandle {
    command_tx: mpsc::Sender<CatalogCommand>,
    state: Arc<RwLock<CatalogState>>,
    snapshot_rx: watch::Receiver<Arc<Snapshot>>,
}

impl CatalogHandle {
    pub async fn send(&self, cmd: CatalogCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn state(&self) -> CatalogState {
        *self.state.read().await
    }

    pub fn state_handle(&self) -> Arc<RwLock<CatalogState>> {
        self.state.clone()
    }

    /// Most recently published snapshot. Never partially updated.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified each time a cycle publishes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_rx.clone()
    }
}

/// Periodically fetches candles for every instrument, evaluates the strategy
/// registry and publishes an immutable `Snapshot`.
pub struct Cataloger {
    settings: CatalogSettings,
    source: Arc<dyn CandleSource>,
    registry: Arc<StrategyRegistry>,
    state: Arc<RwLock<CatalogState>>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    command_rx: mpsc::Receiver<CatalogCommand>,
    cycle: u64,
}

impl Cataloger {
    pub fn new(
        settings: CatalogSettings,
        source: Arc<dyn CandleSource>,
        registry: Arc<StrategyRegistry>,
    ) -> (Self, CatalogHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::pending()));
        let state = Arc::new(RwLock::new(CatalogState::Stopped));

        let handle = CatalogHandle {
            command_tx,
            state: state.clone(),
            snapshot_rx,
        };

        let cataloger = Cataloger {
            settings,
            source,
            registry,
            state,
            snapshot_tx,
            command_rx,
            cycle: 0,
        };

        (cataloger, handle)
    }

    /// Fetch, evaluate and publish one cycle. Instruments that fail to load
    /// are skipped; the cycle itself always completes.
    pub async fn run_cycle(&mut self) -> Arc<Snapshot> {
        self.cycle += 1;
        info!(
            cycle = self.cycle,
            instruments = self.settings.instruments.len(),
            "Starting catalog cycle"
        );

        let mut builder =
            SnapshotBuilder::new(&self.registry, self.cycle, self.settings.martingale_depth);

        for instrument in &self.settings.instruments {
            match load_candles(self.source.as_ref(), &self.settings, instrument).await {
                Ok(candles) => builder.add(instrument, &candles),
                Err(e) => {
                    warn!(instrument = %instrument, error = %e, "Candle load failed, skipping instrument");
                    builder.skip(instrument, SkipReason::from(&e));
                }
            }
        }

        let snapshot = Arc::new(builder.finish());
        info!(
            cycle = snapshot.cycle,
            catalogued = snapshot.instruments.len(),
            skipped = snapshot.skipped.len(),
            "Catalog cycle published"
        );
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Run the refresh loop. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(refresh = ?self.settings.refresh, "Cataloger running");
        *self.state.write().await = CatalogState::Running;

        let mut ticker = tokio::time::interval(self.settings.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *self.state.read().await == CatalogState::Paused {
                        debug!("Cataloger paused, skipping scheduled cycle");
                        continue;
                    }
                    self.run_cycle().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CatalogCommand::Refresh) => {
                            info!("Manual refresh requested");
                            self.run_cycle().await;
                            ticker.reset();
                        }
                        Some(CatalogCommand::Pause) => {
                            let mut state = self.state.write().await;
                            if *state == CatalogState::Running {
                                info!("Cataloger paused");
                                *state = CatalogState::Paused;
                            }
                        }
                        Some(CatalogCommand::Resume) => {
                            let mut state = self.state.write().await;
                            if *state == CatalogState::Paused {
                                info!("Cataloger resumed");
                                *state = CatalogState::Running;
                            }
                        }
                        Some(CatalogCommand::Shutdown) => {
                            info!("Cataloger shutting down");
                            break;
                        }
                        None => {
                            warn!("Catalog command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        *self.state.write().await = CatalogState::Stopped;
    }
}

async fn load_candles(
    source: &dyn CandleSource,
    settings: &CatalogSettings,
    instrument: &str,
) -> Result<CandleSequence> {
    let raw = source
        .fetch_candles(instrument, settings.timeframe_secs, settings.candle_count)
        .await?;
    CandleSequence::from_raw(raw)
}
