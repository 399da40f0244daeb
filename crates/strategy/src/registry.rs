use tracing::info;

use common::{Error, Result};

use crate::catalog::{self, catalog_ids};
use crate::config::{StrategyConfig, StrategyFileConfig};
use crate::Strategy;

/// Holds the active strategy instances in presentation order.
///
/// Built once at startup; the cataloger shares it read-only across cycles.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Every catalog strategy under its catalog name.
    pub fn catalog() -> Self {
        let strategies = catalog::catalog()
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn Strategy>)
            .collect();
        Self::from_strategies(strategies)
    }

    /// Build the registry from a selection file, failing on unknown strategy types.
    pub fn from_config(file_cfg: &StrategyFileConfig) -> Result<Self> {
        if file_cfg.strategies.is_empty() {
            return Err(Error::Config("strategy config selects no strategies".into()));
        }
        let strategies = file_cfg
            .strategies
            .iter()
            .map(build_strategy)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_strategies(strategies))
    }

    /// Full catalog when `path` is `None`, otherwise the file's selection.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_config(&StrategyFileConfig::load(path)?),
            None => Ok(Self::catalog()),
        }
    }

    pub fn from_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        for strategy in &strategies {
            info!(
                id = %strategy.id(),
                name = %strategy.name(),
                min_history = strategy.min_history(),
                "Registered strategy"
            );
        }
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

// ─── Strategy builders ────────────────────────────────────────────────────────

fn build_strategy(cfg: &StrategyConfig) -> Result<Box<dyn Strategy>> {
    let strategy = catalog::by_id(&cfg.strategy_type).ok_or_else(|| {
        Error::Config(format!(
            "unknown strategy type '{}' (expected one of: {})",
            cfg.strategy_type,
            catalog_ids().collect::<Vec<_>>().join(", ")
        ))
    })?;
    Ok(match &cfg.name {
        Some(name) => Box::new(strategy.with_name(name.clone())),
        None => Box::new(strategy),
    })
}
