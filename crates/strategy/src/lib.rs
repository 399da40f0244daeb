pub mod catalog;
pub mod config;
pub mod registry;
pub mod voting;

pub use catalog::{catalog, PatternStrategy};
pub use config::{StrategyConfig, StrategyFileConfig};
pub use registry::StrategyRegistry;
pub use voting::{majority, minority};

use common::{CandleSequence, StrategySignal};

/// All strategy implementations must satisfy this trait.
///
/// Strategies are pure: the same candles always produce the same signals.
pub trait Strategy: Send + Sync {
    /// Stable identifier used in config files and the API (e.g. "mhi1").
    fn id(&self) -> &str;

    /// Human-readable name shown in reports and the dashboard.
    fn name(&self) -> &str;

    /// Smallest candle index the strategy can evaluate.
    fn min_history(&self) -> usize;

    /// Scan the whole sequence, returning one decision per evaluated index in
    /// ascending index order. Decisions may be `Signal::None`.
    fn evaluate(&self, candles: &CandleSequence) -> Vec<StrategySignal>;
}
