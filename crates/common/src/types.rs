use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Color, Error};

/// Trade direction suggested by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Call,
    Put,
    /// No trade. Never scored by the backtest.
    #[default]
    None,
}

impl Signal {
    /// Candle color that resolves this signal as a win.
    pub fn target_color(&self) -> Option<Color> {
        match self {
            Signal::Call => Some(Color::Green),
            Signal::Put => Some(Color::Red),
            Signal::None => None,
        }
    }

    pub fn is_tradable(&self) -> bool {
        !matches!(self, Signal::None)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Call => write!(f, "CALL"),
            Signal::Put => write!(f, "PUT"),
            Signal::None => write!(f, "NONE"),
        }
    }
}

/// A strategy decision at one candle index, with the colors that justified it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySignal {
    pub index: usize,
    pub signal: Signal,
    pub pattern: Vec<Color>,
}

impl StrategySignal {
    pub fn new(index: usize, signal: Signal, pattern: Vec<Color>) -> Self {
        Self {
            index,
            signal,
            pattern,
        }
    }
}

/// Historical scoring of one strategy over one candle sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    /// Wins per martingale depth; `wins_by_depth[0]` resolved on the next candle.
    pub wins_by_depth: Vec<u32>,
    pub losses: u32,
    /// Most recent tradable signal, or `None` when the strategy never fired.
    pub last_direction: Signal,
}

impl BacktestOutcome {
    pub fn empty(max_depth: usize) -> Self {
        Self {
            wins_by_depth: vec![0; max_depth + 1],
            losses: 0,
            last_direction: Signal::None,
        }
    }

    pub fn wins_at(&self, depth: usize) -> u32 {
        self.wins_by_depth.get(depth).copied().unwrap_or(0)
    }

    pub fn wins(&self) -> u32 {
        self.wins_by_depth.iter().sum()
    }

    pub fn total_signals(&self) -> u32 {
        self.wins() + self.losses
    }

    /// Percentage of scored signals that won at any depth; `None` with no data.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total_signals();
        if total == 0 {
            return None;
        }
        Some(100.0 * f64::from(self.wins()) / f64::from(total))
    }
}

/// Presentation bucket for an accuracy figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    Excellent,
    Good,
    Fair,
    Poor,
    NoData,
}

impl AccuracyTier {
    pub fn classify(accuracy: Option<f64>) -> Self {
        match accuracy {
            None => AccuracyTier::NoData,
            Some(a) if a >= 90.0 => AccuracyTier::Excellent,
            Some(a) if a >= 80.0 => AccuracyTier::Good,
            Some(a) if a >= 70.0 => AccuracyTier::Fair,
            Some(_) => AccuracyTier::Poor,
        }
    }
}

impl std::fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccuracyTier::Excellent => write!(f, "excellent"),
            AccuracyTier::Good => write!(f, "good"),
            AccuracyTier::Fair => write!(f, "fair"),
            AccuracyTier::Poor => write!(f, "poor"),
            AccuracyTier::NoData => write!(f, "no data"),
        }
    }
}

/// One row of the per-instrument report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: String,
    pub strategy_id: String,
    /// `null` when the strategy produced no scored signal.
    pub accuracy: Option<f64>,
    pub total_signals: u32,
    pub wins_by_depth: Vec<u32>,
    pub losses: u32,
    /// Colors inspected at the most recent evaluated index.
    pub pattern: Vec<Color>,
    pub direction: Signal,
    pub tier: AccuracyTier,
}

/// Immutable result of one refresh cycle across all instruments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub updated_at: DateTime<Utc>,
    pub cycle: u64,
    pub instruments: BTreeMap<String, Vec<StrategyReport>>,
    /// Instruments that contributed nothing this cycle, with the reason.
    pub skipped: BTreeMap<String, SkipReason>,
}

impl Snapshot {
    /// Placeholder published before the first cycle completes.
    pub fn pending() -> Self {
        Self {
            updated_at: Utc::now(),
            cycle: 0,
            instruments: BTreeMap::new(),
            skipped: BTreeMap::new(),
        }
    }
}

/// Why an instrument was left out of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer bars than the catalog minimum.
    InsufficientHistory { candles: usize },
    /// The provider broke the candle contract (e.g. out-of-order timestamps).
    Malformed { index: usize, reason: String },
    FetchFailed { error: String },
}

impl From<&Error> for SkipReason {
    fn from(e: &Error) -> Self {
        match e {
            Error::MalformedCandles { index, reason } => SkipReason::Malformed {
                index: *index,
                reason: reason.clone(),
            },
            other => SkipReason::FetchFailed {
                error: other.to_string(),
            },
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InsufficientHistory { candles } => {
                write!(f, "insufficient history ({candles} candles)")
            }
            SkipReason::Malformed { index, reason } => {
                write!(f, "malformed candles at index {index}: {reason}")
            }
            SkipReason::FetchFailed { error } => write!(f, "fetch failed: {error}"),
        }
    }
}

/// Current state of the cataloger loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl std::fmt::Display for CatalogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogState::Stopped => write!(f, "stopped"),
            CatalogState::Running => write!(f, "running"),
            CatalogState::Paused => write!(f, "paused"),
        }
    }
}

/// Commands sent to the cataloger via its command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogCommand {
    Refresh,
    Pause,
    Resume,
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_is_undefined_without_signals() {
        let outcome = BacktestOutcome::empty(2);
        assert_eq!(outcome.total_signals(), 0);
        assert!(outcome.accuracy().is_none());
    }

    #[test]
    fn accuracy_counts_every_depth() {
        let outcome = BacktestOutcome {
            wins_by_depth: vec![2, 1, 1],
            losses: 1,
            last_direction: Signal::Put,
        };
        assert_eq!(outcome.total_signals(), 5);
        assert_eq!(outcome.wins_at(1), 1);
        assert_eq!(outcome.wins_at(7), 0);
        let accuracy = outcome.accuracy().unwrap();
        assert!((accuracy - 80.0).abs() < 1e-9, "got {accuracy}");
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(AccuracyTier::classify(Some(90.0)), AccuracyTier::Excellent);
        assert_eq!(AccuracyTier::classify(Some(89.99)), AccuracyTier::Good);
        assert_eq!(AccuracyTier::classify(Some(70.0)), AccuracyTier::Fair);
        assert_eq!(AccuracyTier::classify(Some(12.5)), AccuracyTier::Poor);
        assert_eq!(AccuracyTier::classify(None), AccuracyTier::NoData);
    }

    #[test]
    fn signals_serialize_upper_case() {
        assert_eq!(serde_json::to_string(&Signal::Call).unwrap(), "\"CALL\"");
        assert_eq!(serde_json::to_string(&Signal::None).unwrap(), "\"NONE\"");
        assert_eq!(Signal::Put.target_color(), Some(Color::Red));
        assert!(!Signal::None.is_tradable());
    }

    #[test]
    fn skip_reasons_separate_malformed_data_from_fetch_errors() {
        let malformed = Error::MalformedCandles {
            index: 11,
            reason: "timestamp 60 does not follow 120".into(),
        };
        assert_eq!(
            SkipReason::from(&malformed),
            SkipReason::Malformed {
                index: 11,
                reason: "timestamp 60 does not follow 120".into(),
            }
        );
        assert_eq!(
            SkipReason::from(&Error::Http("timed out".into())),
            SkipReason::FetchFailed {
                error: "HTTP error: timed out".into(),
            }
        );
    }

    #[test]
    fn skip_reasons_serialize_with_a_kind_tag() {
        let json = serde_json::to_value(SkipReason::InsufficientHistory { candles: 30 }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "insufficient_history", "candles": 30 }));
        let json = serde_json::to_value(SkipReason::Malformed {
            index: 3,
            reason: "gap".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "malformed");
        assert_eq!(json["index"], 3);
    }
}
