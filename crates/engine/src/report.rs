use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, warn};

use common::{AccuracyTier, CandleSequence, SkipReason, Snapshot, StrategyReport, MIN_CANDLES};
use strategy::{Strategy, StrategyRegistry};

use crate::backtest::backtest;

/// Run one strategy over a sequence and score it.
pub fn evaluate_strategy(
    strategy: &dyn Strategy,
    candles: &CandleSequence,
    max_depth: usize,
) -> StrategyReport {
    let signals = strategy.evaluate(candles);
    let outcome = backtest(candles, &signals, max_depth);
    let accuracy = outcome.accuracy();

    StrategyReport {
        strategy: strategy.name().to_string(),
        strategy_id: strategy.id().to_string(),
        accuracy,
        total_signals: outcome.total_signals(),
        wins_by_depth: outcome.wins_by_depth.clone(),
        losses: outcome.losses,
        pattern: signals.last().map(|s| s.pattern.clone()).unwrap_or_default(),
        direction: outcome.last_direction,
        tier: AccuracyTier::classify(accuracy),
    }
}

/// Every registered strategy over one instrument, best accuracy first.
pub fn evaluate_instrument(
    registry: &StrategyRegistry,
    candles: &CandleSequence,
    max_depth: usize,
) -> Vec<StrategyReport> {
    let mut reports: Vec<StrategyReport> = registry
        .strategies()
        .iter()
        .map(|s| evaluate_strategy(s.as_ref(), candles, max_depth))
        .collect();
    sort_reports(&mut reports);
    reports
}

/// Descending accuracy with "no data" rows last. Stable, so ties keep
/// registry order.
pub fn sort_reports(reports: &mut [StrategyReport]) {
    reports.sort_by(|a, b| match (a.accuracy, b.accuracy) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Accumulates per-instrument results for one refresh cycle.
pub struct SnapshotBuilder<'a> {
    registry: &'a StrategyRegistry,
    cycle: u64,
    max_depth: usize,
    instruments: BTreeMap<String, Vec<StrategyReport>>,
    skipped: BTreeMap<String, SkipReason>,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(registry: &'a StrategyRegistry, cycle: u64, max_depth: usize) -> Self {
        Self {
            registry,
            cycle,
            max_depth,
            instruments: BTreeMap::new(),
            skipped: BTreeMap::new(),
        }
    }

    /// Evaluate an instrument, or skip it when the history is too short.
    pub fn add(&mut self, instrument: &str, candles: &CandleSequence) {
        if !candles.has_min_history(MIN_CANDLES) {
            warn!(
                instrument,
                candles = candles.len(),
                required = MIN_CANDLES,
                "Insufficient history, skipping instrument"
            );
            self.skip(
                instrument,
                SkipReason::InsufficientHistory {
                    candles: candles.len(),
                },
            );
            return;
        }
        let reports = evaluate_instrument(self.registry, candles, self.max_depth);
        debug!(instrument, strategies = reports.len(), "Instrument catalogued");
        self.instruments.insert(instrument.to_string(), reports);
    }

    /// Record an instrument that contributes nothing this cycle.
    pub fn skip(&mut self, instrument: &str, reason: SkipReason) {
        self.skipped.insert(instrument.to_string(), reason);
    }

    pub fn finish(self) -> Snapshot {
        Snapshot {
            updated_at: Utc::now(),
            cycle: self.cycle,
            instruments: self.instruments,
            skipped: self.skipped,
        }
    }
}

/// Plain-text accuracy table per instrument, for console output.
pub fn summary_lines(snapshot: &Snapshot) -> Vec<String> {
    let mut lines = vec![format!(
        "Accuracy summary (cycle {}, {})",
        snapshot.cycle,
        snapshot.updated_at.format("%H:%M:%S")
    )];
    for (instrument, reports) in &snapshot.instruments {
        lines.push(format!("Instrument: {instrument}"));
        for r in reports {
            let accuracy = r
                .accuracy
                .map(|a| format!("{a:.2}%"))
                .unwrap_or_else(|| "N/A".to_string());
            let wins: Vec<String> = r.wins_by_depth.iter().map(u32::to_string).collect();
            lines.push(format!(
                "  {:<25} {:>8} ({} signals, wins {}, losses {}, {}, next {})",
                r.strategy,
                accuracy,
                r.total_signals,
                wins.join("/"),
                r.losses,
                r.tier,
                r.direction
            ));
        }
    }
    for (instrument, reason) in &snapshot.skipped {
        lines.push(format!("Skipped {instrument}: {reason}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Candle, Signal};

    fn report(name: &str, accuracy: Option<f64>) -> StrategyReport {
        StrategyReport {
            strategy: name.to_string(),
            strategy_id: name.to_lowercase(),
            accuracy,
            total_signals: 0,
            wins_by_depth: vec![0, 0, 0],
            losses: 0,
            pattern: Vec::new(),
            direction: Signal::None,
            tier: AccuracyTier::classify(accuracy),
        }
    }

    /// Alternating green/red bars on a one-minute grid.
    fn zigzag(len: usize) -> CandleSequence {
        let candles = (0..len)
            .map(|i| {
                let (open, close) = if i % 2 == 0 { (1.0, 1.2) } else { (1.2, 1.0) };
                Candle::new(1_700_000_040 + i as i64 * 60, open, close)
            })
            .collect();
        CandleSequence::new(candles).unwrap()
    }

    #[test]
    fn sort_puts_no_data_last() {
        let mut reports = vec![
            report("A", None),
            report("B", Some(50.0)),
            report("C", Some(91.0)),
            report("D", None),
            report("E", Some(50.0)),
        ];
        sort_reports(&mut reports);
        let names: Vec<&str> = reports.iter().map(|r| r.strategy.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "E", "A", "D"]);
    }

    #[test]
    fn every_strategy_gets_a_row() {
        let registry = StrategyRegistry::catalog();
        let reports = evaluate_instrument(&registry, &zigzag(120), 2);
        assert_eq!(reports.len(), registry.len());
        for r in &reports {
            let wins: u32 = r.wins_by_depth.iter().sum();
            assert_eq!(wins + r.losses, r.total_signals, "{}", r.strategy);
            if let Some(a) = r.accuracy {
                assert!((0.0..=100.0).contains(&a));
            }
        }
    }

    #[test]
    fn never_firing_strategy_reports_no_data() {
        // A strict zigzag never shows seven equal colors.
        let registry = StrategyRegistry::catalog();
        let reports = evaluate_instrument(&registry, &zigzag(120), 2);
        let flip = reports.iter().find(|r| r.strategy_id == "seven_flip").unwrap();
        assert_eq!(flip.accuracy, None);
        assert_eq!(flip.tier, AccuracyTier::NoData);
        assert_eq!(flip.direction, Signal::None);
        assert_eq!(flip.pattern.len(), 7);
        assert_eq!(reports.last().unwrap().accuracy, None);
    }

    #[test]
    fn short_history_is_skipped() {
        let registry = StrategyRegistry::catalog();
        let mut builder = SnapshotBuilder::new(&registry, 3, 2);
        builder.add("EURUSD", &zigzag(MIN_CANDLES - 1));
        builder.add("GBPUSD", &zigzag(MIN_CANDLES));
        builder.skip(
            "USDJPY",
            SkipReason::FetchFailed {
                error: "unknown symbol".into(),
            },
        );
        let snapshot = builder.finish();
        assert_eq!(snapshot.cycle, 3);
        assert_eq!(snapshot.skipped.len(), 2);
        assert_eq!(
            snapshot.skipped["EURUSD"],
            SkipReason::InsufficientHistory {
                candles: MIN_CANDLES - 1
            }
        );
        assert_eq!(snapshot.instruments.keys().collect::<Vec<_>>(), vec!["GBPUSD"]);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let registry = StrategyRegistry::catalog();
        let candles = zigzag(240);
        assert_eq!(
            evaluate_instrument(&registry, &candles, 2),
            evaluate_instrument(&registry, &candles, 2)
        );
    }

    #[test]
    fn summary_renders_na_and_skips() {
        let registry = StrategyRegistry::catalog();
        let mut builder = SnapshotBuilder::new(&registry, 1, 2);
        builder.add("EURUSD", &zigzag(60));
        builder.skip(
            "GBPUSD-OTC",
            SkipReason::FetchFailed {
                error: "Candle provider error: HTTP 400".into(),
            },
        );
        let lines = summary_lines(&builder.finish());
        assert!(lines.iter().any(|l| l == "Instrument: EURUSD"));
        assert!(lines.iter().any(|l| l.contains("Seven Flip") && l.contains("N/A")));
        assert_eq!(
            lines.last().unwrap(),
            "Skipped GBPUSD-OTC: fetch failed: Candle provider error: HTTP 400"
        );
    }

    #[test]
    fn summary_rows_break_down_wins_by_depth() {
        let mut snapshot = Snapshot::pending();
        let mut row = report("MHI 1", Some(80.0));
        row.total_signals = 5;
        row.wins_by_depth = vec![2, 1, 1];
        row.losses = 1;
        row.direction = Signal::Put;
        snapshot.instruments.insert("EURUSD".into(), vec![row]);

        let lines = summary_lines(&snapshot);
        let row = lines.iter().find(|l| l.contains("MHI 1")).unwrap();
        assert!(row.contains("80.00%"), "{row}");
        assert!(row.contains("(5 signals, wins 2/1/1, losses 1, good, next PUT)"), "{row}");
    }
}
