//! Martingale-window scoring of a strategy's historical signals.

use common::{BacktestOutcome, CandleSequence, StrategySignal};

/// Recovery attempts after the first entry: three candles are inspected in total.
pub const DEFAULT_MARTINGALE_DEPTH: usize = 2;

/// Score every tradable signal against the candles that follow it.
///
/// A `Call` wins on the first `Green` candle among `i+1 ..= i+max_depth+1`, a
/// `Put` on the first `Red`; the offset of that candle minus one is the win
/// depth. Signals too close to the end of the sequence to see the whole window
/// are not scored. `last_direction` still reflects them.
pub fn backtest(
    candles: &CandleSequence,
    signals: &[StrategySignal],
    max_depth: usize,
) -> BacktestOutcome {
    let mut outcome = BacktestOutcome::empty(max_depth);
    outcome.last_direction = signals
        .iter()
        .rev()
        .map(|s| s.signal)
        .find(|s| s.is_tradable())
        .unwrap_or_default();

    let window = max_depth + 1;
    let scan_limit = candles.len().saturating_sub(window);

    for instance in signals.iter().filter(|s| s.index < scan_limit) {
        let Some(target) = instance.signal.target_color() else {
            continue;
        };
        match (1..=window).position(|step| candles.color(instance.index + step) == target) {
            Some(depth) => outcome.wins_by_depth[depth] += 1,
            None => outcome.losses += 1,
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Color::{self, Doji, Green, Red};
    use common::{Candle, Signal};

    fn sequence(colors: &[Color]) -> CandleSequence {
        let candles = colors
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let (open, close) = match c {
                    Green => (1.0, 2.0),
                    Red => (2.0, 1.0),
                    Doji => (1.5, 1.5),
                };
                Candle::new(i as i64 * 60, open, close)
            })
            .collect();
        CandleSequence::new(candles).unwrap()
    }

    fn at(index: usize, signal: Signal) -> StrategySignal {
        StrategySignal::new(index, signal, Vec::new())
    }

    #[test]
    fn each_depth_is_bucketed() {
        let seq = sequence(&[Doji, Green, Red, Red, Green, Doji, Doji, Doji, Doji]);
        let signals = [
            at(0, Signal::Call), // green at +1
            at(1, Signal::Put),  // red at +1
            at(0, Signal::Put),  // red at +2
            at(1, Signal::Call), // green at +3
            at(4, Signal::Call), // doji, doji, doji
        ];
        let outcome = backtest(&seq, &signals, DEFAULT_MARTINGALE_DEPTH);
        assert_eq!(outcome.wins_by_depth, vec![2, 1, 1]);
        assert_eq!(outcome.losses, 1);
        assert_eq!(outcome.total_signals(), 5);
        assert_eq!(outcome.accuracy(), Some(80.0));
    }

    #[test]
    fn none_signals_are_never_scored() {
        let seq = sequence(&[Green; 8]);
        let signals = [at(0, Signal::None), at(1, Signal::None)];
        let outcome = backtest(&seq, &signals, DEFAULT_MARTINGALE_DEPTH);
        assert_eq!(outcome.total_signals(), 0);
        assert_eq!(outcome.accuracy(), None);
        assert_eq!(outcome.last_direction, Signal::None);
    }

    #[test]
    fn signals_without_a_full_window_are_excluded() {
        // Length 6: indices 0, 1, 2 can see three candles ahead; 3, 4, 5 cannot.
        let seq = sequence(&[Green; 6]);
        let signals: Vec<_> = (0..6).map(|i| at(i, Signal::Call)).collect();
        let outcome = backtest(&seq, &signals, DEFAULT_MARTINGALE_DEPTH);
        assert_eq!(outcome.total_signals(), 3);
        assert_eq!(outcome.losses, 0);
    }

    #[test]
    fn last_direction_includes_unscored_tail() {
        let seq = sequence(&[Red; 6]);
        let signals = [at(0, Signal::Put), at(5, Signal::Call), at(5, Signal::None)];
        let outcome = backtest(&seq, &signals, DEFAULT_MARTINGALE_DEPTH);
        assert_eq!(outcome.last_direction, Signal::Call);
        assert_eq!(outcome.total_signals(), 1);
    }

    #[test]
    fn zero_depth_only_checks_the_next_candle() {
        let seq = sequence(&[Doji, Red, Green, Doji]);
        let signals = [at(0, Signal::Call), at(1, Signal::Call)];
        let outcome = backtest(&seq, &signals, 0);
        assert_eq!(outcome.wins_by_depth, vec![1]);
        assert_eq!(outcome.losses, 1);
    }

    #[test]
    fn short_sequences_score_nothing() {
        let seq = sequence(&[Green, Green]);
        let outcome = backtest(&seq, &[at(0, Signal::Call)], DEFAULT_MARTINGALE_DEPTH);
        assert_eq!(outcome.total_signals(), 0);
        assert_eq!(outcome.last_direction, Signal::Call);
    }
}
