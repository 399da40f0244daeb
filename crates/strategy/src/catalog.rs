use common::{CandleSequence, Color, Signal, StrategySignal};

use crate::voting::{majority, minority};
use crate::Strategy;

/// Length of the recurring market-structure cycle, in minutes.
pub const PHASE_CYCLE_MINUTES: u32 = 5;

/// When a strategy is allowed to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Only on bars whose clock minute satisfies `minute % 5 == phase`.
    Phase(u32),
    /// On every bar with enough history.
    Every,
}

impl Gate {
    fn admits(&self, minute: u32) -> bool {
        match self {
            Gate::Phase(phase) => minute % PHASE_CYCLE_MINUTES == *phase,
            Gate::Every => true,
        }
    }
}

/// Decision applied to the colors read from a strategy's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Minority,
    Majority,
    /// Both reference bars share a color: follow it. Doji or mismatch is no trade.
    Repeat,
    /// Follow the color of the single bar in the window.
    Follow,
    /// One bar followed by three of the opposite color: bet against the run.
    TwinTowers,
    /// Seven bars of one color: bet on the reversal.
    Flip,
}

impl Rule {
    pub fn decide(&self, window: &[Color]) -> Signal {
        match self {
            Rule::Minority => minority(window),
            Rule::Majority => majority(window),
            Rule::Repeat | Rule::Follow => match window.split_first() {
                Some((first, rest)) if rest.iter().all(|c| c == first) => follow(*first),
                _ => Signal::None,
            },
            Rule::TwinTowers => match window.split_first() {
                Some((Color::Red, run)) if !run.is_empty() && all_are(run, Color::Green) => {
                    Signal::Put
                }
                Some((Color::Green, run)) if !run.is_empty() && all_are(run, Color::Red) => {
                    Signal::Call
                }
                _ => Signal::None,
            },
            Rule::Flip => {
                if window.is_empty() {
                    Signal::None
                } else if all_are(window, Color::Green) {
                    Signal::Put
                } else if all_are(window, Color::Red) {
                    Signal::Call
                } else {
                    Signal::None
                }
            }
        }
    }
}

fn follow(color: Color) -> Signal {
    match color {
        Color::Green => Signal::Call,
        Color::Red => Signal::Put,
        Color::Doji => Signal::None,
    }
}

fn all_are(colors: &[Color], target: Color) -> bool {
    colors.iter().all(|c| *c == target)
}

/// A deterministic color-pattern strategy described by its gate, window and rule.
#[derive(Debug, Clone)]
pub struct PatternStrategy {
    id: &'static str,
    name: String,
    gate: Gate,
    /// Distances back from the trigger bar, oldest first.
    offsets: &'static [usize],
    rule: Rule,
}

impl PatternStrategy {
    /// Replace the display name, keeping the identifier.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn window(&self, candles: &CandleSequence, index: usize) -> Vec<Color> {
        self.offsets
            .iter()
            .map(|offset| candles.color(index - offset))
            .collect()
    }
}

impl Strategy for PatternStrategy {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn min_history(&self) -> usize {
        self.offsets.iter().copied().max().unwrap_or(0)
    }

    fn evaluate(&self, candles: &CandleSequence) -> Vec<StrategySignal> {
        candles
            .candles()
            .iter()
            .enumerate()
            .skip(self.min_history())
            .filter(|(_, candle)| self.gate.admits(candle.minute()))
            .map(|(i, _)| {
                let window = self.window(candles, i);
                StrategySignal::new(i, self.rule.decide(&window), window)
            })
            .collect()
    }
}

// ─── The catalog ──────────────────────────────────────────────────────────────

/// `(id, display name, gate, offsets oldest first, rule)` for every strategy.
const CATALOG: [(&str, &str, Gate, &[usize], Rule); 10] = [
    ("mhi1", "MHI 1", Gate::Phase(4), &[2, 1, 0], Rule::Minority),
    ("mhi2", "MHI 2", Gate::Phase(0), &[3, 2, 1], Rule::Minority),
    ("mhi3", "MHI 3", Gate::Phase(1), &[4, 3, 2], Rule::Minority),
    ("r7", "R7", Gate::Phase(0), &[7, 6], Rule::Repeat),
    ("torres_gemeas", "Torres Gemeas", Gate::Every, &[3, 2, 1, 0], Rule::TwinTowers),
    ("padrao_3x1", "Padrão 3x1", Gate::Phase(3), &[3, 2, 1], Rule::Minority),
    ("padrao_23", "Padrão 23", Gate::Phase(0), &[0], Rule::Follow),
    ("tres_mosqueteiros", "Três Mosqueteiros", Gate::Phase(2), &[2, 1, 0], Rule::Majority),
    ("melhor_de_3", "Melhor de 3", Gate::Phase(0), &[4, 3, 2], Rule::Majority),
    ("seven_flip", "Seven Flip", Gate::Every, &[6, 5, 4, 3, 2, 1, 0], Rule::Flip),
];

/// Identifiers of every catalog strategy, in presentation order.
pub fn catalog_ids() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(id, ..)| *id)
}

/// Look up a catalog strategy by identifier.
pub fn by_id(id: &str) -> Option<PatternStrategy> {
    CATALOG
        .iter()
        .find(|(candidate, ..)| *candidate == id)
        .map(|&(id, name, gate, offsets, rule)| PatternStrategy {
            id,
            name: name.to_string(),
            gate,
            offsets,
            rule,
        })
}

/// Every catalog strategy, in presentation order.
pub fn catalog() -> Vec<PatternStrategy> {
    catalog_ids().filter_map(by_id).collect()
}
