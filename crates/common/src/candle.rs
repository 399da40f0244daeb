use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Fewest bars an instrument must deliver before it is catalogued in a cycle.
pub const MIN_CANDLES: usize = 50;

/// Body direction of a single candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Green,
    Red,
    Doji,
}

impl Color {
    /// `Green` when price closed above the open, `Red` below, `Doji` when equal.
    pub fn from_prices(open: f64, close: f64) -> Self {
        if close > open {
            Color::Green
        } else if close < open {
            Color::Red
        } else {
            Color::Doji
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Green => write!(f, "GREEN"),
            Color::Red => write!(f, "RED"),
            Color::Doji => write!(f, "DOJI"),
        }
    }
}

/// A bar as delivered by a candle provider, before color derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandle {
    /// Bar start, seconds since the Unix epoch (UTC).
    pub timestamp: i64,
    pub open: f64,
    pub close: f64,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl RawCandle {
    pub fn new(timestamp: i64, open: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            close,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// One fixed-duration price bar with its color derived at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub close: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    color: Color,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, close: f64) -> Self {
        Self::from(RawCandle::new(timestamp, open, close))
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// UTC clock minute (0..60) of the bar start.
    pub fn minute(&self) -> u32 {
        self.timestamp.div_euclid(60).rem_euclid(60) as u32
    }
}

impl From<RawCandle> for Candle {
    fn from(raw: RawCandle) -> Self {
        Self {
            timestamp: raw.timestamp,
            open: raw.open,
            close: raw.close,
            high: raw.high,
            low: raw.low,
            volume: raw.volume,
            color: Color::from_prices(raw.open, raw.close),
        }
    }
}

/// Chronologically ordered candles for a single instrument.
///
/// Timestamps are strictly increasing. Gaps are allowed; strategies index
/// positionally and only read the clock for phase gating.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandleSequence {
    candles: Vec<Candle>,
}

impl CandleSequence {
    /// Wrap already-colored candles, rejecting out-of-order timestamps.
    pub fn new(candles: Vec<Candle>) -> Result<Self> {
        if let Some(index) = candles
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            let prev = candles[index].timestamp;
            let next = candles[index + 1].timestamp;
            return Err(Error::MalformedCandles {
                index: index + 1,
                reason: format!("timestamp {next} does not follow {prev}"),
            });
        }
        Ok(Self { candles })
    }

    pub fn from_raw(raw: Vec<RawCandle>) -> Result<Self> {
        Self::new(raw.into_iter().map(Candle::from).collect())
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Color of the bar at `index`. Callers index inside `0..len()`.
    pub fn color(&self, index: usize) -> Color {
        self.candles[index].color()
    }

    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.candles.iter().map(Candle::color)
    }

    pub fn has_min_history(&self, min: usize) -> bool {
        self.candles.len() >= min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_derived_from_open_and_close() {
        assert_eq!(Candle::new(0, 1.0, 1.5).color(), Color::Green);
        assert_eq!(Candle::new(0, 1.5, 1.0).color(), Color::Red);
        assert_eq!(Candle::new(0, 1.2, 1.2).color(), Color::Doji);
    }

    #[test]
    fn minute_follows_utc_clock() {
        // 2024-01-01T12:04:00Z
        assert_eq!(Candle::new(1_704_110_640, 1.0, 1.0).minute(), 4);
        assert_eq!(Candle::new(59 * 60, 1.0, 1.0).minute(), 59);
        assert_eq!(Candle::new(60 * 60, 1.0, 1.0).minute(), 0);
        // One minute before the epoch is 23:59.
        assert_eq!(Candle::new(-60, 1.0, 1.0).minute(), 59);
    }

    #[test]
    fn sequence_rejects_non_increasing_timestamps() {
        let raw = vec![
            RawCandle::new(0, 1.0, 2.0),
            RawCandle::new(60, 1.0, 2.0),
            RawCandle::new(60, 1.0, 2.0),
        ];
        match CandleSequence::from_raw(raw) {
            Err(Error::MalformedCandles { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected MalformedCandles, got {other:?}"),
        }
    }

    #[test]
    fn sequence_tolerates_gaps() {
        let raw = vec![
            RawCandle::new(0, 1.0, 2.0),
            RawCandle::new(60, 2.0, 1.0),
            RawCandle::new(300, 1.0, 1.0),
        ];
        let seq = CandleSequence::from_raw(raw).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(
            seq.colors().collect::<Vec<_>>(),
            vec![Color::Green, Color::Red, Color::Doji]
        );
    }

    #[test]
    fn empty_sequence_is_valid_but_short() {
        let seq = CandleSequence::new(Vec::new()).unwrap();
        assert!(seq.is_empty());
        assert!(!seq.has_min_history(MIN_CANDLES));
    }

    #[test]
    fn raw_candle_deserializes_without_optional_fields() {
        let raw: RawCandle =
            serde_json::from_str(r#"{"timestamp": 120, "open": 1.1, "close": 1.0}"#).unwrap();
        assert_eq!(Candle::from(raw).color(), Color::Red);
    }
}
