//! Minority / majority color voting over a small candle window.
//!
//! `Doji` candles count toward neither side, so a window such as
//! `[Green, Red, Doji]` is a tie and yields `Signal::None`.

use common::{Color, Signal};

fn tally(colors: &[Color]) -> (usize, usize) {
    colors.iter().fold((0, 0), |(green, red), c| match c {
        Color::Green => (green + 1, red),
        Color::Red => (green, red + 1),
        Color::Doji => (green, red),
    })
}

/// Bet on the color that appeared least: `Call` when green is the minority.
pub fn minority(colors: &[Color]) -> Signal {
    let (green, red) = tally(colors);
    if green < red {
        Signal::Call
    } else if red < green {
        Signal::Put
    } else {
        Signal::None
    }
}

/// Bet on the color that appeared most: `Call` when green is the majority.
pub fn majority(colors: &[Color]) -> Signal {
    let (green, red) = tally(colors);
    if green > red {
        Signal::Call
    } else if red > green {
        Signal::Put
    } else {
        Signal::None
    }
}
