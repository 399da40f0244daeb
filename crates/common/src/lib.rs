pub mod candle;
pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use candle::{Candle, CandleSequence, Color, RawCandle, MIN_CANDLES};
pub use config::Config;
pub use error::{Error, Result};
pub use source::CandleSource;
pub use types::*;
