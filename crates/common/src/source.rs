use async_trait::async_trait;

use crate::{RawCandle, Result};

/// Abstraction over the price-data provider session.
///
/// `BinanceKlines` implements this against the public REST API. Tests use an
/// in-memory implementation.
///
/// The cataloger receives the session explicitly as an `Arc<dyn CandleSource>`;
/// nothing holds a provider handle as ambient state.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch the most recent `count` bars of `timeframe_secs` for an instrument,
    /// oldest first.
    async fn fetch_candles(
        &self,
        instrument: &str,
        timeframe_secs: u32,
        count: usize,
    ) -> Result<Vec<RawCandle>>;
}
