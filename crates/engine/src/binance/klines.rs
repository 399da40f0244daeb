use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use common::{CandleSource, Error, RawCandle, Result};

/// Binance caps a single klines request at this many bars.
const MAX_LIMIT: usize = 1000;

/// Public REST kline client for Binance. No credentials are needed.
pub struct BinanceKlines {
    base_url: String,
    http: Client,
}

impl BinanceKlines {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    /// Binance interval code for a timeframe in seconds.
    pub fn interval_for(timeframe_secs: u32) -> Result<&'static str> {
        match timeframe_secs {
            60 => Ok("1m"),
            180 => Ok("3m"),
            300 => Ok("5m"),
            900 => Ok("15m"),
            1800 => Ok("30m"),
            3600 => Ok("1h"),
            14_400 => Ok("4h"),
            86_400 => Ok("1d"),
            other => Err(Error::Config(format!(
                "timeframe of {other}s has no Binance kline interval"
            ))),
        }
    }
}

#[async_trait]
impl CandleSource for BinanceKlines {
    async fn fetch_candles(
        &self,
        instrument: &str,
        timeframe_secs: u32,
        count: usize,
    ) -> Result<Vec<RawCandle>> {
        let interval = Self::interval_for(timeframe_secs)?;
        let limit = count.min(MAX_LIMIT).to_string();
        let url = format!("{}/api/v3/klines", self.base_url);

        debug!(instrument, interval, limit = %limit, "Fetching klines from Binance");
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("symbol", instrument),
                ("interval", interval),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Provider(format!("HTTP {status}: {body}")));
        }

        let rows: Vec<Vec<Value>> = serde_json::from_str(&body)?;
        rows.iter().map(|row| parse_kline(row)).collect()
    }
}

// ─── Response parsing ─────────────────────────────────────────────────────────

/// `[open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...]`
fn parse_kline(row: &[Value]) -> Result<RawCandle> {
    let open_time_ms = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::Provider("kline row has no open time".into()))?;

    let decimal = |i: usize| -> Result<f64> {
        row.get(i)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| Error::Provider(format!("kline field {i} is not a decimal string")))
    };

    Ok(RawCandle {
        timestamp: open_time_ms.div_euclid(1000),
        open: decimal(1)?,
        high: Some(decimal(2)?),
        low: Some(decimal(3)?),
        close: decimal(4)?,
        volume: Some(decimal(5)?),
    })
}
