use crate::{Error, Result, MIN_CANDLES};

const DEFAULT_INSTRUMENTS: &str = "BTCUSDT,ETHUSDT,BNBUSDT,SOLUSDT,XRPUSDT";
const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";

/// Deepest martingale recovery the engine accepts.
pub const MAX_MARTINGALE_DEPTH: usize = 5;

/// All configuration loaded from environment variables at startup.
/// Every variable has a default; malformed values are reported as `Error::Config`.
#[derive(Debug, Clone)]
pub struct Config {
    // Instruments
    pub base_instruments: Vec<String>,
    /// Also catalogue a `<SYMBOL>-OTC` variant of every base symbol.
    pub include_otc: bool,

    // Candle window
    pub timeframe_secs: u32,
    pub candle_count: usize,

    // Backtest
    pub martingale_depth: usize,

    // Scheduling
    pub refresh_secs: u64,

    // Dashboard
    pub dashboard_port: u16,

    // Provider
    pub binance_base_url: String,

    // Optional strategy selection file
    pub strategy_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_instruments: split_list(DEFAULT_INSTRUMENTS),
            include_otc: false,
            timeframe_secs: 60,
            candle_count: 240,
            martingale_depth: 2,
            refresh_secs: 120,
            dashboard_port: 5000,
            binance_base_url: DEFAULT_BINANCE_URL.to_string(),
            strategy_config_path: None,
        }
    }
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_instruments = match lookup("CATALOG_INSTRUMENTS") {
            Some(list) => split_list(&list),
            None => defaults.base_instruments,
        };
        if base_instruments.is_empty() {
            return Err(Error::Config("CATALOG_INSTRUMENTS is empty".into()));
        }

        let include_otc = match lookup("CATALOG_INCLUDE_OTC") {
            Some(v) => parse_bool("CATALOG_INCLUDE_OTC", &v)?,
            None => defaults.include_otc,
        };

        let timeframe_secs = parse_or("CATALOG_TIMEFRAME_SECS", &lookup, defaults.timeframe_secs)?;
        if timeframe_secs == 0 {
            return Err(Error::Config("CATALOG_TIMEFRAME_SECS must be positive".into()));
        }

        let candle_count = parse_or("CATALOG_CANDLE_COUNT", &lookup, defaults.candle_count)?;
        if candle_count < MIN_CANDLES {
            return Err(Error::Config(format!(
                "CATALOG_CANDLE_COUNT must be at least {MIN_CANDLES}, got {candle_count}"
            )));
        }

        let martingale_depth =
            parse_or("CATALOG_MARTINGALE_DEPTH", &lookup, defaults.martingale_depth)?;
        if martingale_depth > MAX_MARTINGALE_DEPTH {
            return Err(Error::Config(format!(
                "CATALOG_MARTINGALE_DEPTH must be at most {MAX_MARTINGALE_DEPTH}, got {martingale_depth}"
            )));
        }

        let refresh_secs = parse_or("CATALOG_REFRESH_SECS", &lookup, defaults.refresh_secs)?;
        if refresh_secs == 0 {
            return Err(Error::Config("CATALOG_REFRESH_SECS must be positive".into()));
        }

        Ok(Config {
            base_instruments,
            include_otc,
            timeframe_secs,
            candle_count,
            martingale_depth,
            refresh_secs,
            dashboard_port: parse_or("DASHBOARD_PORT", &lookup, defaults.dashboard_port)?,
            binance_base_url: lookup("BINANCE_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.binance_base_url),
            strategy_config_path: lookup("STRATEGY_CONFIG_PATH").filter(|p| !p.trim().is_empty()),
        })
    }

    /// Base symbols followed by their OTC variants when enabled.
    pub fn instruments(&self) -> Vec<String> {
        let mut all = self.base_instruments.clone();
        if self.include_otc {
            all.extend(self.base_instruments.iter().map(|s| format!("{s}-OTC")));
        }
        all
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{key} must be a boolean, got '{other}'"))),
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'"))),
        None => Ok(default),
    }
}
