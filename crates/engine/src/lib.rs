pub mod backtest;
pub mod binance;
pub mod lifecycle;
pub mod report;

pub use backtest::{backtest, DEFAULT_MARTINGALE_DEPTH};
pub use binance::BinanceKlines;
pub use lifecycle::{CatalogHandle, CatalogSettings, Cataloger};
pub use report::{evaluate_instrument, evaluate_strategy, sort_reports, summary_lines, SnapshotBuilder};
