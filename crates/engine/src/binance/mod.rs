pub mod klines;

pub use klines::BinanceKlines;
