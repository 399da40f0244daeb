use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Strategy selection file (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// type = "mhi1"
///
/// [[strategy]]
/// type = "seven_flip"
/// name = "Seven Flip (M1)"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Catalog identifier, e.g. "mhi1" or "torres_gemeas".
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Display name override; the catalog name is used when absent.
    #[serde(default)]
    pub name: Option<String>,
}

impl StrategyFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Failed to parse strategy config at '{path}': {e}")))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}
