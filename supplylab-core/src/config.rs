//! Run configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock nine-asset USD download into `data_download/`.

use crate::data::coingecko::DEFAULT_BASE_URL;
use crate::data::DataError;
use crate::domain::{FetchRequest, Window};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Assets fetched when none are configured.
pub const DEFAULT_ASSETS: [&str; 9] = [
    "bitcoin",
    "ethereum",
    "binancecoin",
    "cardano",
    "dogecoin",
    "polkadot",
    "ripple",
    "uniswap",
    "litecoin",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupplyConfig {
    /// Provider asset ids, in output column order.
    pub assets: Vec<String>,
    /// Fiat denomination, e.g. "usd".
    pub fiat: String,
    /// Lookback window in days, or "max".
    pub window: Window,
    /// Store root for series and combined output.
    pub output_dir: PathBuf,
    /// Upper bound on concurrent fetches.
    pub max_workers: usize,
    /// Per-request HTTP deadline.
    pub request_timeout_secs: u64,
    pub api_base_url: String,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            fiat: "usd".into(),
            window: Window::Days(10000),
            output_dir: PathBuf::from("data_download"),
            max_workers: 4,
            request_timeout_secs: 30,
            api_base_url: DEFAULT_BASE_URL.into(),
        }
    }
}

impl SupplyConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Config(format!("read config {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DataError::Config(format!("parse config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to TOML.
    pub fn to_toml(&self) -> Result<String, DataError> {
        toml::to_string_pretty(self).map_err(|e| DataError::Config(format!("serialize config: {e}")))
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.fiat.trim().is_empty() {
            return Err(DataError::Config("fiat must not be empty".into()));
        }
        if self.max_workers == 0 {
            return Err(DataError::Config("max_workers must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(DataError::Config("request_timeout_secs must be at least 1".into()));
        }
        if let Some(bad) = self.assets.iter().find(|a| !is_valid_asset_id(a)) {
            return Err(DataError::Config(format!(
                "invalid asset id '{bad}': expected letters, digits, '-', '_' or '.'"
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.assets.iter().find(|a| !seen.insert(*a)) {
            return Err(DataError::Config(format!("asset '{dup}' is listed more than once")));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// One fetch request per configured asset, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.assets
            .iter()
            .map(|a| FetchRequest::new(a.as_str(), self.fiat.as_str(), self.window))
            .collect()
    }
}

/// Asset ids become file names and URL path segments.
fn is_valid_asset_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
