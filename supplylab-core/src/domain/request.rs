use super::window::Window;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One (asset, fiat, window) triple. Identifies exactly one persisted series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    pub asset_id: String,
    pub fiat: String,
    pub window: Window,
}

impl FetchRequest {
    pub fn new(asset_id: impl Into<String>, fiat: impl Into<String>, window: Window) -> Self {
        Self {
            asset_id: asset_id.into(),
            fiat: fiat.into(),
            window,
        }
    }

    /// Storage key: `{asset_id}_{fiat}_{window}`.
    pub fn storage_key(&self) -> String {
        format!("{}_{}_{}", self.asset_id, self.fiat, self.window)
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({} days)", self.asset_id, self.fiat, self.window)
    }
}
