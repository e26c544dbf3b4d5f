//! Lookback window for a market-chart request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much history to request: a positive day count or everything the
/// provider has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WindowRepr", into = "WindowRepr")]
pub enum Window {
    Days(u32),
    Max,
}

impl Window {
    /// Build a day-count window, rejecting zero.
    pub fn days(n: u32) -> Result<Self, String> {
        if n == 0 {
            Err("window must be at least 1 day".into())
        } else {
            Ok(Window::Days(n))
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Days(n) => write!(f, "{n}"),
            Window::Max => f.write_str("max"),
        }
    }
}

impl FromStr for Window {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("max") {
            return Ok(Window::Max);
        }
        let n: u32 = s
            .parse()
            .map_err(|e| format!("invalid window '{s}': {e}"))?;
        Window::days(n)
    }
}

/// TOML/JSON shape: either a bare integer or the string "max".
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WindowRepr {
    Days(u32),
    Text(String),
}

impl TryFrom<WindowRepr> for Window {
    type Error = String;

    fn try_from(repr: WindowRepr) -> Result<Self, Self::Error> {
        match repr {
            WindowRepr::Days(n) => Window::days(n),
            WindowRepr::Text(s) => s.parse(),
        }
    }
}

impl From<Window> for WindowRepr {
    fn from(w: Window) -> Self {
        match w {
            Window::Days(n) => WindowRepr::Days(n),
            Window::Max => WindowRepr::Text("max".into()),
        }
    }
}
