//! Symbol list files: one ticker per line.
//!
//! Blank lines and `#` comments are skipped, surrounding whitespace is
//! trimmed. A line holding more than one token is rejected rather than
//! guessed at.

use super::provider::DataError;
use std::path::Path;

/// Load a symbol list from a file.
pub fn load_symbols(path: &Path) -> Result<Vec<String>, DataError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DataError::Config(format!("read symbol list {}: {e}", path.display())))?;
    parse_symbols(&content)
}

/// Parse a symbol list from a string.
pub fn parse_symbols(content: &str) -> Result<Vec<String>, DataError> {
    let mut symbols = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.contains(|c: char| c.is_whitespace() || c == ',') {
            return Err(DataError::Config(format!(
                "symbol list line {}: expected one symbol, got '{line}'",
                i + 1
            )));
        }
        symbols.push(line.to_string());
    }
    Ok(symbols)
}
