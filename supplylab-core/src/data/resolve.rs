//! Ticker symbol → provider asset id resolution.
//!
//! One symbol can map to several ids (wrapped and bridged tokens share
//! tickers), so every match is kept, in catalog order.

use super::provider::{CatalogEntry, DataError, MarketDataProvider};

/// Resolve symbols against the provider's catalog, fetched once.
///
/// Output order: input symbol order first, catalog order within a symbol.
/// Symbols with no match contribute nothing.
pub fn resolve_ids<S: AsRef<str>>(
    provider: &dyn MarketDataProvider,
    symbols: &[S],
) -> Result<Vec<String>, DataError> {
    let catalog = provider.catalog()?;
    tracing::debug!(entries = catalog.len(), provider = provider.name(), "catalog loaded");
    Ok(resolve_in_catalog(&catalog, symbols))
}

/// Case-sensitive symbol matching against an already-fetched catalog.
pub fn resolve_in_catalog<S: AsRef<str>>(catalog: &[CatalogEntry], symbols: &[S]) -> Vec<String> {
    let mut ids = Vec::new();
    for symbol in symbols {
        let symbol = symbol.as_ref();
        let before = ids.len();
        ids.extend(
            catalog
                .iter()
                .filter(|entry| entry.symbol == symbol)
                .map(|entry| entry.id.clone()),
        );
        if ids.len() == before {
            tracing::warn!(symbol, "no catalog entry for symbol");
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, symbol: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.into(),
            symbol: symbol.into(),
            name: id.to_uppercase(),
        }
    }

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            entry("bitcoin", "BTC"),
            entry("ethereum", "ETH"),
            entry("weth", "ETH"),
            entry("bridged-ether", "ETH"),
            entry("cardano", "ADA"),
        ]
    }

    #[test]
    fn single_match() {
        assert_eq!(resolve_in_catalog(&catalog(), &["BTC"]), vec!["bitcoin"]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        assert!(resolve_in_catalog(&catalog(), &["NOPE"]).is_empty());
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(resolve_in_catalog(&catalog(), &["btc"]).is_empty());
    }

    #[test]
    fn one_to_many_in_catalog_order_after_input_order() {
        let ids = resolve_in_catalog(&catalog(), &["ADA", "ETH", "NOPE", "BTC"]);
        assert_eq!(
            ids,
            vec!["cardano", "ethereum", "weth", "bridged-ether", "bitcoin"]
        );
    }
}
