//! Symbol lookup against the Finnhub search API, with a small static
//! fallback list when the lookup is unavailable.

use reqwest::Client;
use serde::{Deserialize, Serialize};

const FINNHUB_BASE: &str = "https://finnhub.io";
const MAX_RESULTS: usize = 10;

const FALLBACK_SYMBOLS: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("TSLA", "Tesla, Inc."),
    ("AMZN", "Amazon.com, Inc."),
];

#[derive(Debug, Clone, Serialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub display_symbol: String,
}

#[derive(Deserialize)]
struct FinnhubSearchResponse {
    #[serde(default)]
    result: Vec<FinnhubSymbol>,
}

#[derive(Deserialize)]
struct FinnhubSymbol {
    symbol: String,
    description: String,
    #[serde(rename = "displaySymbol")]
    display_symbol: String,
    #[serde(default, rename = "type")]
    kind: String,
}

pub struct SymbolSearch {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SymbolSearch {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: FINNHUB_BASE.into(),
            api_key,
        }
    }

    /// Search symbols by free-text query. Any upstream failure degrades to
    /// the static fallback list filtered by the query.
    pub async fn search(&self, query: &str) -> Vec<SymbolMatch> {
        match self.search_finnhub(query).await {
            Ok(results) if !results.is_empty() => results,
            Ok(_) => {
                tracing::debug!(query = %query, "symbol lookup returned nothing, using fallback");
                fallback_matches(query)
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "symbol lookup failed, using fallback");
                fallback_matches(query)
            }
        }
    }

    async fn search_finnhub(&self, query: &str) -> anyhow::Result<Vec<SymbolMatch>> {
        let Some(key) = self.api_key.as_deref() else {
            anyhow::bail!("no Finnhub API key configured");
        };

        let url = format!("{}/api/v1/search", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("q", query), ("token", key)])
            .send()
            .await?
            .error_for_status()?;

        let body: FinnhubSearchResponse = resp.json().await?;
        let results = body
            .result
            .into_iter()
            .filter(|s| s.kind == "Common Stock" || s.kind.is_empty())
            .take(MAX_RESULTS)
            .map(|s| SymbolMatch {
                symbol: s.symbol,
                name: s.description,
                display_symbol: s.display_symbol,
            })
            .collect();
        Ok(results)
    }
}

fn fallback_matches(query: &str) -> Vec<SymbolMatch> {
    let q = query.to_lowercase();
    FALLBACK_SYMBOLS
        .iter()
        .filter(|(symbol, name)| {
            symbol.to_lowercase().contains(&q) || name.to_lowercase().contains(&q)
        })
        .map(|(symbol, name)| SymbolMatch {
            symbol: (*symbol).into(),
            name: (*name).into(),
            display_symbol: (*symbol).into(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_filters_by_symbol_and_name() {
        let by_symbol = fallback_matches("aap");
        assert_eq!(by_symbol.len(), 1);
        assert_eq!(by_symbol[0].symbol, "AAPL");

        let by_name = fallback_matches("micro");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].symbol, "MSFT");

        assert!(fallback_matches("zzz").is_empty());
    }

    #[tokio::test]
    async fn test_search_without_key_degrades_to_fallback() {
        let search = SymbolSearch::new(Client::new(), None);
        let results = search.search("tesla").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "TSLA");
    }
}
