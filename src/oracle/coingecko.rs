//! CoinGecko simple price API
//!
//! GET {base}/simple/price?ids=ethereum&vs_currencies=usd
//! -> {"ethereum": {"usd": 3512.4}}

use async_trait::async_trait;
use eyre::{eyre, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use super::PriceSource;

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct CoinGeckoSource {
    http_client: Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// CoinGecko coin id for a token symbol
    fn coin_id(symbol: &str) -> Option<&'static str> {
        match symbol.to_uppercase().as_str() {
            "ETH" | "WETH" => Some("ethereum"),
            "WBTC" | "BTC" => Some("bitcoin"),
            "LINK" => Some("chainlink"),
            "AAVE" => Some("aave"),
            "USDC" => Some("usd-coin"),
            "USDT" => Some("tether"),
            _ => None,
        }
    }

    fn extract_usd(response: &SimplePriceResponse, id: &str) -> Result<f64> {
        response
            .get(id)
            .and_then(|prices| prices.get("usd"))
            .copied()
            .ok_or_else(|| eyre!("CoinGecko response has no usd price for {}", id))
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn fetch_reference_price(&self, symbol: &str) -> Result<f64> {
        let id = Self::coin_id(symbol).ok_or_else(|| eyre!("No CoinGecko id for {}", symbol))?;
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url.trim_end_matches('/'),
            id
        );

        let response: SimplePriceResponse = self
            .http_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Self::extract_usd(&response, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_ids() {
        assert_eq!(CoinGeckoSource::coin_id("ETH"), Some("ethereum"));
        assert_eq!(CoinGeckoSource::coin_id("weth"), Some("ethereum"));
        assert_eq!(CoinGeckoSource::coin_id("PEPE"), None);
    }

    #[test]
    fn test_extract_usd() {
        let body = r#"{"ethereum":{"usd":3512.4}}"#;
        let response: SimplePriceResponse = serde_json::from_str(body).unwrap();

        assert_eq!(CoinGeckoSource::extract_usd(&response, "ethereum").unwrap(), 3512.4);
        assert!(CoinGeckoSource::extract_usd(&response, "bitcoin").is_err());
    }
}
