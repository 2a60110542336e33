//! Gas Price Oracle - Etherscan API + RPC
//!
//! Fetches the current gas price, Etherscan first (when an API key is set),
//! then the RPC provider. There is no hardcoded fallback here: when both fail
//! the caller decides (the scheduler runs the cycle without a gas hint and
//! each quote resolves the price on demand).
//!
//! API: https://api.etherscan.io/v2/api?chainid=1&module=proxy&action=eth_gasPrice

use alloy_provider::{DynProvider, Provider};
use async_trait::async_trait;
use eyre::{eyre, Result};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::cache::TtlCache;
use crate::chain::GasPriceSource;

// ============================================
// CONSTANTS
// ============================================

/// Etherscan API base URL (v2 supports multiple chains)
const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Minimum sane gas price (0.01 gwei)
const MIN_GAS_WEI: u128 = 10_000_000;

/// Maximum sane gas price (1000 gwei - during extreme congestion)
const MAX_GAS_WEI: u128 = 1_000_000_000_000;

// ============================================
// API RESPONSE TYPES
// ============================================

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    result: Option<String>,
    error: Option<EtherscanError>,
}

#[derive(Debug, Deserialize)]
struct EtherscanError {
    code: i64,
    message: String,
}

// ============================================
// CACHED GAS PRICE
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasSource {
    Etherscan,
    RpcProvider,
}

impl std::fmt::Display for GasSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GasSource::Etherscan => write!(f, "Etherscan"),
            GasSource::RpcProvider => write!(f, "RPC"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GasPriceInfo {
    /// Gas price in wei
    pub gas_price_wei: u128,

    /// Source of the data
    pub source: GasSource,
}

impl GasPriceInfo {
    pub fn gwei(&self) -> f64 {
        self.gas_price_wei as f64 / 1e9
    }
}

/// Gas cost of `gas_units` at `gas_price_wei`, in native units (ETH)
pub fn gas_cost_native(gas_units: u64, gas_price_wei: u128) -> f64 {
    (gas_units as f64) * (gas_price_wei as f64) / 1e18
}

/// Parse an `eth_gasPrice` hex quantity
fn parse_hex_wei(raw: &str) -> Result<u128> {
    u128::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| eyre!("Failed to parse gas price {:?}: {}", raw, e))
}

/// Within [0.01, 1000] gwei. Out-of-range prices are still recorded as reported.
pub fn is_sane_gas_price(wei: u128) -> bool {
    (MIN_GAS_WEI..=MAX_GAS_WEI).contains(&wei)
}

// ============================================
// GAS ORACLE
// ============================================

pub struct GasOracle {
    http_client: Client,
    api_key: Option<String>,
    chain_id: u64,
    provider: DynProvider,
    cache: Arc<TtlCache<GasPriceInfo>>,
}

impl GasOracle {
    /// Create a new GasOracle sharing `cache`
    pub fn new(
        api_key: Option<String>,
        chain_id: u64,
        provider: DynProvider,
        http_timeout: Duration,
        cache: Arc<TtlCache<GasPriceInfo>>,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http_client,
            api_key,
            chain_id,
            provider,
            cache,
        })
    }

    /// Get current gas price (with caching)
    pub async fn get_gas_price(&self) -> Result<GasPriceInfo> {
        if let Some(info) = self.cache.fresh_at(Instant::now()).await {
            trace!("Using cached gas price: {:.2} gwei", info.gwei());
            return Ok(info);
        }

        let info = self.fetch_gas_price().await?;
        if !is_sane_gas_price(info.gas_price_wei) {
            warn!(
                "⚠️  {} reported an unusual gas price: {} wei ({:.4} gwei)",
                info.source,
                info.gas_price_wei,
                info.gwei()
            );
        }
        self.cache.store_at(info, Instant::now()).await;
        Ok(info)
    }

    /// Etherscan first (if we have an API key), then RPC
    async fn fetch_gas_price(&self) -> Result<GasPriceInfo> {
        if let Some(ref api_key) = self.api_key {
            match self.fetch_from_etherscan(api_key).await {
                Ok(info) => {
                    debug!("⛽ Gas from Etherscan: {:.2} gwei", info.gwei());
                    return Ok(info);
                }
                Err(e) => {
                    warn!("Etherscan gas fetch failed: {}", e);
                }
            }
        }

        let info = self.fetch_from_rpc().await?;
        debug!("⛽ Gas from RPC: {:.2} gwei", info.gwei());
        Ok(info)
    }

    /// Fetch gas price from Etherscan API
    async fn fetch_from_etherscan(&self, api_key: &str) -> Result<GasPriceInfo> {
        let url = format!(
            "{}?chainid={}&module=proxy&action=eth_gasPrice&apikey={}",
            ETHERSCAN_API_URL, self.chain_id, api_key
        );

        let response: EtherscanResponse = self.http_client.get(&url).send().await?.json().await?;

        if let Some(error) = response.error {
            return Err(eyre!("Etherscan error: {} (code {})", error.message, error.code));
        }

        let result = response.result.ok_or_else(|| eyre!("No result from Etherscan"))?;

        Ok(GasPriceInfo {
            gas_price_wei: parse_hex_wei(&result)?,
            source: GasSource::Etherscan,
        })
    }

    /// Fetch gas price from RPC provider
    async fn fetch_from_rpc(&self) -> Result<GasPriceInfo> {
        let gas_price_wei = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| eyre!("eth_gasPrice failed: {}", e))?;

        Ok(GasPriceInfo {
            gas_price_wei,
            source: GasSource::RpcProvider,
        })
    }
}

#[async_trait]
impl GasPriceSource for GasOracle {
    async fn current_gas_price(&self) -> Result<u128> {
        self.get_gas_price().await.map(|info| info.gas_price_wei)
    }
}

// ============================================
// TESTS
// ============================================
