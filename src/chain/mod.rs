//! On-chain capabilities consumed by the quote engine
//!
//! The engine only sees these traits. `uniswap` provides the alloy-backed
//! implementations talking to the V3 factory, pools and both quoter versions.

mod uniswap;

pub use uniswap::{
    check_connectivity, connect_http, ChainStatus, ConnectivityError, QuoterV1, QuoterV2, UniswapV3Factory,
};

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

// ============================================
// FEE TIERS
// ============================================

/// Pool fee in parts-per-million (3000 = 0.30%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeTier(pub u32);

impl FeeTier {
    pub const DEFAULT_TIERS: [FeeTier; 4] = [FeeTier(100), FeeTier(500), FeeTier(3000), FeeTier(10000)];

    /// Fee as a fraction of the notional (3000 -> 0.003)
    pub fn as_fraction(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }
}

impl std::fmt::Display for FeeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}

/// Result of a path quote (QuoterV2 also reports gas)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathQuote {
    pub amount_out: U256,
    pub gas_estimate: u64,
}

// ============================================
// CAPABILITIES
// ============================================

#[async_trait]
pub trait PoolDirectory: Send + Sync {
    /// Pool address for the pair at `fee`, `None` when not deployed
    async fn get_pool(&self, token_a: Address, token_b: Address, fee: FeeTier) -> Result<Option<Address>>;
}

#[async_trait]
pub trait LiquidityView: Send + Sync {
    async fn get_liquidity(&self, pool: Address) -> Result<u128>;
}

#[async_trait]
pub trait SingleHopQuoter: Send + Sync {
    async fn quote_single_hop(
        &self,
        token_in: Address,
        token_out: Address,
        fee: FeeTier,
        amount_in: U256,
    ) -> Result<U256>;
}

#[async_trait]
pub trait PathQuoter: Send + Sync {
    async fn quote_path(&self, path: &Bytes, amount_in: U256) -> Result<PathQuote>;
}

#[async_trait]
pub trait GasPriceSource: Send + Sync {
    /// Current gas price in wei
    async fn current_gas_price(&self) -> Result<u128>;
}

/// Whichever quoter variants are configured. Either may be missing.
#[derive(Clone, Default)]
pub struct QuoterSet {
    pub single_hop: Option<Arc<dyn SingleHopQuoter>>,
    pub path: Option<Arc<dyn PathQuoter>>,
}

impl QuoterSet {
    pub fn new(single_hop: Option<Arc<dyn SingleHopQuoter>>, path: Option<Arc<dyn PathQuoter>>) -> Self {
        Self { single_hop, path }
    }

    pub fn is_empty(&self) -> bool {
        self.single_hop.is_none() && self.path.is_none()
    }
}

// ============================================
// HELPERS
// ============================================

/// Uniswap V3 single-pool path: tokenIn (20) | fee (3, big-endian) | tokenOut (20)
pub fn encode_v3_path(token_in: Address, fee: FeeTier, token_out: Address) -> Bytes {
    let mut path = Vec::with_capacity(43);
    path.extend_from_slice(token_in.as_slice());
    path.extend_from_slice(&fee.0.to_be_bytes()[1..]);
    path.extend_from_slice(token_out.as_slice());
    Bytes::from(path)
}

/// Bound a network call so a hung endpoint can't pin a worker forever
pub async fn with_timeout<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(eyre!("{} timed out after {:?}", what, timeout)),
    }
}

/// Lossy U256 -> f64 for price math
pub fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}
