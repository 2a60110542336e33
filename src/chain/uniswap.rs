//! Uniswap V3 contracts via Provider eth_call
//!
//! Factory `getPool`, pool `liquidity()`, Quoter V1 `quoteExactInputSingle`
//! and QuoterV2 `quoteExactInput`. The quoters are non-view functions that
//! revert with the result internally, so eth_call is the only way to use them.
//!
//! Timeouts are applied by the caller (`chain::with_timeout`).

use alloy_primitives::aliases::{U160, U24};
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::{with_timeout, FeeTier, LiquidityView, PathQuote, PathQuoter, PoolDirectory, SingleHopQuoter};

// ============================================
// SOLIDITY INTERFACES
// ============================================

sol! {
    /// Uniswap V3 Factory
    #[derive(Debug)]
    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }

    /// Uniswap V3 Pool (liquidity only)
    #[derive(Debug)]
    interface IUniswapV3Pool {
        function liquidity() external view returns (uint128);
    }

    /// Uniswap V3 Quoter (V1) - amount only
    #[derive(Debug)]
    interface IQuoter {
        function quoteExactInputSingle(
            address tokenIn,
            address tokenOut,
            uint24 fee,
            uint256 amountIn,
            uint160 sqrtPriceLimitX96
        ) external returns (uint256 amountOut);
    }

    /// Uniswap V3 QuoterV2 - path quote with gas estimate
    #[derive(Debug)]
    interface IQuoterV2 {
        function quoteExactInput(bytes memory path, uint256 amountIn)
            external
            returns (
                uint256 amountOut,
                uint160[] memory sqrtPriceX96AfterList,
                uint32[] memory initializedTicksCrossedList,
                uint256 gasEstimate
            );
    }
}

/// Build a type-erased HTTP provider for `rpc_url`
pub fn connect_http(rpc_url: &str) -> Result<DynProvider> {
    let url: alloy_transport_http::reqwest::Url = rpc_url
        .parse()
        .map_err(|e| eyre!("Invalid RPC URL: {}", e))?;
    Ok(ProviderBuilder::new().connect_http(url).erased())
}

async fn eth_call(provider: &DynProvider, to: Address, calldata: Vec<u8>) -> Result<Bytes> {
    let tx = TransactionRequest::default().to(to).input(calldata.into());

    provider
        .call(tx)
        .await
        .map_err(|e| eyre!("eth_call to {} failed: {}", to, e))
}

// ============================================
// FACTORY + POOL
// ============================================

#[derive(Clone)]
pub struct UniswapV3Factory {
    provider: DynProvider,
    factory: Address,
}

impl UniswapV3Factory {
    pub fn new(provider: DynProvider, factory: Address) -> Self {
        Self { provider, factory }
    }
}

#[async_trait]
impl PoolDirectory for UniswapV3Factory {
    async fn get_pool(&self, token_a: Address, token_b: Address, fee: FeeTier) -> Result<Option<Address>> {
        let calldata = IUniswapV3Factory::getPoolCall {
            tokenA: token_a,
            tokenB: token_b,
            fee: U24::from(fee.0),
        }
        .abi_encode();

        let output = eth_call(&self.provider, self.factory, calldata).await?;
        let pool = IUniswapV3Factory::getPoolCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode getPool: {}", e))?;

        Ok((pool != Address::ZERO).then_some(pool))
    }
}

#[async_trait]
impl LiquidityView for UniswapV3Factory {
    async fn get_liquidity(&self, pool: Address) -> Result<u128> {
        let calldata = IUniswapV3Pool::liquidityCall {}.abi_encode();
        let output = eth_call(&self.provider, pool, calldata).await?;

        IUniswapV3Pool::liquidityCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode liquidity: {}", e))
    }
}

// ============================================
// QUOTERS
// ============================================

/// Quoter V1 - `quoteExactInputSingle`, amount out only
#[derive(Clone)]
pub struct QuoterV1 {
    provider: DynProvider,
    address: Address,
}

impl QuoterV1 {
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl SingleHopQuoter for QuoterV1 {
    async fn quote_single_hop(
        &self,
        token_in: Address,
        token_out: Address,
        fee: FeeTier,
        amount_in: U256,
    ) -> Result<U256> {
        debug!("QuoterV1: {} -> {} @ {}, amount: {}", token_in, token_out, fee, amount_in);

        let calldata = IQuoter::quoteExactInputSingleCall {
            tokenIn: token_in,
            tokenOut: token_out,
            fee: U24::from(fee.0),
            amountIn: amount_in,
            sqrtPriceLimitX96: U160::ZERO,
        }
        .abi_encode();

        let output = eth_call(&self.provider, self.address, calldata).await?;

        IQuoter::quoteExactInputSingleCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode quoter output: {}", e))
    }
}

/// QuoterV2 - `quoteExactInput` over an encoded path, returns a gas estimate
#[derive(Clone)]
pub struct QuoterV2 {
    provider: DynProvider,
    address: Address,
}

impl QuoterV2 {
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl PathQuoter for QuoterV2 {
    async fn quote_path(&self, path: &Bytes, amount_in: U256) -> Result<PathQuote> {
        debug!("QuoterV2: path 0x{}, amount: {}", hex::encode(path), amount_in);

        let calldata = IQuoterV2::quoteExactInputCall {
            path: path.clone(),
            amountIn: amount_in,
        }
        .abi_encode();

        let output = eth_call(&self.provider, self.address, calldata).await?;
        let decoded = IQuoterV2::quoteExactInputCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode QuoterV2 output: {}", e))?;

        Ok(PathQuote {
            amount_out: decoded.amountOut,
            gas_estimate: u64::try_from(decoded.gasEstimate).unwrap_or(u64::MAX),
        })
    }
}

// ============================================
// STARTUP CONNECTIVITY
// ============================================

#[derive(Debug, Clone, Copy)]
pub struct ChainStatus {
    pub chain_id: u64,
    pub block_number: u64,
}

/// Startup connectivity failure. The collector must not run without a node.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("could not reach RPC endpoint: {0}")]
    Unreachable(String),

    #[error("RPC endpoint is on chain {actual}, expected {expected}")]
    WrongChain { expected: u64, actual: u64 },
}

/// Read chain id and head block; both must answer within `timeout`
pub async fn check_connectivity(
    provider: &DynProvider,
    expected_chain_id: u64,
    timeout: Duration,
) -> std::result::Result<ChainStatus, ConnectivityError> {
    let chain_id = with_timeout(timeout, "eth_chainId", async {
        provider.get_chain_id().await.map_err(|e| eyre!(e))
    })
    .await
    .map_err(|e| ConnectivityError::Unreachable(e.to_string()))?;

    if chain_id != expected_chain_id {
        return Err(ConnectivityError::WrongChain {
            expected: expected_chain_id,
            actual: chain_id,
        });
    }

    let block_number = with_timeout(timeout, "eth_blockNumber", async {
        provider.get_block_number().await.map_err(|e| eyre!(e))
    })
    .await
    .map_err(|e| ConnectivityError::Unreachable(e.to_string()))?;

    info!("Connected to chain {} at block {}", chain_id, block_number);

    Ok(ChainStatus {
        chain_id,
        block_number,
    })
}
