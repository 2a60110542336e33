use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};

use super::QuoteError;
use crate::chain::FeeTier;
use crate::tokens::Token;

/// One (pair, notional) unit of work within a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub token_in: Token,
    pub token_out: Token,
    pub notional_usd: f64,
    pub cycle_timestamp: DateTime<Utc>,
}

impl QuoteRequest {
    pub fn new(token_in: Token, token_out: Token, notional_usd: f64, cycle_timestamp: DateTime<Utc>) -> Self {
        Self {
            token_in,
            token_out,
            notional_usd,
            cycle_timestamp,
        }
    }

    /// "USDC->ETH"
    pub fn direction(&self) -> String {
        format!("{}->{}", self.token_in.symbol, self.token_out.symbol)
    }
}

/// Pool found by the resolver. Refetched on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCandidate {
    pub fee_tier: FeeTier,
    pub pool_address: Address,
    /// `None` when the liquidity lookup failed and the pool was taken optimistically
    pub liquidity: Option<u128>,
}

/// A validated quote. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct QuoteResult {
    pub request: QuoteRequest,
    pub quoted_at: DateTime<Utc>,

    pub fee_tier: FeeTier,
    pub pool_address: Option<Address>,

    pub amount_in: U256,
    pub amount_out: U256,
    /// amount_out scaled by the output token decimals
    pub received: f64,
    /// notional / received
    pub price: f64,

    pub pool_fee_usd: f64,
    pub interface_fee_usd: f64,

    pub gas_estimate: u64,
    pub gas_price_wei: u128,
    pub gas_cost_native: f64,
    pub gas_cost_usd: f64,
    /// ETH/USD snapshot used for gas_cost_usd
    pub native_price_usd: f64,

    pub effective_price: f64,

    /// `None` when the probe quote could not be obtained
    pub slippage_pct: Option<f64>,
}

/// Outcome of quoting one fee tier
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(Box<QuoteResult>),
    /// Move on to the next tier
    Retry(QuoteError),
    /// Abort this request
    Fatal(QuoteError),
}

impl AttemptOutcome {
    /// Classify a tier-level error
    pub fn from_error(err: QuoteError) -> Self {
        if err.is_fatal() {
            AttemptOutcome::Fatal(err)
        } else {
            AttemptOutcome::Retry(err)
        }
    }
}
