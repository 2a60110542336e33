//! Quote Engine
//!
//! Turns one `QuoteRequest` into a validated `QuoteResult`:
//! resolve a liquid pool, then try that tier first and every other configured
//! tier after it until one produces a quote that passes the slippage probe.

use alloy_primitives::{Address, U256};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::QuoteError;
use super::pool_resolver::PoolResolver;
use super::pricing::{self, PricingInput, DEFAULT_INTERFACE_FEE_PCT};
use super::slippage::{self, SlippageTable, PROBE_FRACTION_DIVISOR};
use super::types::{AttemptOutcome, QuoteRequest, QuoteResult};
use crate::chain::{
    encode_v3_path, u256_to_f64, with_timeout, FeeTier, GasPriceSource, LiquidityView, PoolDirectory, QuoterSet,
    SingleHopQuoter,
};
use crate::oracle::PriceOracle;

/// Gas units assumed for a single-hop swap when QuoterV2 can't tell us
pub const DEFAULT_GAS_ESTIMATE: u64 = 150_000;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub fee_tiers: Vec<FeeTier>,
    pub interface_fee_pct: f64,
    pub default_gas_estimate: u64,
    pub call_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fee_tiers: FeeTier::DEFAULT_TIERS.to_vec(),
            interface_fee_pct: DEFAULT_INTERFACE_FEE_PCT,
            default_gas_estimate: DEFAULT_GAS_ESTIMATE,
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Resolved tier first, then the rest in configured order
pub fn attempt_order(resolved: FeeTier, fee_tiers: &[FeeTier]) -> Vec<FeeTier> {
    std::iter::once(resolved)
        .chain(fee_tiers.iter().copied().filter(|tier| *tier != resolved))
        .collect()
}

/// Simulated swap output at one tier
#[derive(Debug, Clone, Copy)]
struct SwapQuote {
    amount_out: U256,
    gas_estimate: u64,
}

pub struct QuoteEngine {
    resolver: PoolResolver,
    directory: Arc<dyn PoolDirectory>,
    quoters: QuoterSet,
    gas_source: Arc<dyn GasPriceSource>,
    price_oracle: Arc<PriceOracle>,
    slippage: SlippageTable,
    settings: EngineSettings,
}

impl QuoteEngine {
    pub fn new(
        directory: Arc<dyn PoolDirectory>,
        liquidity: Arc<dyn LiquidityView>,
        quoters: QuoterSet,
        gas_source: Arc<dyn GasPriceSource>,
        price_oracle: Arc<PriceOracle>,
        slippage: SlippageTable,
        settings: EngineSettings,
    ) -> Self {
        Self {
            resolver: PoolResolver::new(directory.clone(), liquidity, settings.call_timeout),
            directory,
            quoters,
            gas_source,
            price_oracle,
            slippage,
            settings,
        }
    }

    /// Resolve one request. `gas_price_hint` is the cycle-wide gas price in
    /// wei; without it the gas source is queried per attempt.
    pub async fn resolve_quote(
        &self,
        request: &QuoteRequest,
        gas_price_hint: Option<u128>,
    ) -> Result<QuoteResult, QuoteError> {
        let direction = request.direction();

        if self.quoters.is_empty() {
            return Err(QuoteError::QuoterUnavailable);
        }

        let amount_in = U256::from(request.token_in.to_base_units(request.notional_usd));

        let candidate = self
            .resolver
            .find_pool(&request.token_in, &request.token_out, &self.settings.fee_tiers)
            .await
            .ok_or_else(|| QuoteError::PoolNotFound {
                pair: format!("{}/{}", request.token_in, request.token_out),
            })?;

        debug!(
            "{} ${}: resolved pool {} at fee tier {}",
            direction, request.notional_usd, candidate.pool_address, candidate.fee_tier
        );

        let mut last_error: Option<QuoteError> = None;

        for tier in attempt_order(candidate.fee_tier, &self.settings.fee_tiers) {
            let pool_address = if tier == candidate.fee_tier {
                Some(candidate.pool_address)
            } else {
                match self.pool_at(request, tier).await {
                    Ok(pool) => pool,
                    Err(e) => {
                        debug!("{} ${}: {}", direction, request.notional_usd, e);
                        last_error = Some(e);
                        continue;
                    }
                }
            };

            match self.attempt_tier(request, amount_in, tier, pool_address, gas_price_hint).await {
                AttemptOutcome::Success(result) => {
                    if tier != candidate.fee_tier {
                        info!(
                            "{} ${}: fell back from fee tier {} to {}",
                            direction, request.notional_usd, candidate.fee_tier, tier
                        );
                    }
                    return Ok(*result);
                }
                AttemptOutcome::Retry(e) => {
                    warn!("{} ${}: {}", direction, request.notional_usd, e);
                    last_error = Some(e);
                }
                AttemptOutcome::Fatal(e) => return Err(e),
            }
        }

        Err(QuoteError::Exhausted {
            direction,
            notional: request.notional_usd,
            last: Box::new(last_error.unwrap_or(QuoteError::NoPoolAtTier {
                tier: candidate.fee_tier,
            })),
        })
    }

    /// Pool address for a fallback tier. A failed lookup still lets the
    /// quoter try; a confirmed missing pool skips the tier.
    async fn pool_at(&self, request: &QuoteRequest, tier: FeeTier) -> Result<Option<Address>, QuoteError> {
        match with_timeout(
            self.settings.call_timeout,
            "getPool",
            self.directory
                .get_pool(request.token_in.address, request.token_out.address, tier),
        )
        .await
        {
            Ok(Some(pool)) if pool != Address::ZERO => Ok(Some(pool)),
            Ok(_) => Err(QuoteError::NoPoolAtTier { tier }),
            Err(e) => {
                debug!("getPool failed at fee tier {}: {}", tier, e);
                Ok(None)
            }
        }
    }

    async fn attempt_tier(
        &self,
        request: &QuoteRequest,
        amount_in: U256,
        tier: FeeTier,
        pool_address: Option<Address>,
        gas_price_hint: Option<u128>,
    ) -> AttemptOutcome {
        let swap = match self.quote_swap(request, tier, amount_in).await {
            Ok(swap) => swap,
            Err(e) => return AttemptOutcome::from_error(e),
        };

        let slippage_pct = match self.probe_slippage(request, tier, amount_in, swap.amount_out).await {
            Ok(pct) => pct,
            Err(e) => return AttemptOutcome::from_error(e),
        };

        let gas_price_wei = match gas_price_hint {
            Some(price) => price,
            None => match with_timeout(
                self.settings.call_timeout,
                "gas price",
                self.gas_source.current_gas_price(),
            )
            .await
            {
                Ok(price) => price,
                Err(e) => return AttemptOutcome::from_error(QuoteError::call(tier, "gas price", e)),
            },
        };

        // One snapshot feeds both gas USD and effective price
        let native_price_usd = self.price_oracle.get_price().await;

        let received = request.token_out.from_base_units(u256_to_f64(swap.amount_out));
        let economics = pricing::compute(&PricingInput {
            notional_usd: request.notional_usd,
            fee_tier: tier,
            interface_fee_pct: self.settings.interface_fee_pct,
            received,
            gas_estimate: swap.gas_estimate,
            gas_price_wei,
            native_price_usd,
        });

        AttemptOutcome::Success(Box::new(QuoteResult {
            request: request.clone(),
            quoted_at: Utc::now(),
            fee_tier: tier,
            pool_address,
            amount_in,
            amount_out: swap.amount_out,
            received,
            price: economics.price,
            pool_fee_usd: economics.pool_fee_usd,
            interface_fee_usd: economics.interface_fee_usd,
            gas_estimate: swap.gas_estimate,
            gas_price_wei,
            gas_cost_native: economics.gas_cost_native,
            gas_cost_usd: economics.gas_cost_usd,
            native_price_usd,
            effective_price: economics.effective_price,
            slippage_pct,
        }))
    }

    /// Full-size quote. V1 gives the amount when present and V2 only refines
    /// the gas estimate; with V2 alone it provides both.
    async fn quote_swap(&self, request: &QuoteRequest, tier: FeeTier, amount_in: U256) -> Result<SwapQuote, QuoteError> {
        match (&self.quoters.single_hop, &self.quoters.path) {
            (Some(single), path) => {
                let amount_out = self.single_hop_amount(single.as_ref(), request, tier, amount_in).await?;

                let mut gas_estimate = self.settings.default_gas_estimate;
                if let Some(path_quoter) = path {
                    let encoded = encode_v3_path(request.token_in.address, tier, request.token_out.address);
                    match with_timeout(
                        self.settings.call_timeout,
                        "quoteExactInput",
                        path_quoter.quote_path(&encoded, amount_in),
                    )
                    .await
                    {
                        Ok(quote) => gas_estimate = quote.gas_estimate,
                        Err(e) => debug!("QuoterV2 gas estimate unavailable at fee tier {}: {}", tier, e),
                    }
                }

                Ok(SwapQuote {
                    amount_out,
                    gas_estimate,
                })
            }
            (None, Some(path_quoter)) => {
                let encoded = encode_v3_path(request.token_in.address, tier, request.token_out.address);
                let quote = with_timeout(
                    self.settings.call_timeout,
                    "quoteExactInput",
                    path_quoter.quote_path(&encoded, amount_in),
                )
                .await
                .map_err(|e| QuoteError::call(tier, "quoteExactInput", e))?;

                Ok(SwapQuote {
                    amount_out: quote.amount_out,
                    gas_estimate: quote.gas_estimate,
                })
            }
            (None, None) => Err(QuoteError::QuoterUnavailable),
        }
    }

    async fn single_hop_amount(
        &self,
        quoter: &dyn SingleHopQuoter,
        request: &QuoteRequest,
        tier: FeeTier,
        amount_in: U256,
    ) -> Result<U256, QuoteError> {
        with_timeout(
            self.settings.call_timeout,
            "quoteExactInputSingle",
            quoter.quote_single_hop(request.token_in.address, request.token_out.address, tier, amount_in),
        )
        .await
        .map_err(|e| QuoteError::call(tier, "quoteExactInputSingle", e))
    }

    /// Output amount only, for the slippage probe
    async fn quote_amount(&self, request: &QuoteRequest, tier: FeeTier, amount_in: U256) -> Result<U256, QuoteError> {
        match (&self.quoters.single_hop, &self.quoters.path) {
            (Some(single), _) => self.single_hop_amount(single.as_ref(), request, tier, amount_in).await,
            (None, Some(path_quoter)) => {
                let encoded = encode_v3_path(request.token_in.address, tier, request.token_out.address);
                with_timeout(
                    self.settings.call_timeout,
                    "quoteExactInput",
                    path_quoter.quote_path(&encoded, amount_in),
                )
                .await
                .map(|quote| quote.amount_out)
                .map_err(|e| QuoteError::call(tier, "quoteExactInput", e))
            }
            (None, None) => Err(QuoteError::QuoterUnavailable),
        }
    }

    /// Slippage percent from a 1/10th probe. `Ok(None)` when the probe
    /// couldn't be taken and `Ok(Some(0.0))` when it quoted nothing; the
    /// quote is still accepted in both cases.
    async fn probe_slippage(
        &self,
        request: &QuoteRequest,
        tier: FeeTier,
        amount_in: U256,
        amount_out: U256,
    ) -> Result<Option<f64>, QuoteError> {
        let probe_in = amount_in / U256::from(PROBE_FRACTION_DIVISOR);
        if probe_in.is_zero() {
            debug!("{}: probe amount rounds to zero at fee tier {}", request.direction(), tier);
            return Ok(None);
        }

        let probe_out = match self.quote_amount(request, tier, probe_in).await {
            Ok(out) if !out.is_zero() => out,
            Ok(_) => {
                warn!("{}: probe quote returned zero at fee tier {}, assuming no slippage", request.direction(), tier);
                return Ok(Some(0.0));
            }
            Err(e) => {
                warn!("{}: probe quote failed, slippage unknown: {}", request.direction(), e);
                return Ok(None);
            }
        };

        let tolerance = self.slippage.tolerance_for(request.token_in.symbol);
        let check = slippage::check(
            u256_to_f64(probe_in),
            u256_to_f64(probe_out),
            u256_to_f64(amount_in),
            u256_to_f64(amount_out),
            tolerance,
        );

        match check.slippage_pct() {
            Some(pct) if check.acceptable => Ok(Some(pct)),
            Some(pct) => Err(QuoteError::SlippageExceeded { tier, slippage_pct: pct }),
            None => Ok(None),
        }
    }
}
