//! Pool Resolver
//!
//! Walks the fee tiers in the given order and returns the first pool that
//! exists and holds liquidity. Lookups are never cached; every request sees
//! the current on-chain state.

use alloy_primitives::Address;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::PoolCandidate;
use crate::chain::{with_timeout, FeeTier, LiquidityView, PoolDirectory};
use crate::tokens::Token;

pub struct PoolResolver {
    directory: Arc<dyn PoolDirectory>,
    liquidity: Arc<dyn LiquidityView>,
    call_timeout: Duration,
}

impl PoolResolver {
    pub fn new(directory: Arc<dyn PoolDirectory>, liquidity: Arc<dyn LiquidityView>, call_timeout: Duration) -> Self {
        Self {
            directory,
            liquidity,
            call_timeout,
        }
    }

    /// First tier with a deployed pool and liquidity > 0, or `None`
    pub async fn find_pool(&self, token_in: &Token, token_out: &Token, fee_tiers: &[FeeTier]) -> Option<PoolCandidate> {
        for &tier in fee_tiers {
            let pool = match with_timeout(
                self.call_timeout,
                "getPool",
                self.directory.get_pool(token_in.address, token_out.address, tier),
            )
            .await
            {
                Ok(Some(pool)) if pool != Address::ZERO => pool,
                Ok(_) => {
                    debug!("No {}/{} pool at fee tier {}", token_in, token_out, tier);
                    continue;
                }
                Err(e) => {
                    warn!("Error checking {}/{} pool at fee tier {}: {}", token_in, token_out, tier, e);
                    continue;
                }
            };

            match with_timeout(self.call_timeout, "liquidity", self.liquidity.get_liquidity(pool)).await {
                Ok(liquidity) if liquidity > 0 => {
                    debug!(
                        "Found {}/{} pool {} at fee tier {} with liquidity {}",
                        token_in, token_out, pool, tier, liquidity
                    );
                    return Some(PoolCandidate {
                        fee_tier: tier,
                        pool_address: pool,
                        liquidity: Some(liquidity),
                    });
                }
                Ok(_) => {
                    debug!("Pool {} at fee tier {} has no liquidity", pool, tier);
                }
                Err(e) => {
                    // Pool exists; take it and let the quoter decide
                    warn!("Could not check liquidity for pool {}: {}", pool, e);
                    return Some(PoolCandidate {
                        fee_tier: tier,
                        pool_address: pool,
                        liquidity: None,
                    });
                }
            }
        }

        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use eyre::{eyre, Result};
    use std::collections::HashMap;

    use crate::tokens::get_token;

    /// In-memory factory + pools. Pool address is derived from the tier.
    #[derive(Default)]
    pub(crate) struct MockPools {
        pub pools: HashMap<FeeTier, Address>,
        pub liquidity: HashMap<Address, Option<u128>>,
        pub broken_tiers: Vec<FeeTier>,
    }

    impl MockPools {
        pub fn pool_address(tier: FeeTier) -> Address {
            Address::left_padding_from(&tier.0.to_be_bytes())
        }

        /// `None` liquidity means the liquidity call errors
        pub fn with_pool(mut self, tier: FeeTier, liquidity: Option<u128>) -> Self {
            let address = Self::pool_address(tier);
            self.pools.insert(tier, address);
            self.liquidity.insert(address, liquidity);
            self
        }

        pub fn with_broken_tier(mut self, tier: FeeTier) -> Self {
            self.broken_tiers.push(tier);
            self
        }
    }

    #[async_trait]
    impl PoolDirectory for MockPools {
        async fn get_pool(&self, _a: Address, _b: Address, fee: FeeTier) -> Result<Option<Address>> {
            if self.broken_tiers.contains(&fee) {
                return Err(eyre!("factory call reverted"));
            }
            Ok(self.pools.get(&fee).copied())
        }
    }

    #[async_trait]
    impl LiquidityView for MockPools {
        async fn get_liquidity(&self, pool: Address) -> Result<u128> {
            match self.liquidity.get(&pool) {
                Some(Some(liquidity)) => Ok(*liquidity),
                _ => Err(eyre!("liquidity call failed")),
            }
        }
    }

    fn resolver(pools: MockPools) -> PoolResolver {
        let pools = Arc::new(pools);
        PoolResolver::new(pools.clone(), pools, Duration::from_secs(1))
    }

    async fn resolve(pools: MockPools) -> Option<PoolCandidate> {
        let usdc = get_token("USDC").unwrap();
        let eth = get_token("ETH").unwrap();
        resolver(pools).find_pool(&usdc, &eth, &FeeTier::DEFAULT_TIERS).await
    }

    #[tokio::test]
    async fn test_lowest_liquid_tier_wins() {
        let pools = MockPools::default()
            .with_pool(FeeTier(100), Some(0))
            .with_pool(FeeTier(500), Some(1_000))
            .with_pool(FeeTier(3000), Some(50_000));

        let found = resolve(pools).await.unwrap();
        assert_eq!(found.fee_tier, FeeTier(500));
        assert_eq!(found.pool_address, MockPools::pool_address(FeeTier(500)));
        assert_eq!(found.liquidity, Some(1_000));
    }

    #[tokio::test]
    async fn test_not_found_when_all_empty() {
        let pools = MockPools::default()
            .with_pool(FeeTier(500), Some(0))
            .with_pool(FeeTier(10000), Some(0));

        assert!(resolve(pools).await.is_none());
        assert!(resolve(MockPools::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_directory_error_skips_tier() {
        let pools = MockPools::default()
            .with_pool(FeeTier(100), Some(10))
            .with_broken_tier(FeeTier(100))
            .with_pool(FeeTier(3000), Some(10));

        assert_eq!(resolve(pools).await.unwrap().fee_tier, FeeTier(3000));
    }

    #[tokio::test]
    async fn test_zero_address_is_no_pool() {
        let mut pools = MockPools::default().with_pool(FeeTier(10000), Some(5));
        pools.pools.insert(FeeTier(100), Address::ZERO);

        assert_eq!(resolve(pools).await.unwrap().fee_tier, FeeTier(10000));
    }

    #[tokio::test]
    async fn test_liquidity_error_is_optimistic() {
        let pools = MockPools::default()
            .with_pool(FeeTier(500), None)
            .with_pool(FeeTier(3000), Some(99));

        let found = resolve(pools).await.unwrap();
        assert_eq!(found.fee_tier, FeeTier(500));
        assert_eq!(found.liquidity, None);
    }
}
