//! Reference Price Oracle (ETH/USD)
//!
//! Used to convert gas costs into USD. Resolution order:
//! 1. cached value younger than the TTL
//! 2. fresh fetch from the `PriceSource` (overwrites the cache)
//! 3. stale cached value
//! 4. hardcoded fallback
//!
//! `get_price` never fails; a price outage must not abort a quote cycle.

mod coingecko;

pub use coingecko::{CoinGeckoSource, COINGECKO_API_URL};

use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::chain::with_timeout;

/// Default ETH price used before any fetch has ever succeeded
pub const FALLBACK_ETH_PRICE_USD: f64 = 3000.0;

#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// USD price for `symbol`
    async fn fetch_reference_price(&self, symbol: &str) -> Result<f64>;
}

pub struct PriceOracle {
    source: Arc<dyn PriceSource>,
    symbol: String,
    cache: Arc<TtlCache<f64>>,
    fallback: f64,
    fetch_timeout: Duration,
}

impl PriceOracle {
    pub fn new(
        source: Arc<dyn PriceSource>,
        symbol: impl Into<String>,
        cache: Arc<TtlCache<f64>>,
        fallback: f64,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            symbol: symbol.into(),
            cache,
            fallback,
            fetch_timeout,
        }
    }

    pub async fn get_price(&self) -> f64 {
        self.get_price_at(Instant::now()).await
    }

    pub async fn get_price_at(&self, now: Instant) -> f64 {
        if let Some(price) = self.cache.fresh_at(now).await {
            return price;
        }

        let fetched = with_timeout(
            self.fetch_timeout,
            self.source.name(),
            self.source.fetch_reference_price(&self.symbol),
        )
        .await
        .and_then(|price| {
            if price.is_finite() && price > 0.0 {
                Ok(price)
            } else {
                Err(eyre::eyre!("non-positive price {}", price))
            }
        });

        match fetched {
            Ok(price) => {
                self.cache.store_at(price, now).await;
                info!("Fetched current {} price from {}: ${}", self.symbol, self.source.name(), price);
                price
            }
            Err(e) => {
                warn!("Failed to fetch {} price from {}: {}", self.symbol, self.source.name(), e);

                if let Some(stale) = self.cache.latest().await {
                    info!("Using cached {} price: ${}", self.symbol, stale.value);
                    return stale.value;
                }

                warn!("Using fallback {} price of ${}", self.symbol, self.fallback);
                self.fallback
            }
        }
    }
}
