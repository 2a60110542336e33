//! Batch Scheduler
//!
//! Fans one cycle's (pair x notional) cross-product out over a fixed pool of
//! workers pulling from a shared queue. Every task resolves independently;
//! a failure is logged and recorded, never propagated to the cycle.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::chain::{with_timeout, GasPriceSource};
use crate::engine::{QuoteEngine, QuoteError, QuoteRequest, QuoteResult};
use crate::sink::{QuoteRecord, RecordMeta, Sink};
use crate::tokens::Token;

/// What happened to one (pair, notional) unit
#[derive(Debug)]
pub struct TaskOutcome {
    pub request: QuoteRequest,
    pub result: Result<QuoteResult, QuoteError>,
    /// The row made it to the sink
    pub persisted: bool,
}

#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub gas_price_hint: Option<u128>,
    pub outcomes: Vec<TaskOutcome>,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn persisted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.persisted).count()
    }
}

pub struct BatchScheduler {
    engine: Arc<QuoteEngine>,
    gas_source: Arc<dyn GasPriceSource>,
    sink: Arc<dyn Sink>,
    meta: RecordMeta,
    call_timeout: Duration,
}

impl BatchScheduler {
    pub fn new(
        engine: Arc<QuoteEngine>,
        gas_source: Arc<dyn GasPriceSource>,
        sink: Arc<dyn Sink>,
        meta: RecordMeta,
        call_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            gas_source,
            sink,
            meta,
            call_timeout,
        }
    }

    /// Every pair crossed with every notional, stamped with the cycle time
    pub fn build_requests(pairs: &[(Token, Token)], notionals: &[f64], at: DateTime<Utc>) -> Vec<QuoteRequest> {
        pairs
            .iter()
            .flat_map(|(token_in, token_out)| {
                notionals
                    .iter()
                    .map(move |&notional| QuoteRequest::new(*token_in, *token_out, notional, at))
            })
            .collect()
    }

    pub async fn run_cycle(&self, pairs: &[(Token, Token)], notionals: &[f64], concurrency: usize) -> CycleReport {
        let started_at = Utc::now();
        let clock = Instant::now();

        let gas_price_hint = match with_timeout(self.call_timeout, "gas price", self.gas_source.current_gas_price()).await
        {
            Ok(price) => {
                debug!("Cycle gas price: {:.3} gwei", price as f64 / 1e9);
                Some(price)
            }
            Err(e) => {
                warn!("⚠️  Gas price unavailable for this cycle, quoting without hint: {}", e);
                None
            }
        };

        let requests = Self::build_requests(pairs, notionals, started_at);
        let workers = concurrency.max(1).min(requests.len().max(1));
        info!("Dispatching {} quote tasks across {} workers", requests.len(), workers);

        let (tx, rx) = mpsc::channel::<QuoteRequest>(requests.len().max(1));
        for request in requests {
            // Capacity covers every request
            if tx.send(request).await.is_err() {
                break;
            }
        }
        drop(tx);

        let shared_rx = Arc::new(Mutex::new(rx));
        let results: Arc<Mutex<Vec<TaskOutcome>>> = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let rx = Arc::clone(&shared_rx);
                let results = Arc::clone(&results);
                let engine = Arc::clone(&self.engine);
                let sink = Arc::clone(&self.sink);
                let meta = self.meta.clone();

                tokio::spawn(async move {
                    loop {
                        let request = {
                            let mut guard = rx.lock().await;
                            guard.recv().await
                        };
                        let Some(request) = request else {
                            break;
                        };

                        let outcome = process(&engine, sink.as_ref(), &meta, request, gas_price_hint).await;
                        results.lock().await.push(outcome);
                    }
                    debug!("Worker {} drained", worker_id);
                })
            })
            .collect();

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("Quote worker panicked: {}", e);
            }
        }

        let outcomes = std::mem::take(&mut *results.lock().await);

        CycleReport {
            started_at,
            elapsed: clock.elapsed(),
            gas_price_hint,
            outcomes,
        }
    }
}

/// Resolve one request and persist it on success
async fn process(
    engine: &QuoteEngine,
    sink: &dyn Sink,
    meta: &RecordMeta,
    request: QuoteRequest,
    gas_price_hint: Option<u128>,
) -> TaskOutcome {
    let result = engine.resolve_quote(&request, gas_price_hint).await;

    let persisted = match &result {
        Ok(quote) => {
            let record = QuoteRecord::from_result(quote, meta);
            match sink.append(&record).await {
                Ok(()) => {
                    info!(
                        "💾 {} ${}: {:.8} {} @ fee tier {} (effective price {:.4})",
                        record.direction,
                        request.notional_usd,
                        quote.received,
                        request.token_out,
                        quote.fee_tier,
                        quote.effective_price
                    );
                    true
                }
                Err(e) => {
                    error!("Failed to persist {} ${}: {:#}", record.direction, request.notional_usd, e);
                    false
                }
            }
        }
        Err(e) => {
            error!("❌ {} ${}: {}", request.direction(), request.notional_usd, e);
            false
        }
    };

    TaskOutcome {
        request,
        result,
        persisted,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use async_trait::async_trait;
    use eyre::{eyre, Result};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::cache::TtlCache;
    use crate::chain::{FeeTier, QuoterSet, SingleHopQuoter};
    use crate::engine::pool_resolver::tests::MockPools;
    use crate::engine::{EngineSettings, SlippageTable};
    use crate::oracle::{PriceOracle, PriceSource};
    use crate::tokens::{default_trade_pairs, get_token};

    pub(crate) struct LinearQuoter;

    #[async_trait]
    impl SingleHopQuoter for LinearQuoter {
        async fn quote_single_hop(&self, _in: Address, _out: Address, _fee: FeeTier, amount_in: U256) -> Result<U256> {
            Ok(amount_in * U256::from(1_000u64))
        }
    }

    /// Linear quoter that records the most calls it ever saw in flight
    #[derive(Default)]
    struct PeakQuoter {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SingleHopQuoter for PeakQuoter {
        async fn quote_single_hop(&self, _in: Address, _out: Address, _fee: FeeTier, amount_in: U256) -> Result<U256> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(amount_in * U256::from(1_000u64))
        }
    }

    struct Gas(Option<u128>);

    #[async_trait]
    impl GasPriceSource for Gas {
        async fn current_gas_price(&self) -> Result<u128> {
            self.0.ok_or_else(|| eyre!("gas down"))
        }
    }

    struct Price;

    #[async_trait]
    impl PriceSource for Price {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_reference_price(&self, _symbol: &str) -> Result<f64> {
            Ok(3000.0)
        }
    }

    #[derive(Default)]
    pub(crate) struct MemorySink {
        pub rows: Mutex<Vec<QuoteRecord>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Sink for MemorySink {
        async fn append(&self, record: &QuoteRecord) -> Result<()> {
            if self.fail {
                return Err(eyre!("disk full"));
            }
            self.rows.lock().await.push(record.clone());
            Ok(())
        }
    }

    pub(crate) fn scheduler(gas: Option<u128>, sink: Arc<MemorySink>, quoters: QuoterSet) -> BatchScheduler {
        let pools = Arc::new(MockPools::default().with_pool(FeeTier(500), Some(1_000)));
        let gas: Arc<Gas> = Arc::new(Gas(gas));
        let oracle = PriceOracle::new(
            Arc::new(Price),
            "ETH",
            Arc::new(TtlCache::new(Duration::from_secs(300))),
            3000.0,
            Duration::from_secs(1),
        );
        let engine = QuoteEngine::new(
            pools.clone(),
            pools,
            quoters,
            gas.clone(),
            Arc::new(oracle),
            SlippageTable::default(),
            EngineSettings::default(),
        );
        BatchScheduler::new(
            Arc::new(engine),
            gas,
            sink,
            RecordMeta::new("ethereum", 1),
            Duration::from_secs(1),
        )
    }

    pub(crate) fn pairs() -> Vec<(Token, Token)> {
        default_trade_pairs()
            .iter()
            .map(|(a, b)| (get_token(a).unwrap(), get_token(b).unwrap()))
            .collect()
    }

    #[test]
    fn test_build_requests_cross_product() {
        let requests = BatchScheduler::build_requests(&pairs(), &[500.0, 2000.0], Utc::now());
        assert_eq!(requests.len(), 16);
        assert_eq!(requests[0].direction(), "USDC->ETH");
        assert_eq!(requests[1].notional_usd, 2000.0);
    }

    #[tokio::test]
    async fn test_eight_pairs_three_notionals_four_workers() {
        let sink = Arc::new(MemorySink::default());
        let scheduler = scheduler(
            Some(20_000_000_000),
            sink.clone(),
            QuoterSet::new(Some(Arc::new(LinearQuoter)), None),
        );

        let report = scheduler.run_cycle(&pairs(), &[500.0, 2000.0, 10000.0], 4).await;

        assert_eq!(report.total(), 24);
        assert_eq!(report.succeeded(), 24);
        assert_eq!(report.persisted(), 24);
        assert_eq!(report.gas_price_hint, Some(20_000_000_000));

        let unique: HashSet<(String, u64)> = report
            .outcomes
            .iter()
            .map(|o| (o.request.direction(), o.request.notional_usd as u64))
            .collect();
        assert_eq!(unique.len(), 24);
        assert_eq!(sink.rows.lock().await.len(), 24);
    }

    #[tokio::test]
    async fn test_failures_are_contained() {
        let sink = Arc::new(MemorySink::default());
        // No quoter: every request fails, the cycle still completes
        let scheduler = scheduler(None, sink.clone(), QuoterSet::default());

        let report = scheduler.run_cycle(&pairs(), &[500.0], 3).await;

        assert_eq!(report.total(), 8);
        assert_eq!(report.failed(), 8);
        assert_eq!(report.gas_price_hint, None);
        assert!(sink.rows.lock().await.is_empty());
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.result, Err(QuoteError::QuoterUnavailable))));
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_quote() {
        let sink = Arc::new(MemorySink {
            rows: Mutex::new(Vec::new()),
            fail: true,
        });
        let scheduler = scheduler(
            Some(1_000_000_000),
            sink,
            QuoterSet::new(Some(Arc::new(LinearQuoter)), None),
        );

        let report = scheduler.run_cycle(&pairs()[..2], &[500.0], 8).await;
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.persisted(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_in_flight_quotes_bounded_by_concurrency() {
        let sink = Arc::new(MemorySink::default());
        let quoter = Arc::new(PeakQuoter::default());
        let scheduler = scheduler(
            Some(1_000_000_000),
            sink.clone(),
            QuoterSet::new(Some(quoter.clone()), None),
        );

        let report = scheduler.run_cycle(&pairs(), &[500.0, 2000.0, 10000.0], 4).await;

        assert_eq!(report.succeeded(), 24);
        let peak = quoter.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "{} quotes in flight", peak);
        assert!(peak > 1, "workers never overlapped");
        assert_eq!(quoter.in_flight.load(Ordering::SeqCst), 0);
    }
}
