//! Cycle runner
//!
//! Runs `BatchScheduler::run_cycle` once or forever, sleeping a random delay
//! between cycles.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::RunMode;
use crate::scheduler::{BatchScheduler, CycleReport};
use crate::tokens::Token;

pub struct CycleRunner {
    scheduler: Arc<BatchScheduler>,
    pairs: Vec<(Token, Token)>,
    notionals: Vec<f64>,
    concurrency: usize,
    mode: RunMode,
    delay_range: (u64, u64),
}

impl CycleRunner {
    pub fn new(
        scheduler: Arc<BatchScheduler>,
        pairs: Vec<(Token, Token)>,
        notionals: Vec<f64>,
        concurrency: usize,
        mode: RunMode,
        delay_range: (u64, u64),
    ) -> Self {
        Self {
            scheduler,
            pairs,
            notionals,
            concurrency,
            mode,
            delay_range,
        }
    }

    pub fn next_delay(&self) -> Duration {
        random_delay(self.delay_range.0, self.delay_range.1)
    }

    pub async fn run_one(&self, cycle: u64) -> CycleReport {
        info!("🔄 Cycle {} starting at {}", cycle, chrono::Utc::now().to_rfc3339());

        let report = self
            .scheduler
            .run_cycle(&self.pairs, &self.notionals, self.concurrency)
            .await;

        info!(
            "✓ Cycle {} complete in {:.1}s: {} succeeded, {} failed, {} rows written",
            cycle,
            report.elapsed.as_secs_f64(),
            report.succeeded(),
            report.failed(),
            report.persisted()
        );
        report
    }

    /// Returns the number of cycles completed. Only returns in `Once` mode.
    pub async fn run(&self) -> u64 {
        let pairs = self
            .pairs
            .iter()
            .map(|(a, b)| format!("{}->{}", a, b))
            .collect::<Vec<_>>()
            .join(", ");
        info!("Tracking {} pairs: {}", self.pairs.len(), pairs);
        info!("Notionals (USD): {:?}", self.notionals);
        info!("Run mode: {}", self.mode);

        let mut cycle = 0u64;
        loop {
            cycle += 1;
            self.run_one(cycle).await;

            if self.mode == RunMode::Once {
                info!("Single cycle requested, stopping");
                return cycle;
            }

            let delay = self.next_delay();
            info!("💤 Sleeping {} before next cycle", format_duration(delay));
            tokio::time::sleep(delay).await;
        }
    }
}

/// Uniform delay in `[min, max]` seconds
pub fn random_delay(min: u64, max: u64) -> Duration {
    let (min, max) = (min.min(max), min.max(max));
    Duration::from_secs(rand::thread_rng().gen_range(min..=max))
}

/// "2h 5m 9s"
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::QuoterSet;
    use crate::scheduler::tests::{pairs, scheduler, LinearQuoter, MemorySink};

    #[test]
    fn test_random_delay_in_range() {
        for _ in 0..100 {
            let delay = random_delay(900, 1800).as_secs();
            assert!((900..=1800).contains(&delay));
        }
        assert_eq!(random_delay(5, 5), Duration::from_secs(5));
        // Inverted bounds are tolerated
        assert!((1..=3).contains(&random_delay(3, 1).as_secs()));
    }

    #[tokio::test]
    async fn test_once_mode_runs_single_cycle() {
        let sink = Arc::new(MemorySink::default());
        let scheduler = scheduler(
            Some(1_000_000_000),
            sink.clone(),
            QuoterSet::new(Some(Arc::new(LinearQuoter)), None),
        );
        let runner = CycleRunner::new(
            Arc::new(scheduler),
            pairs(),
            vec![500.0, 2000.0],
            2,
            RunMode::Once,
            (900, 1800),
        );

        assert_eq!(runner.run().await, 1);
        assert_eq!(sink.rows.lock().await.len(), 16);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_duration(Duration::from_secs(7509)), "2h 5m 9s");
        assert_eq!(format_duration(Duration::from_millis(61_900)), "0h 1m 1s");
    }
}
