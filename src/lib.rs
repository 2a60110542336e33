//! Uniswap V3 Quote Collector
//!
//! Simulates swaps through the Uniswap V3 quoters for a fixed set of token
//! pairs and USD notionals, validates each quote against a per-token slippage
//! tolerance with fee-tier fallback, and appends every accepted quote to a CSV
//! file. Nothing is ever executed on-chain.
//!
//! Layout:
//! - `chain`     - capability traits (pool directory, liquidity, quoters) + alloy implementations
//! - `oracle`    - ETH/USD reference price with TTL cache and fallbacks
//! - `gas_oracle` - gas price from Etherscan or the RPC node
//! - `engine`    - pool resolution, slippage validation, quote resolution
//! - `scheduler` - bounded worker pool fanning a cycle out over (pair x notional)
//! - `runner`    - once / loop cycle runner
//! - `sink`      - output records and the CSV sink
//! - `config` / `logging` - environment config and the rotating log file

pub mod cache;
pub mod chain;
pub mod config;
pub mod engine;
pub mod gas_oracle;
pub mod logging;
pub mod oracle;
pub mod runner;
pub mod scheduler;
pub mod sink;
pub mod tokens;

pub use config::{Config, RunMode};
pub use engine::{QuoteEngine, QuoteError, QuoteRequest, QuoteResult};
pub use scheduler::{BatchScheduler, CycleReport};
