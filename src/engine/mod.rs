//! Quote resolution
//!
//! `QuoteEngine` ties together pool resolution, slippage validation and the
//! quote economics for a single (pair, notional) request.

mod error;
pub mod pool_resolver;
pub mod pricing;
mod quote_engine;
pub mod slippage;
mod types;

pub use error::QuoteError;
pub use pool_resolver::PoolResolver;
pub use quote_engine::{attempt_order, EngineSettings, QuoteEngine, DEFAULT_GAS_ESTIMATE};
pub use slippage::SlippageTable;
pub use types::{AttemptOutcome, PoolCandidate, QuoteRequest, QuoteResult};
