use thiserror::Error;

use crate::chain::FeeTier;

/// Per-request quote failures.
///
/// Only `QuoterUnavailable` is fatal for a request; everything else raised
/// inside a tier attempt moves the engine on to the next fee tier. None of
/// these ever abort a cycle.
#[derive(Debug, Clone, Error)]
pub enum QuoteError {
    #[error("no pools available for {pair} across all fee tiers")]
    PoolNotFound { pair: String },

    #[error("no quoter contracts available")]
    QuoterUnavailable,

    #[error("no pool deployed at fee tier {tier}")]
    NoPoolAtTier { tier: FeeTier },

    #[error("slippage validation failed at fee tier {tier}: {slippage_pct:.2}%")]
    SlippageExceeded { tier: FeeTier, slippage_pct: f64 },

    #[error("{what} failed at fee tier {tier}: {message}")]
    Call {
        tier: FeeTier,
        what: &'static str,
        message: String,
    },

    #[error("failed to get quote for {direction} with ${notional} after trying all fee tiers: {last}")]
    Exhausted {
        direction: String,
        notional: f64,
        last: Box<QuoteError>,
    },
}

impl QuoteError {
    pub fn call(tier: FeeTier, what: &'static str, err: impl std::fmt::Display) -> Self {
        QuoteError::Call {
            tier,
            what,
            message: err.to_string(),
        }
    }

    /// Stops the tier loop instead of falling back
    pub fn is_fatal(&self) -> bool {
        matches!(self, QuoteError::QuoterUnavailable)
    }
}
