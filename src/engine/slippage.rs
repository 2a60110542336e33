//! Slippage Validator
//!
//! Compares a small probe trade against the full-size trade. With a probe of
//! 1/10th the size, a perfectly linear pool returns 10x the probe output for
//! the full trade; anything less is slippage:
//!
//!   slippage_ratio = 1 - (output_full / output_small) / (input_full / input_small)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Probe size as a fraction of the full trade
pub const PROBE_FRACTION_DIVISOR: u64 = 10;

/// Tolerance for any symbol without an explicit entry (10%)
pub const DEFAULT_SLIPPAGE_TOLERANCE: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlippageCheck {
    pub acceptable: bool,
    /// `None` when the inputs were degenerate
    pub slippage_ratio: Option<f64>,
}

impl SlippageCheck {
    pub fn slippage_pct(&self) -> Option<f64> {
        self.slippage_ratio.map(|r| r * 100.0)
    }
}

/// Standalone check. Zero probe amounts cannot be assessed and are rejected.
pub fn check(input_small: f64, output_small: f64, input_full: f64, output_full: f64, tolerance: f64) -> SlippageCheck {
    if input_small == 0.0 || output_small == 0.0 {
        return SlippageCheck {
            acceptable: false,
            slippage_ratio: None,
        };
    }

    let input_ratio = input_full / input_small;
    let output_ratio = output_full / output_small;
    let slippage_ratio = 1.0 - (output_ratio / input_ratio);

    SlippageCheck {
        acceptable: slippage_ratio <= tolerance,
        slippage_ratio: Some(slippage_ratio),
    }
}

/// Per-symbol slippage tolerances with a required default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlippageTable {
    pub default: f64,
    pub by_symbol: BTreeMap<String, f64>,
}

impl SlippageTable {
    pub fn new(default: f64) -> Self {
        Self {
            default,
            by_symbol: BTreeMap::new(),
        }
    }

    pub fn with(mut self, symbol: &str, tolerance: f64) -> Self {
        self.by_symbol.insert(symbol.to_uppercase(), tolerance);
        self
    }

    pub fn tolerance_for(&self, symbol: &str) -> f64 {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(self.default)
    }

    /// Parse "WBTC:0.05,ETH:0.05" on top of `default`. Bad entries are skipped.
    pub fn parse(default: f64, raw: &str) -> Self {
        raw.split(',')
            .filter_map(|entry| {
                let (symbol, value) = entry.split_once(':')?;
                let tolerance: f64 = value.trim().parse().ok()?;
                Some((symbol.trim().to_string(), tolerance))
            })
            .filter(|(symbol, _)| !symbol.is_empty())
            .fold(Self::new(default), |table, (symbol, tol)| table.with(&symbol, tol))
    }
}

impl Default for SlippageTable {
    /// Less liquid majors get a tighter 5%, everything else 10%
    fn default() -> Self {
        Self::new(DEFAULT_SLIPPAGE_TOLERANCE)
            .with("WBTC", 0.05)
            .with("ETH", 0.05)
    }
}
