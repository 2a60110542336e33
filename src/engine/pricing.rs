//! Quote economics
//!
//! Pure arithmetic over an accepted swap. All USD figures are derived from
//! the notional and a single native price snapshot.

use crate::chain::FeeTier;
use crate::gas_oracle::gas_cost_native;

/// Frontend surcharge applied on top of the pool fee (0.25%)
pub const DEFAULT_INTERFACE_FEE_PCT: f64 = 0.0025;

#[derive(Debug, Clone, Copy)]
pub struct PricingInput {
    pub notional_usd: f64,
    pub fee_tier: FeeTier,
    pub interface_fee_pct: f64,
    /// Output amount already scaled by decimals
    pub received: f64,
    pub gas_estimate: u64,
    pub gas_price_wei: u128,
    pub native_price_usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteEconomics {
    pub price: f64,
    pub pool_fee_usd: f64,
    pub interface_fee_usd: f64,
    pub gas_cost_native: f64,
    pub gas_cost_usd: f64,
    pub effective_price: f64,
}

pub fn compute(input: &PricingInput) -> QuoteEconomics {
    let pool_fee_usd = input.notional_usd * input.fee_tier.as_fraction();
    let interface_fee_usd = input.notional_usd * input.interface_fee_pct;

    let gas_native = gas_cost_native(input.gas_estimate, input.gas_price_wei);
    let gas_usd = gas_native * input.native_price_usd;

    let (price, effective_price) = if input.received > 0.0 {
        (
            input.notional_usd / input.received,
            (input.notional_usd + interface_fee_usd + gas_usd) / input.received,
        )
    } else {
        (0.0, 0.0)
    };

    QuoteEconomics {
        price,
        pool_fee_usd,
        interface_fee_usd,
        gas_cost_native: gas_native,
        gas_cost_usd: gas_usd,
        effective_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PricingInput {
        PricingInput {
            notional_usd: 500.0,
            fee_tier: FeeTier(3000),
            interface_fee_pct: DEFAULT_INTERFACE_FEE_PCT,
            received: 0.15,
            gas_estimate: 150_000,
            gas_price_wei: 20_000_000_000,
            native_price_usd: 3000.0,
        }
    }

    #[test]
    fn test_fee_breakdown() {
        let econ = compute(&base());

        assert!((econ.pool_fee_usd - 1.5).abs() < 1e-9);
        assert!((econ.interface_fee_usd - 1.25).abs() < 1e-9);
        // 150k * 20 gwei = 0.003 ETH = $9
        assert!((econ.gas_cost_native - 0.003).abs() < 1e-12);
        assert!((econ.gas_cost_usd - 9.0).abs() < 1e-9);
        assert!((econ.price - 500.0 / 0.15).abs() < 1e-6);
        assert!((econ.effective_price - (500.0 + 1.25 + 9.0) / 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_zero_received_yields_zero_prices() {
        let econ = compute(&PricingInput {
            received: 0.0,
            ..base()
        });
        assert_eq!(econ.price, 0.0);
        assert_eq!(econ.effective_price, 0.0);
        assert!((econ.pool_fee_usd - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_effective_price_non_decreasing_in_gas() {
        let mut last = 0.0;
        for gwei in [0u128, 1, 5, 20, 100, 500] {
            let econ = compute(&PricingInput {
                gas_price_wei: gwei * 1_000_000_000,
                ..base()
            });
            assert!(econ.effective_price >= last);
            last = econ.effective_price;
        }

        let mut last = 0.0;
        for units in [0u64, 21_000, 150_000, 400_000] {
            let econ = compute(&PricingInput {
                gas_estimate: units,
                ..base()
            });
            assert!(econ.effective_price >= last);
            last = econ.effective_price;
        }
    }

    #[test]
    fn test_effective_price_non_decreasing_in_interface_fee() {
        let mut last = 0.0;
        for pct in [0.0, 0.001, 0.0025, 0.01, 0.05] {
            let econ = compute(&PricingInput {
                interface_fee_pct: pct,
                ..base()
            });
            assert!(econ.effective_price >= last);
            assert!(econ.effective_price >= econ.price);
            last = econ.effective_price;
        }
    }
}
