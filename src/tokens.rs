//! Token definitions for the quote collector
//!
//! Ethereum mainnet tokens we quote against. "ETH" is quoted through WETH,
//! the Uniswap V3 pools never hold native ETH.

use alloy_primitives::{address, Address};

/// Represents a token we're tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    /// Convert a human amount into smallest units (truncating, like an int cast)
    pub fn to_base_units(&self, amount: f64) -> u128 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0;
        }
        (amount * 10_f64.powi(self.decimals as i32)) as u128
    }

    /// Convert smallest units back into a human amount
    pub fn from_base_units(&self, raw: f64) -> f64 {
        raw / 10_f64.powi(self.decimals as i32)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

// ============================================
// MAINNET TOKENS
// ============================================

pub fn all_tokens() -> Vec<Token> {
    vec![
        Token {
            symbol: "ETH",
            address: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), // WETH
            decimals: 18,
        },
        Token {
            symbol: "USDC",
            address: address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            decimals: 6,
        },
        Token {
            symbol: "USDT",
            address: address!("dAC17F958D2ee523a2206206994597C13D831ec7"),
            decimals: 6,
        },
        Token {
            symbol: "WBTC",
            address: address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"),
            decimals: 8,
        },
        Token {
            symbol: "LINK",
            address: address!("514910771AF9Ca656af840dff83E8264EcF986CA"),
            decimals: 18,
        },
        Token {
            symbol: "AAVE",
            address: address!("7Fc66500c84A76Ad7e9c93437bFc5Ac33E2DDaE9"),
            decimals: 18,
        },
    ]
}

/// Default trading pairs: both stables against every volatile token
pub fn default_trade_pairs() -> Vec<(String, String)> {
    [
        ("USDC", "ETH"),
        ("USDT", "ETH"),
        ("USDC", "WBTC"),
        ("USDT", "WBTC"),
        ("USDC", "LINK"),
        ("USDT", "LINK"),
        ("USDC", "AAVE"),
        ("USDT", "AAVE"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}

/// Get token by symbol (case-insensitive)
pub fn get_token(symbol: &str) -> Option<Token> {
    all_tokens()
        .into_iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}
