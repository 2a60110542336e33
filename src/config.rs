//! Configuration for the quote collector
//!
//! Every knob comes from the environment (with `.env` support) and falls back
//! to a sane default. The same struct round-trips through TOML for people who
//! prefer a config file.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::chain::FeeTier;
use crate::engine::pricing::DEFAULT_INTERFACE_FEE_PCT;
use crate::engine::slippage::DEFAULT_SLIPPAGE_TOLERANCE;
use crate::engine::{EngineSettings, SlippageTable, DEFAULT_GAS_ESTIMATE};
use crate::oracle::FALLBACK_ETH_PRICE_USD;
use crate::tokens::{default_trade_pairs, get_token, Token};

// ============================================
// DEFAULTS
// ============================================

pub const INFURA_URL_TEMPLATE: &str = "https://mainnet.infura.io/v3/";
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

pub const UNISWAP_V3_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";
pub const UNISWAP_V3_QUOTER: &str = "0xb27308f9F90D607463bb33eA1BeBb41C27CE5AB6";
pub const UNISWAP_V3_QUOTER_V2: &str = "0x61fFE014bA17989E743c5F6cB21bF9697530B21e";

const DEFAULT_NOTIONALS: [f64; 3] = [500.0, 2000.0, 10000.0];

// ============================================
// RUN MODE
// ============================================

/// Whether the runner stops after one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Repeat cycles with a randomized delay in between
    #[default]
    Loop,

    /// One cycle, then exit
    Once,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Loop => write!(f, "LOOP"),
            RunMode::Once => write!(f, "ONCE"),
        }
    }
}

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // ========== Network Settings ==========
    /// Ethereum RPC URL
    pub rpc_url: String,

    /// Chain ID (1 = Ethereum Mainnet)
    pub chain_id: u64,

    /// Network label written into every row
    pub network: String,

    // ========== Contracts ==========
    pub factory_address: String,

    /// Quoter V1 (`quoteExactInputSingle`); empty disables it
    pub quoter_address: String,

    /// QuoterV2 (`quoteExactInput`, reports gas); empty disables it
    pub quoter_v2_address: String,

    // ========== Quote Settings ==========
    /// Trade sizes in USD
    pub usd_notionals: Vec<f64>,

    /// Fee tiers in parts-per-million, ascending
    pub pool_fee_tiers: Vec<u32>,

    /// Interface fee as a fraction of notional (0.0025 = 0.25%)
    pub interface_fee_pct: f64,

    /// Gas units assumed when QuoterV2 can't estimate
    pub default_gas_estimate: u64,

    /// Slippage tolerance for symbols without an override
    pub default_slippage_tolerance: f64,

    /// Per-symbol slippage tolerance overrides
    pub slippage_tolerances: BTreeMap<String, f64>,

    /// (token_in, token_out) symbols
    pub trade_pairs: Vec<(String, String)>,

    // ========== Scheduling ==========
    pub max_workers: usize,

    /// When false, quotes run one at a time
    pub enable_parallel: bool,

    pub run_mode: RunMode,

    /// Random delay between cycles, in seconds
    pub cycle_delay_min_secs: u64,
    pub cycle_delay_max_secs: u64,

    // ========== Prices ==========
    pub eth_price_ttl_secs: u64,
    pub fallback_eth_price_usd: f64,
    pub coingecko_api_url: String,

    // ========== Timeouts ==========
    pub rpc_timeout_secs: u64,
    pub http_timeout_secs: u64,

    // ========== Output ==========
    pub save_dir: String,
    pub log_dir: String,

    /// Version tag in output file names
    pub file_version: String,

    // ========== API Keys ==========
    /// Etherscan API key for gas prices (RPC is used otherwise)
    pub etherscan_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        dotenvy::from_path("../.env").ok();

        Ok(Self::from_vars(|key| env::var(key).ok()))
    }

    /// Build from any key lookup; missing or malformed values use defaults
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let get = |key: &str, default: String| var(key).filter(|v| !v.trim().is_empty()).unwrap_or(default);
        let raw = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let rpc_url = match (var("RPC_URL"), var("INFURA_API_KEY")) {
            (Some(url), _) if !url.trim().is_empty() => url,
            (_, Some(key)) if !key.trim().is_empty() => format!("{}{}", INFURA_URL_TEMPLATE, key.trim()),
            _ => defaults.rpc_url.clone(),
        };

        Self {
            // Network
            rpc_url,
            chain_id: get("CHAIN_ID", "1".to_string()).parse().unwrap_or(defaults.chain_id),
            network: get("NETWORK", defaults.network.clone()),

            // Contracts
            factory_address: get("FACTORY_ADDRESS", defaults.factory_address.clone()),
            // An explicitly empty value disables the quoter
            quoter_address: var("QUOTER_ADDRESS").unwrap_or(defaults.quoter_address.clone()),
            quoter_v2_address: var("QUOTER_V2_ADDRESS").unwrap_or(defaults.quoter_v2_address.clone()),

            // Quotes
            usd_notionals: raw("USD_NOTIONALS")
                .map(|s| parse_list(&s))
                .filter(|v: &Vec<f64>| !v.is_empty())
                .unwrap_or(defaults.usd_notionals.clone()),
            pool_fee_tiers: raw("POOL_FEE_TIERS")
                .map(|s| parse_list(&s))
                .filter(|v: &Vec<u32>| !v.is_empty())
                .unwrap_or(defaults.pool_fee_tiers.clone()),
            interface_fee_pct: get("INTERFACE_FEE_PCT", "0.0025".to_string())
                .parse()
                .unwrap_or(defaults.interface_fee_pct),
            default_gas_estimate: get("DEFAULT_GAS_ESTIMATE", "150000".to_string())
                .parse()
                .unwrap_or(defaults.default_gas_estimate),
            default_slippage_tolerance: get("DEFAULT_SLIPPAGE_TOLERANCE", "0.10".to_string())
                .parse()
                .unwrap_or(defaults.default_slippage_tolerance),
            slippage_tolerances: raw("SLIPPAGE_TOLERANCES")
                .map(|s| SlippageTable::parse(defaults.default_slippage_tolerance, &s).by_symbol)
                .unwrap_or(defaults.slippage_tolerances.clone()),
            trade_pairs: raw("TRADE_PAIRS")
                .map(|s| parse_pairs(&s))
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.trade_pairs.clone()),

            // Scheduling
            max_workers: get("MAX_WORKERS", "4".to_string()).parse().unwrap_or(defaults.max_workers),
            enable_parallel: get("ENABLE_PARALLEL", "true".to_string())
                .parse()
                .unwrap_or(defaults.enable_parallel),
            run_mode: match get("RUN_MODE", "loop".to_string()).to_lowercase().as_str() {
                "once" | "single" => RunMode::Once,
                _ => RunMode::Loop,
            },
            cycle_delay_min_secs: get("CYCLE_DELAY_MIN_SECS", "900".to_string())
                .parse()
                .unwrap_or(defaults.cycle_delay_min_secs),
            cycle_delay_max_secs: get("CYCLE_DELAY_MAX_SECS", "1800".to_string())
                .parse()
                .unwrap_or(defaults.cycle_delay_max_secs),

            // Prices
            eth_price_ttl_secs: get("ETH_PRICE_TTL_SECS", "300".to_string())
                .parse()
                .unwrap_or(defaults.eth_price_ttl_secs),
            fallback_eth_price_usd: get("FALLBACK_ETH_PRICE_USD", "3000".to_string())
                .parse()
                .unwrap_or(defaults.fallback_eth_price_usd),
            coingecko_api_url: get("COINGECKO_API_URL", defaults.coingecko_api_url.clone()),

            // Timeouts
            rpc_timeout_secs: get("RPC_TIMEOUT_SECS", "10".to_string())
                .parse()
                .unwrap_or(defaults.rpc_timeout_secs),
            http_timeout_secs: get("HTTP_TIMEOUT_SECS", "10".to_string())
                .parse()
                .unwrap_or(defaults.http_timeout_secs),

            // Output
            save_dir: get("SAVE_DIR", defaults.save_dir.clone()),
            log_dir: get("LOG_DIR", defaults.log_dir.clone()),
            file_version: get("FILE_VERSION", defaults.file_version.clone()),

            // API Keys
            etherscan_api_key: var("ETHERSCAN_API_KEY").filter(|k| !k.trim().is_empty()),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    // ============================================
    // DERIVED VALUES
    // ============================================

    pub fn fee_tiers(&self) -> Vec<FeeTier> {
        self.pool_fee_tiers.iter().copied().map(FeeTier).collect()
    }

    pub fn slippage_table(&self) -> SlippageTable {
        SlippageTable {
            default: self.default_slippage_tolerance,
            by_symbol: self.slippage_tolerances.clone(),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            fee_tiers: self.fee_tiers(),
            interface_fee_pct: self.interface_fee_pct,
            default_gas_estimate: self.default_gas_estimate,
            call_timeout: self.rpc_timeout(),
        }
    }

    /// Resolve pair symbols against the token table
    pub fn resolved_pairs(&self) -> Result<Vec<(Token, Token)>> {
        self.trade_pairs
            .iter()
            .map(|(a, b)| {
                let token_in = get_token(a).ok_or_else(|| eyre!("Unknown token in TRADE_PAIRS: {}", a))?;
                let token_out = get_token(b).ok_or_else(|| eyre!("Unknown token in TRADE_PAIRS: {}", b))?;
                Ok((token_in, token_out))
            })
            .collect()
    }

    pub fn worker_count(&self) -> usize {
        if self.enable_parallel {
            self.max_workers.max(1)
        } else {
            1
        }
    }

    pub fn factory(&self) -> Result<Address> {
        Address::from_str(self.factory_address.trim())
            .map_err(|e| eyre!("Invalid FACTORY_ADDRESS {}: {}", self.factory_address, e))
    }

    pub fn quoter_v1(&self) -> Result<Option<Address>> {
        parse_optional_address("QUOTER_ADDRESS", &self.quoter_address)
    }

    pub fn quoter_v2(&self) -> Result<Option<Address>> {
        parse_optional_address("QUOTER_V2_ADDRESS", &self.quoter_v2_address)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn eth_price_ttl(&self) -> Duration {
        Duration::from_secs(self.eth_price_ttl_secs)
    }

    pub fn csv_dir(&self) -> PathBuf {
        PathBuf::from(&self.save_dir)
    }

    /// `<LOG_DIR>/uniquotes_<version>_<YYYYMMDD>.log`
    pub fn log_path(&self, date: DateTime<Utc>) -> PathBuf {
        PathBuf::from(&self.log_dir).join(format!(
            "uniquotes_{}_{}.log",
            self.file_version,
            date.format("%Y%m%d")
        ))
    }

    /// RPC URL with any API key masked, safe to print
    pub fn redacted_rpc_url(&self) -> String {
        match self.rpc_url.rfind('/') {
            Some(idx) if self.rpc_url.len() - idx > 16 => format!("{}/***", &self.rpc_url[..idx]),
            _ => self.rpc_url.clone(),
        }
    }

    /// Validate configuration before connecting
    pub fn validate(&self) -> Result<()> {
        // Check RPC URL
        if self.rpc_url.is_empty() || self.rpc_url.contains(PLACEHOLDER_API_KEY) {
            return Err(eyre!("Invalid RPC_URL - set RPC_URL or INFURA_API_KEY"));
        }

        self.factory()?;
        let v1 = self.quoter_v1()?;
        let v2 = self.quoter_v2()?;
        if v1.is_none() && v2.is_none() {
            return Err(eyre!("At least one of QUOTER_ADDRESS / QUOTER_V2_ADDRESS must be set"));
        }

        if self.usd_notionals.is_empty() {
            return Err(eyre!("USD_NOTIONALS must not be empty"));
        }
        if let Some(bad) = self.usd_notionals.iter().find(|n| !n.is_finite() || **n <= 0.0) {
            return Err(eyre!("USD_NOTIONALS must be positive (got {})", bad));
        }

        if self.pool_fee_tiers.is_empty() {
            return Err(eyre!("POOL_FEE_TIERS must not be empty"));
        }
        if self.pool_fee_tiers.windows(2).any(|w| w[0] >= w[1]) {
            return Err(eyre!(
                "POOL_FEE_TIERS must be strictly ascending (got {:?})",
                self.pool_fee_tiers
            ));
        }

        if !(0.0..1.0).contains(&self.interface_fee_pct) {
            return Err(eyre!(
                "INTERFACE_FEE_PCT must be in [0, 1) (currently {})",
                self.interface_fee_pct
            ));
        }

        let tolerances = std::iter::once(&self.default_slippage_tolerance).chain(self.slippage_tolerances.values());
        for tolerance in tolerances {
            if !(0.0..=1.0).contains(tolerance) {
                return Err(eyre!("Slippage tolerance must be in [0, 1] (got {})", tolerance));
            }
        }

        if self.max_workers == 0 {
            return Err(eyre!("MAX_WORKERS must be at least 1"));
        }
        if self.cycle_delay_min_secs > self.cycle_delay_max_secs {
            return Err(eyre!(
                "CYCLE_DELAY_MIN_SECS ({}) exceeds CYCLE_DELAY_MAX_SECS ({})",
                self.cycle_delay_min_secs,
                self.cycle_delay_max_secs
            ));
        }
        if self.rpc_timeout_secs == 0 || self.http_timeout_secs == 0 {
            return Err(eyre!("Timeouts must be at least 1 second"));
        }

        if self.trade_pairs.is_empty() {
            return Err(eyre!("TRADE_PAIRS must not be empty"));
        }
        for (token_in, token_out) in self.resolved_pairs()? {
            if token_in == token_out {
                return Err(eyre!("TRADE_PAIRS entry {}:{} quotes a token against itself", token_in, token_out));
            }
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let quoter_state = |addr: &str| if addr.trim().is_empty() { "✗ Disabled" } else { "✓ Configured" };

        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              UNIQUOTES - CONFIGURATION                     ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Run Mode:          {:^40} ║", self.run_mode);
        println!("║ Network:           {:^40} ║", self.network);
        println!("║ Chain ID:          {:^40} ║", self.chain_id);
        println!("║ RPC:               {:^40} ║", truncate(&self.redacted_rpc_url(), 40));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ QUOTERS                                                    ║");
        println!("║ • Quoter V1:       {:^40} ║", quoter_state(&self.quoter_address));
        println!("║ • Quoter V2:       {:^40} ║", quoter_state(&self.quoter_v2_address));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ QUOTES                                                     ║");
        println!("║ • Pairs:           {:^40} ║", self.trade_pairs.len());
        println!("║ • Notionals:       {:^40} ║", truncate(&format!("{:?}", self.usd_notionals), 40));
        println!("║ • Fee Tiers:       {:^40} ║", truncate(&format!("{:?}", self.pool_fee_tiers), 40));
        println!("║ • Interface Fee:   {:>38.2}% ║", self.interface_fee_pct * 100.0);
        println!("║ • Slippage (dflt): {:>38.2}% ║", self.default_slippage_tolerance * 100.0);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ SCHEDULING                                                 ║");
        println!("║ • Workers:         {:^40} ║", self.worker_count());
        println!("║ • Cycle Delay:     {:^40} ║", format!("{}-{}s", self.cycle_delay_min_secs, self.cycle_delay_max_secs));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ GAS ORACLE                                                 ║");
        println!("║ • Etherscan API:   {:^40} ║",
            if self.etherscan_api_key.is_some() { "✓ Configured" } else { "✗ Using RPC" }
        );
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ OUTPUT                                                     ║");
        println!("║ • Save Dir:        {:^40} ║", truncate(&self.save_dir, 40));
        println!("║ • Log Dir:         {:^40} ║", truncate(&self.log_dir, 40));
        println!("║ • File Version:    {:^40} ║", self.file_version);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        let slippage = SlippageTable::default();

        Self {
            rpc_url: format!("{}{}", INFURA_URL_TEMPLATE, PLACEHOLDER_API_KEY),
            chain_id: 1,
            network: "ethereum".to_string(),
            factory_address: UNISWAP_V3_FACTORY.to_string(),
            quoter_address: UNISWAP_V3_QUOTER.to_string(),
            quoter_v2_address: UNISWAP_V3_QUOTER_V2.to_string(),
            usd_notionals: DEFAULT_NOTIONALS.to_vec(),
            pool_fee_tiers: FeeTier::DEFAULT_TIERS.iter().map(|t| t.0).collect(),
            interface_fee_pct: DEFAULT_INTERFACE_FEE_PCT,
            default_gas_estimate: DEFAULT_GAS_ESTIMATE,
            default_slippage_tolerance: DEFAULT_SLIPPAGE_TOLERANCE,
            slippage_tolerances: slippage.by_symbol,
            trade_pairs: default_trade_pairs(),
            max_workers: 4,
            enable_parallel: true,
            run_mode: RunMode::Loop,
            cycle_delay_min_secs: 900,
            cycle_delay_max_secs: 1800,
            eth_price_ttl_secs: 300,
            fallback_eth_price_usd: FALLBACK_ETH_PRICE_USD,
            coingecko_api_url: crate::oracle::COINGECKO_API_URL.to_string(),
            rpc_timeout_secs: 10,
            http_timeout_secs: 10,
            save_dir: "./data".to_string(),
            log_dir: "./logs".to_string(),
            file_version: "v1".to_string(),
            etherscan_api_key: None,
        }
    }
}

// ============================================
// PARSING HELPERS
// ============================================

/// Comma-separated values, skipping anything that doesn't parse
fn parse_list<T: FromStr>(s: &str) -> Vec<T> {
    s.split(',').filter_map(|item| item.trim().parse().ok()).collect()
}

/// "USDC:ETH,USDT:WBTC"
fn parse_pairs(s: &str) -> Vec<(String, String)> {
    s.split(',')
        .filter_map(|item| {
            let (a, b) = item.split_once(':')?;
            let (a, b) = (a.trim().to_uppercase(), b.trim().to_uppercase());
            (!a.is_empty() && !b.is_empty()).then_some((a, b))
        })
        .collect()
}

fn parse_optional_address(name: &str, value: &str) -> Result<Option<Address>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Address::from_str(value)
        .map(Some)
        .map_err(|e| eyre!("Invalid {} {}: {}", name, value, e))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    fn valid() -> Config {
        Config::from_vars(vars(&[("INFURA_API_KEY", "abc123")]))
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.usd_notionals, vec![500.0, 2000.0, 10000.0]);
        assert_eq!(config.fee_tiers(), FeeTier::DEFAULT_TIERS.to_vec());
        assert_eq!(config.trade_pairs.len(), 8);
        assert_eq!(config.run_mode, RunMode::Loop);
        assert_eq!(config.worker_count(), 4);
        // Placeholder key fails validation
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_infura_key_builds_url() {
        let config = valid();
        assert_eq!(config.rpc_url, "https://mainnet.infura.io/v3/abc123");
        config.validate().unwrap();

        let explicit = Config::from_vars(vars(&[("RPC_URL", "http://localhost:8545"), ("INFURA_API_KEY", "abc")]));
        assert_eq!(explicit.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_vars(vars(&[
            ("RPC_URL", "http://localhost:8545"),
            ("USD_NOTIONALS", "100, 250.5,bogus"),
            ("POOL_FEE_TIERS", "500,3000"),
            ("TRADE_PAIRS", "usdc:eth, USDT:LINK"),
            ("RUN_MODE", "once"),
            ("ENABLE_PARALLEL", "false"),
            ("MAX_WORKERS", "8"),
            ("SLIPPAGE_TOLERANCES", "LINK:0.2"),
            ("QUOTER_ADDRESS", ""),
        ]));

        assert_eq!(config.usd_notionals, vec![100.0, 250.5]);
        assert_eq!(config.fee_tiers(), vec![FeeTier(500), FeeTier(3000)]);
        assert_eq!(
            config.trade_pairs,
            vec![("USDC".to_string(), "ETH".to_string()), ("USDT".to_string(), "LINK".to_string())]
        );
        assert_eq!(config.run_mode, RunMode::Once);
        assert_eq!(config.worker_count(), 1);
        assert_eq!(config.slippage_table().tolerance_for("LINK"), 0.2);
        assert_eq!(config.slippage_table().tolerance_for("ETH"), DEFAULT_SLIPPAGE_TOLERANCE);
        assert_eq!(config.quoter_v1().unwrap(), None);
        assert!(config.quoter_v2().unwrap().is_some());
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = valid();
        config.pool_fee_tiers = vec![3000, 500];
        assert!(config.validate().is_err());

        let mut config = valid();
        config.usd_notionals = vec![];
        assert!(config.validate().is_err());

        let mut config = valid();
        config.cycle_delay_min_secs = 2000;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.trade_pairs = vec![("USDC".to_string(), "DOGE".to_string())];
        assert!(config.validate().is_err());

        let mut config = valid();
        config.quoter_address.clear();
        config.quoter_v2_address.clear();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolved_pairs() {
        let pairs = valid().resolved_pairs().unwrap();
        assert_eq!(pairs.len(), 8);
        assert_eq!(pairs[0].0.symbol, "USDC");
        assert_eq!(pairs[0].1.decimals, 18);
    }

    #[test]
    fn test_log_path_and_redaction() {
        let config = valid();
        let date = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(config.log_path(date), PathBuf::from("./logs/uniquotes_v1_20240501.log"));

        let mut config = valid();
        config.rpc_url = "https://mainnet.infura.io/v3/0123456789abcdef0123".to_string();
        assert_eq!(config.redacted_rpc_url(), "https://mainnet.infura.io/v3/***");
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uniquotes.toml");

        let config = valid();
        config.save_to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }
}
