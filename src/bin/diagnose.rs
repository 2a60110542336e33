//! Diagnostic tool - Check configuration and RPC connectivity
//!
//! Run with: cargo run --bin diagnose

use std::env;

use uniquotes::chain::{check_connectivity, connect_http};
use uniquotes::Config;

#[tokio::main]
async fn main() {
    println!("🔍 UNIQUOTES DIAGNOSTIC CHECK\n");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ Failed to load configuration: {}", e);
            return;
        }
    };

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    // Key settings
    let checks = [
        ("RUN_MODE", "loop", "Single cycle or forever?"),
        ("USD_NOTIONALS", "500,2000,10000", "Trade sizes in USD"),
        ("POOL_FEE_TIERS", "100,500,3000,10000", "Fee tiers to try"),
        ("MAX_WORKERS", "4", "Concurrent quote workers"),
        ("CYCLE_DELAY_MIN_SECS", "900", "Shortest pause between cycles"),
        ("CYCLE_DELAY_MAX_SECS", "1800", "Longest pause between cycles"),
        ("SAVE_DIR", "./data", "Where CSV rows go"),
    ];

    for (key, default, desc) in checks {
        let (value, marker) = match env::var(key) {
            Ok(value) => (value, "(from .env)"),
            Err(_) => (default.to_string(), "(default)"),
        };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    println!("  RPC_URL: {}", config.redacted_rpc_url());

    println!("\n═══════════════════════════════════════════════════");
    println!("                    CONTRACTS                       ");
    println!("═══════════════════════════════════════════════════\n");

    match config.factory() {
        Ok(addr) => println!("  Factory:   ✅ {}", addr),
        Err(e) => println!("  Factory:   ❌ {}", e),
    }
    match config.quoter_v1() {
        Ok(Some(addr)) => println!("  Quoter V1: ✅ {}", addr),
        Ok(None) => println!("  Quoter V1: ⚪ Disabled"),
        Err(e) => println!("  Quoter V1: ❌ {}", e),
    }
    match config.quoter_v2() {
        Ok(Some(addr)) => println!("  Quoter V2: ✅ {}", addr),
        Ok(None) => println!("  Quoter V2: ⚪ Disabled (default gas estimate will be used)"),
        Err(e) => println!("  Quoter V2: ❌ {}", e),
    }
    println!(
        "  Etherscan: {}",
        if config.etherscan_api_key.is_some() { "✅ Set" } else { "⚪ Not set (gas from RPC)" }
    );

    println!("\n═══════════════════════════════════════════════════");
    println!("                    VALIDATION                      ");
    println!("═══════════════════════════════════════════════════\n");

    let valid = match config.validate() {
        Ok(()) => {
            println!("  ✅ Configuration is valid");
            true
        }
        Err(e) => {
            println!("  ❌ {}", e);
            false
        }
    };

    match config.resolved_pairs() {
        Ok(pairs) => {
            let work = pairs.len() * config.usd_notionals.len();
            println!("  {} pairs x {} notionals = {} quotes per cycle", pairs.len(), config.usd_notionals.len(), work);
        }
        Err(e) => println!("  ❌ {}", e),
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                   CONNECTIVITY                     ");
    println!("═══════════════════════════════════════════════════\n");

    if !valid {
        println!("  ⏭️  Skipped (fix configuration first)");
        return;
    }

    let provider = match connect_http(&config.rpc_url) {
        Ok(provider) => provider,
        Err(e) => {
            println!("  ❌ {}", e);
            return;
        }
    };

    match check_connectivity(&provider, config.chain_id, config.rpc_timeout()).await {
        Ok(status) => {
            println!("  ✅ Chain ID:     {}", status.chain_id);
            println!("  ✅ Latest block: {}", status.block_number);
        }
        Err(e) => {
            println!("  ❌ {}", e);
            return;
        }
    }

    println!("\n✅ Diagnostic complete!\n");
}
