//! Uniquotes - Uniswap V3 quote collector
//!
//! Run with: cargo run -- run [--once]
//! Single quote: cargo run -- quote --from USDC --to ETH --notional 500

use alloy_provider::DynProvider;
use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use uniquotes::cache::TtlCache;
use uniquotes::chain::{
    check_connectivity, connect_http, PathQuoter, QuoterSet, QuoterV1, QuoterV2, SingleHopQuoter, UniswapV3Factory,
};
use uniquotes::gas_oracle::GasOracle;
use uniquotes::oracle::{CoinGeckoSource, PriceOracle};
use uniquotes::runner::{format_duration, CycleRunner};
use uniquotes::sink::{CsvSink, RecordMeta, UNKNOWN_MARKER};
use uniquotes::tokens::get_token;
use uniquotes::{logging, BatchScheduler, Config, QuoteEngine, QuoteRequest, RunMode};

/// Gas prices move every block
const GAS_PRICE_TTL: Duration = Duration::from_secs(12);

#[derive(Parser)]
#[command(name = "uniquotes", version, about = "Uniswap V3 quote collector")]
struct Cli {
    /// Load configuration from a TOML file instead of the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Collect quotes for every pair and notional (default)
    Run {
        /// Stop after a single cycle
        #[arg(long)]
        once: bool,
    },
    /// Resolve a single quote and print it (nothing is written)
    Quote {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = 500.0)]
        notional: f64,
    },
    /// Print the effective configuration
    Config,
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" 🦄 UNIQUOTES - Uniswap V3 Quote Collector").cyan().bold()
    );
    println!(
        "{}",
        style("    Fee-Tier Fallback | Slippage Probes | CSV Output").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

/// Everything a quote needs, wired against the live chain
struct Components {
    engine: Arc<QuoteEngine>,
    gas_oracle: Arc<GasOracle>,
}

fn build_components(config: &Config, provider: DynProvider) -> Result<Components> {
    let factory = Arc::new(UniswapV3Factory::new(provider.clone(), config.factory()?));

    let quoters = QuoterSet::new(
        config
            .quoter_v1()?
            .map(|addr| Arc::new(QuoterV1::new(provider.clone(), addr)) as Arc<dyn SingleHopQuoter>),
        config
            .quoter_v2()?
            .map(|addr| Arc::new(QuoterV2::new(provider.clone(), addr)) as Arc<dyn PathQuoter>),
    );

    let gas_oracle = Arc::new(GasOracle::new(
        config.etherscan_api_key.clone(),
        config.chain_id,
        provider,
        config.http_timeout(),
        Arc::new(TtlCache::new(GAS_PRICE_TTL)),
    )?);

    let price_source = Arc::new(CoinGeckoSource::new(
        config.coingecko_api_url.clone(),
        config.http_timeout(),
    )?);
    let price_oracle = Arc::new(PriceOracle::new(
        price_source,
        "ETH",
        Arc::new(TtlCache::new(config.eth_price_ttl())),
        config.fallback_eth_price_usd,
        config.http_timeout(),
    ));

    let engine = Arc::new(QuoteEngine::new(
        factory.clone(),
        factory,
        quoters,
        gas_oracle.clone(),
        price_oracle,
        config.slippage_table(),
        config.engine_settings(),
    ));

    Ok(Components { engine, gas_oracle })
}

async fn connect(config: &Config) -> Result<DynProvider> {
    let provider = connect_http(&config.rpc_url)?;

    match check_connectivity(&provider, config.chain_id, config.rpc_timeout()).await {
        Ok(status) => {
            println!(
                "{} Connected to chain {} (block {})",
                style("✓").green(),
                status.chain_id,
                status.block_number
            );
            Ok(provider)
        }
        Err(e) => {
            error!("Startup connectivity check failed: {}", e);
            Err(e.into())
        }
    }
}

async fn run_collector(config: &Config, force_once: bool, started: Instant) -> Result<()> {
    let provider = connect(config).await?;
    let components = build_components(config, provider)?;

    let sink = Arc::new(CsvSink::in_dir(config.csv_dir(), &config.file_version, Utc::now())?);
    info!("Writing quotes to {}", sink.path().display());

    let scheduler = Arc::new(BatchScheduler::new(
        components.engine,
        components.gas_oracle,
        sink,
        RecordMeta::new(config.network.clone(), config.chain_id),
        config.rpc_timeout(),
    ));

    let mode = if force_once { RunMode::Once } else { config.run_mode };
    let runner = CycleRunner::new(
        scheduler,
        config.resolved_pairs()?,
        config.usd_notionals.clone(),
        config.worker_count(),
        mode,
        (config.cycle_delay_min_secs, config.cycle_delay_max_secs),
    );

    // Exit straight away; in-flight quotes are abandoned
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received, shutting down");
            println!("Total runtime: {}", format_duration(started.elapsed()));
            std::process::exit(0);
        }
    });

    let cycles = runner.run().await;
    info!("Completed {} cycle(s)", cycles);
    Ok(())
}

async fn run_single_quote(config: &Config, from: &str, to: &str, notional: f64) -> Result<()> {
    let token_in = get_token(from).ok_or_else(|| eyre!("Unknown token: {}", from))?;
    let token_out = get_token(to).ok_or_else(|| eyre!("Unknown token: {}", to))?;
    if notional <= 0.0 || !notional.is_finite() {
        return Err(eyre!("Notional must be positive (got {})", notional));
    }

    let provider = connect(config).await?;
    let components = build_components(config, provider)?;

    let request = QuoteRequest::new(token_in, token_out, notional, Utc::now());
    let quote = components.engine.resolve_quote(&request, None).await?;

    println!();
    println!("{}", style(format!("═══ {} ${} ═══", request.direction(), notional)).green().bold());
    println!("  Fee tier:        {}", quote.fee_tier);
    println!(
        "  Pool:            {}",
        quote
            .pool_address
            .map(|a| a.to_string())
            .unwrap_or_else(|| UNKNOWN_MARKER.to_string())
    );
    println!("  Receiving:       {:.8} {}", quote.received, token_out);
    println!("  Price:           ${:.4}", quote.price);
    println!("  Pool fee:        ${:.4}", quote.pool_fee_usd);
    println!("  Interface fee:   ${:.4}", quote.interface_fee_usd);
    println!(
        "  Gas:             {} units @ {:.3} gwei = {:.6} ETH (${:.2})",
        quote.gas_estimate,
        quote.gas_price_wei as f64 / 1e9,
        quote.gas_cost_native,
        quote.gas_cost_usd
    );
    println!("  Effective price: ${:.4}", quote.effective_price);
    println!(
        "  Slippage:        {}",
        quote
            .slippage_pct
            .map(|pct| format!("{:.4}%", pct))
            .unwrap_or_else(|| UNKNOWN_MARKER.to_string())
    );
    println!();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let started = Instant::now();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    if let Some(Command::Config) = cli.command {
        config.print_summary();
        if let Err(e) = config.validate() {
            println!("{} {}", style("✗").red(), e);
        }
        return Ok(());
    }

    logging::init(config.log_path(Utc::now()))?;
    print_banner();

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file");
        return Err(e);
    }

    config.print_summary();
    println!();

    match cli.command {
        Some(Command::Quote { from, to, notional }) => run_single_quote(&config, &from, &to, notional).await?,
        Some(Command::Run { once }) => run_collector(&config, once, started).await?,
        None => run_collector(&config, false, started).await?,
        Some(Command::Config) => {}
    }

    println!("Total runtime: {}", format_duration(started.elapsed()));
    Ok(())
}
