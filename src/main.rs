//! Polymarket ladder bot entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Input;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use polymarket_ladder::bot::{LadderBot, SessionOptions, Strategy};
use polymarket_ladder::config::Config;
use polymarket_ladder::gateway::MarketSource;
use polymarket_ladder::market::{
    parse_outcome_index, search_markets, slug_from_url, PolymarketClient,
};
use polymarket_ladder::metrics;
use polymarket_ladder::monitor::MonitorOutcome;
use polymarket_ladder::signing::{address_from_private_key, signature_type_label};

const RULE: &str = "======================================================================";

/// Ladder-entry and take-profit bot for Polymarket binary markets.
#[derive(Parser, Debug)]
#[command(name = "polymarket-ladder")]
#[command(about = "Place a ladder of limit buys and exit at a profit multiple")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one ladder session (default). Prompts for anything not given.
    Run {
        /// Market URL or slug.
        #[arg(long)]
        url: Option<String>,

        /// Minimum minutes the market must stay open.
        #[arg(long)]
        threshold: Option<i64>,

        /// Outcome to trade: an index or yes/no/up/down.
        #[arg(long)]
        outcome: Option<String>,
    },

    /// List markets whose question or slug contains a keyword.
    Search {
        /// Keyword to look for.
        keyword: String,
    },

    /// Show a market's tokens and time remaining.
    Market {
        /// Market URL or slug.
        url: String,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("polymarket_ladder=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    metrics::init_metrics();

    match args.command {
        Some(Command::Run {
            url,
            threshold,
            outcome,
        }) => cmd_run(url, threshold, outcome).await,
        Some(Command::Search { keyword }) => cmd_search(&keyword).await,
        Some(Command::Market { url }) => cmd_market(&url).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        None => cmd_run(None, None, None).await,
    }
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().context("failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("configuration validation failed: {}", e))?;
    Ok(config)
}

/// Run one session against the live venue.
async fn cmd_run(
    url: Option<String>,
    threshold: Option<i64>,
    outcome: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config()?;

    // Prompt only when the market was not given on the command line.
    let interactive = url.is_none();
    let url = match url {
        Some(url) => url,
        None => Input::<String>::new()
            .with_prompt("Polymarket market URL")
            .interact_text()?,
    };
    let slug = slug_from_url(&url)?;

    let time_threshold_minutes = match threshold {
        Some(t) => t,
        None if interactive => Input::<i64>::new()
            .with_prompt("Minimum minutes before close")
            .default(config.time_threshold_minutes)
            .interact_text()?,
        None => config.time_threshold_minutes,
    };
    anyhow::ensure!(time_threshold_minutes >= 0, "threshold must not be negative");

    let outcome_index = match outcome {
        Some(o) => parse_outcome_index(&o).map_err(anyhow::Error::msg)?,
        None => config.outcome_index,
    };

    if config.metrics_enabled {
        metrics::install_prometheus(config.metrics_port)?;
    }

    let strategy = Strategy::from_config(&config);
    info!("Configuration loaded successfully");
    info!("Ladder prices: {:?}", strategy.ladder_prices);
    info!("Size per step: {} shares", strategy.size_per_step);
    info!("Profit multiple: {}x", strategy.profit_multiple);
    info!("Time threshold: {} minutes", time_threshold_minutes);

    let client = PolymarketClient::connect(&config)
        .await
        .context("failed to authenticate with the CLOB")?;
    let bot = LadderBot::new(client, strategy);
    let options = SessionOptions {
        time_threshold_minutes,
        outcome_index,
    };

    let report = tokio::select! {
        result = bot.run(&slug, options) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; resting orders may still be open on the venue");
            return Ok(());
        }
    };

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            error!("Session failed: {}", e);
            return Err(e.into());
        }
    };

    info!("========================================");
    info!("SESSION SUMMARY");
    info!("========================================");
    info!("Market: {}", report.market_slug);
    info!("Token: {}", report.token_id);
    if report.skipped() {
        info!("Skipped: not enough time before close");
    }
    if let Some(execution) = &report.execution {
        info!(
            "Ladder orders placed: {} ({} failed)",
            execution.placed.len(),
            execution.failed
        );
        info!("Max cost: ${}", execution.max_cost);
    }
    match &report.outcome {
        Some(MonitorOutcome::Exited {
            amount,
            value,
            liquidation,
            ..
        }) => {
            info!("Exited {} shares valued at ${}", amount, value);
            if !liquidation.is_clean() {
                warn!("Liquidation was incomplete: {:?}", liquidation);
            }
        }
        Some(MonitorOutcome::Finished { .. }) => info!("No position left to exit"),
        None => {}
    }
    info!("========================================");

    Ok(())
}

/// Search the market listing for a keyword. Needs no wallet.
async fn cmd_search(keyword: &str) -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let client = PolymarketClient::new(&config)?;

    println!("Searching for markets matching '{}'...\n", keyword);
    let markets = search_markets(&client, keyword).await?;

    if markets.is_empty() {
        println!("No markets found matching '{}'", keyword);
        return Ok(());
    }

    for market in &markets {
        println!("{}", market.question);
        println!("  Slug: {}", market.market_slug);
        println!("  Condition ID: {}", market.condition_id);
        for token in &market.tokens {
            println!("  {} token: {}", token.outcome, token.token_id);
        }
        println!();
    }
    println!("Found {} matching markets", markets.len());

    Ok(())
}

/// Resolve and print a market. Needs no wallet.
async fn cmd_market(url: &str) -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let client = PolymarketClient::new(&config)?;
    let slug = slug_from_url(url)?;

    println!("{}", RULE);
    println!("MARKET LOOKUP");
    println!("{}", RULE);

    match client.resolve_market(&slug).await {
        Ok(market) => {
            println!("  Slug: {}", market.slug);
            println!("  Condition ID: {}", market.condition_id);
            if let Some(q) = &market.question {
                println!("  Question: {}", q);
            }
            for (index, token) in market.tokens.iter().enumerate() {
                println!("  [{}] {}: {}", index, token.outcome, token.token_id);
            }
            println!("  Time Remaining: {}", market.time_remaining_str());
            println!("{}", RULE);
            Ok(())
        }
        Err(e) => {
            println!("MARKET NOT FOUND");
            println!("  Error: {}", e);
            println!("{}", RULE);
            Err(e.into())
        }
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("{}", RULE);
    println!("LADDER BOT - CONFIGURATION CHECK");
    println!("{}", RULE);

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Checking private key... ");
    match address_from_private_key(&config.polymarket_private_key) {
        Ok(addr) => {
            println!("OK");
            println!("  Wallet address: {}", addr);
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Private key invalid"));
        }
    }

    let strategy = Strategy::from_config(&config);
    let monitor = config.monitor_settings();

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!(
        "  Signature Type: {} ({})",
        config.polymarket_signature_type,
        signature_type_label(config.polymarket_signature_type)
    );
    println!(
        "  API Credentials: {}",
        if config.polymarket_api_key.is_some() {
            "configured"
        } else {
            "derived from wallet at startup"
        }
    );
    if config.is_magic_link() {
        match &config.polymarket_funder {
            Some(funder) => println!("  Funder Address: {}", funder),
            None => println!("  WARNING: Magic.link requires POLYMARKET_FUNDER to be set!"),
        }
    }
    println!("  Ladder Prices: {:?}", strategy.ladder_prices);
    println!("  Size Per Step: {} shares", strategy.size_per_step);
    println!("  Profit Multiple: {}x", strategy.profit_multiple);
    println!("  Exit Price: ${}", strategy.exit_price);
    println!("  Time Threshold: {} minutes", config.time_threshold_minutes);
    println!("  Outcome Index: {}", config.outcome_index);
    println!("  Poll Interval: {:?}", monitor.poll_interval);
    println!(
        "  Max Consecutive Errors: {}",
        monitor
            .max_consecutive_errors
            .map_or("unbounded".to_string(), |n| n.to_string())
    );
    println!("{}", RULE);
    println!("CONFIGURATION CHECK PASSED");
    println!("{}", RULE);

    Ok(())
}
