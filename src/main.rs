use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coinsync::client::{CoinService, HttpCoinClient};
use coinsync::config::Config;
use coinsync::sync::{PaginatedCollector, SyncOptions, SyncOrchestrator};

#[derive(Parser)]
#[command(
    name = "coinsync",
    version,
    about = "Sync coins with the hatch backend and deploy missing trading pools",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML config file; environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Coin API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify every undeployed coin, then deploy the ones missing a pair
    Sync {
        /// Maximum concurrent requests per batch
        #[arg(long)]
        concurrency: Option<usize>,

        /// Coins per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Pause between batches in milliseconds
        #[arg(long)]
        batch_pause_ms: Option<u64>,

        /// Page size for listing coins
        #[arg(long)]
        page_size: Option<usize>,

        /// Process coins one at a time
        #[arg(long, default_value = "false")]
        sequential: bool,
    },

    /// Count coins by verification and deployment state
    Status {
        /// Page size for listing coins
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Print one coin as JSON
    Coin {
        /// Coin id
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.service.base_url = base_url.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    tracing::info!(base_url = %config.service.base_url, "coinsync starting");

    match cli.command {
        Commands::Sync {
            concurrency,
            batch_size,
            batch_pause_ms,
            page_size,
            sequential,
        } => {
            if let Some(concurrency) = concurrency {
                config.sync.max_concurrent_requests = concurrency;
            }
            if let Some(batch_size) = batch_size {
                config.sync.batch_size = batch_size;
            }
            if let Some(pause) = batch_pause_ms {
                config.sync.batch_pause_ms = pause;
            }
            if let Some(page_size) = page_size {
                config.sync.page_size = page_size;
            }
            if sequential {
                config.sync.parallel = false;
            }
            sync(config).await?;
        }

        Commands::Status { page_size } => {
            if let Some(page_size) = page_size {
                config.sync.page_size = page_size;
            }
            status(config).await?;
        }

        Commands::Coin { id } => {
            coin(config, id).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("coinsync=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("coinsync={level},warn")))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

fn build_client(config: &Config) -> Result<HttpCoinClient> {
    config.validate().context("Invalid configuration")?;
    HttpCoinClient::from_config(config).context("Failed to create coin service client")
}

async fn sync(config: Config) -> Result<()> {
    let client = Arc::new(build_client(&config)?);
    let mut orchestrator = SyncOrchestrator::new(client, SyncOptions::from_config(&config));

    println!("Syncing and deploying coins...");
    let report = orchestrator.run().await.context("Sync run failed")?;

    println!(
        "COMPLETE: verified {} coins, deployed {} coins out of {} total",
        report.verified, report.deployed, report.total_considered
    );
    if report.verify_failures + report.deploy_failures > 0 {
        println!(
            "  Skipped after errors: {} during verify, {} during deploy",
            report.verify_failures, report.deploy_failures
        );
    }
    Ok(())
}

async fn status(config: Config) -> Result<()> {
    let client = build_client(&config)?;
    let snapshot = PaginatedCollector::new(&client)
        .collect_all(config.sync.page_size)
        .await
        .context("Failed to list coins")?;

    println!("Coins:       {}", snapshot.len());
    println!("  Verified:  {}", snapshot.verified_count());
    println!("  Deployed:  {}", snapshot.deployed_count());
    println!("  Undeployed: {}", snapshot.candidates().len());
    Ok(())
}

async fn coin(config: Config, id: i64) -> Result<()> {
    let client = build_client(&config)?;
    let coin = client
        .get_coin(id)
        .await
        .with_context(|| format!("Failed to fetch coin {id}"))?;

    println!("{}", serde_json::to_string_pretty(&coin)?);
    Ok(())
}
