mod admin;
mod market;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mercado-cli")]
#[command(about = "Mercado marketplace command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Replace marketplace data with a seed fixture
    Seed {
        /// Seed file to load (defaults to `MERCADO_SEED_PATH`)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// List active sellers around a point, nearest first
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in kilometres
        #[arg(long, default_value = "5")]
        radius_km: f64,
    },
    /// Rank grid cells by recent order activity
    Zones {
        /// Look-back window, e.g. "30 days" or "2 weeks"
        #[arg(long, default_value = "30 days")]
        time_range: String,
        /// Decimal places kept when bucketing coordinates
        #[arg(long, default_value = "1")]
        precision: u32,
        /// Drop cells with fewer orders
        #[arg(long, default_value = "3")]
        min_count: usize,
        /// Maximum number of cells to show
        #[arg(long, default_value = "20")]
        top: usize,
    },
    /// Suggest a location for a seller from their customers' positions
    Suggest {
        #[arg(long)]
        seller_id: i64,
    },
    /// Show platform and per-category statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("mercado-cli ready; run with --help to list commands");
        return Ok(());
    };

    let config = mercado_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = mercado_db::PoolConfig::from_app_config(&config);
    let pool = mercado_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => admin::run_migrate(&pool).await?,
        Commands::Seed { path } => {
            let path = path.unwrap_or_else(|| config.seed_path.clone());
            admin::run_seed(&pool, &path).await?;
        }
        Commands::Nearby {
            lat,
            lng,
            radius_km,
        } => market::run_nearby(&pool, lat, lng, radius_km).await?,
        Commands::Zones {
            time_range,
            precision,
            min_count,
            top,
        } => {
            let request = market::ZonesRequest {
                time_range,
                precision,
                min_count,
                top,
            };
            market::run_zones(&pool, &request, config.analysis_timeout_secs).await?;
        }
        Commands::Suggest { seller_id } => {
            market::run_suggest(&pool, seller_id, config.analysis_timeout_secs).await?;
        }
        Commands::Stats => market::run_stats(&pool).await?,
    }

    pool.close().await;
    Ok(())
}
