mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "campdb")]
#[command(about = "Campground listing acquisition CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan one or more regions for campground listings
    Scan {
        /// Named region to scan (see `regions` for the list)
        #[arg(long, conflicts_with_all = ["bbox", "all"])]
        region: Option<String>,

        /// Raw bounding box "min_lon,min_lat,max_lon,max_lat"
        #[arg(long, conflicts_with = "all")]
        bbox: Option<String>,

        /// Sweep every US sub-region
        #[arg(long)]
        all: bool,

        /// Cap on pages fetched per region
        #[arg(long)]
        max_pages: Option<u32>,

        /// Concurrent region workers (defaults to the configured bound)
        #[arg(long)]
        workers: Option<usize>,

        /// Skip inline reverse geocoding; addresses can be backfilled later
        #[arg(long)]
        no_geocode: bool,
    },
    /// Resolve addresses for stored campgrounds that lack one
    Backfill {
        /// Maximum rows to process in this pass
        #[arg(long, default_value_t = 100)]
        limit: i64,

        /// Concurrent geocode workers (defaults to the configured count)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List the named regions and their bounding boxes
    Regions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // `regions` needs neither config nor a database.
    if matches!(cli.command, Commands::Regions) {
        commands::print_regions();
        return Ok(());
    }

    let config = campdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = campdb_db::PoolConfig::from_app_config(&config);
    let pool = campdb_db::connect_pool(&config.database_url, pool_config).await?;
    campdb_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Scan {
            region,
            bbox,
            all,
            max_pages,
            workers,
            no_geocode,
        } => {
            commands::run_scan(
                &pool,
                &config,
                &commands::ScanArgs {
                    region,
                    bbox,
                    all,
                    max_pages,
                    workers,
                    no_geocode,
                },
            )
            .await
        }
        Commands::Backfill { limit, workers } => {
            commands::run_backfill(&pool, &config, limit, workers).await
        }
        Commands::Regions => Ok(()),
    }
}
