use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "metroaq")]
#[command(about = "MetroAQ live air quality map, from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the live dataset and print the city-wide summary.
    Status,
    /// Search wards and stations by name.
    Search {
        /// Name fragment to match, case-insensitive.
        query: String,
    },
    /// Trigger a backend recompute, wait out the refetch delay, and print
    /// the regenerated summary.
    Recompute,
    /// Poll the dataset on an interval, printing the summary after each
    /// refresh.
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
        /// Stop after this many refreshes; runs until interrupted if unset.
        #[arg(long)]
        count: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = metroaq_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();
    tracing::debug!(?config, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Commands::Status => commands::run_status(&config).await,
        Commands::Search { query } => commands::run_search(&config, &query).await,
        Commands::Recompute => commands::run_recompute(&config).await,
        Commands::Watch {
            interval_secs,
            count,
        } => commands::run_watch(&config, interval_secs, count).await,
    }
}
