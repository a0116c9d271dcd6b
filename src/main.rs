//! breaker-sim: drive circuit breakers from the command line.
//!
//! Loads breaker definitions from a TOML file, then registers a scripted
//! sequence of outcomes and prints the breaker state after each step as a
//! JSON line. Without a file, or without `[defaults]` in it, only the
//! breakers listed in the file can be run.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use count_breaker::config::{load_config, BreakerFileConfig};
use count_breaker::observability::{logging, metrics};
use count_breaker::simulation::{check_report, run_outcomes};
use count_breaker::{BreakerRegistry, Outcome};

#[derive(Parser)]
#[command(name = "breaker-sim")]
#[command(about = "Simulate circuit breaker behavior for a sequence of outcomes", long_about = None)]
struct Cli {
    /// Breaker configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the configured breakers
    Check,
    /// Register outcomes (success|anomaly|fatal, or s|a|f) against one breaker
    Run {
        /// Dependency the outcomes belong to
        #[arg(short, long)]
        service: String,

        /// Pause between outcomes, in milliseconds
        #[arg(short, long, default_value_t = 0)]
        interval_ms: u64,

        #[arg(required = true)]
        outcomes: Vec<Outcome>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BreakerFileConfig::default(),
    };
    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let registry = BreakerRegistry::from_config(&config);

    match cli.command {
        Commands::Check => {
            println!("{}", serde_json::to_string_pretty(&check_report(&registry))?);
        }
        Commands::Run {
            service,
            interval_ms,
            outcomes,
        } => {
            let breaker = registry.get_or_create(&service)?;
            let interval = Duration::from_millis(interval_ms);
            run_outcomes(&breaker, &outcomes, interval, |step| {
                println!("{}", serde_json::to_string(step)?);
                Ok::<_, serde_json::Error>(())
            })
            .await?;
        }
    }

    Ok(())
}
