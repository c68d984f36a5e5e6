use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod extract;
mod fetcher;
mod merge;
mod models;
mod normalize;
mod pipeline;
mod readiness;
mod report;
mod resolver;
mod runner;

use config::{load_config, Config};
use models::Result;
use runner::Runner;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    let directive = format!("npri_scraper={}", config.logging.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| "npri_scraper=info".parse().unwrap()),
            ),
        )
        .init();

    tokio::fs::create_dir_all(&config.output.directory).await?;

    let runner = Runner::new(config).await?;

    tokio::select! {
        result = runner.run() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
