use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use spdlog::{info, warn};

use blog::config::{open_config, Config};
use blog::logger::configure_logger;
use blog::server::{server_run, AppState};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,
}

/// Startup stops here with an error status when no usable configuration is found
fn load_config(config_path: Option<String>) -> Result<Config> {
    open_config(config_path.map(PathBuf::from)).context("Please run blog --help")
}

#[ntex::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config_path)?;

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    info!("Starting blog =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
    info!("Storage backend: {:?}", config.storage.backend);

    let state = AppState::new(config).context("Error initializing the blog")?;
    server_run(state).await.context("Error running the server")
}
