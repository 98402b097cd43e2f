//! FreeKassa CLI
//!
//! Query the shop balance and create or list payment orders from the
//! command line.

mod commands;
mod config;

use clap::Parser;
use commands::Command;
use config::{ConfigLoader, Overrides};
use freekassa_sdk::client::ClientError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Exit code when the gateway rejected the request.
const EXIT_GATEWAY_ERROR: u8 = 2;
/// Exit code when the gateway could not be reached.
const EXIT_NETWORK_ERROR: u8 = 3;

/// FreeKassa - signed client for the FreeKassa payment gateway
#[derive(Parser, Debug)]
#[command(name = "freekassa")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./freekassa.toml")]
    config: PathBuf,

    /// Shop identifier
    #[arg(long, env = "FREEKASSA_SHOP_ID")]
    shop_id: Option<String>,

    /// Secret API key
    #[arg(long, env = "FREEKASSA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Override the API root (e.g. a sandbox)
    #[arg(long, env = "FREEKASSA_API_URL")]
    api_url: Option<Url>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Pick up a local .env before anything reads the environment, RUST_LOG included
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    init_tracing(std::env::var("RUST_LOG").ok());

    if let Err(e) = dotenv {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let args = Args::parse();

    // Load configuration
    let overrides = Overrides {
        shop_id: args.shop_id,
        api_key: args.api_key,
        api_url: args.api_url,
    }
    .with_fallbacks(|name| std::env::var(name).ok());
    let settings = ConfigLoader::new(&args.config, overrides)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::debug!("Using gateway at {}", settings.api_url);

    let client = settings.into_client();

    match commands::run(&client, args.command).await {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(ClientError::Gateway(e)) => {
            tracing::error!(status = e.status_code(), "Gateway rejected the request");
            eprintln!("{}", e.message().unwrap_or("gateway rejected the request"));
            Ok(ExitCode::from(EXIT_GATEWAY_ERROR))
        }
        Err(e) if e.is_network() => {
            tracing::error!("Could not reach the gateway: {}", e);
            Ok(ExitCode::from(EXIT_NETWORK_ERROR))
        }
        Err(e) => Err(e.into()),
    }
}

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "info,reqwest=warn,hyper_util=warn";

/// Build the log filter from `RUST_LOG`-style directives.
fn env_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(directives: Option<String>) {
    let filter = env_filter(directives);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
