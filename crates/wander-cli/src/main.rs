mod dump;
mod search;
mod suggest;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wander_core::{AppConfig, LocationProvider, LocationRecord, SuggestError};
use wander_providers::{FoursquareClient, FoursquareCredentials, IpdataClient};

#[derive(Debug, Parser)]
#[command(name = "wander")]
#[command(about = "Suggests nearby venues, closest first (mostly)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up this device's location and save it as JSON
    Locate {
        /// Output file
        #[arg(long, default_value = "location_data.json")]
        out: PathBuf,
    },
    /// Search for venues and save the raw and suggestion-ordered lists
    Search {
        /// Free-text venue query, e.g. "coffee"
        query: String,

        /// Use a saved location file instead of looking the location up
        #[arg(long)]
        location_file: Option<PathBuf>,

        /// Directory for venues.json and reordered_venues.json
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Walk through suggestions interactively
    Suggest {
        /// Free-text venue query, e.g. "coffee"
        query: String,

        /// Use a saved location file instead of looking the location up
        #[arg(long)]
        location_file: Option<PathBuf>,
    },
}

/// Provider clients built from the loaded configuration.
pub(crate) struct Providers {
    pub locator: IpdataClient,
    pub foursquare: FoursquareClient,
}

impl Providers {
    fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let locator = IpdataClient::new(
            &config.ipdata_api_key,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retries(config.max_retries, config.retry_backoff_base_ms);
        let foursquare = FoursquareClient::new(
            FoursquareCredentials {
                client_id: config.foursquare_client_id.clone(),
                client_secret: config.foursquare_client_secret.clone(),
            },
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .open_now(config.open_now)
        .with_retries(config.max_retries, config.retry_backoff_base_ms);
        Ok(Self {
            locator,
            foursquare,
        })
    }

    /// Reads a saved location file, or asks the geolocation provider.
    pub(crate) async fn location(
        &self,
        location_file: Option<&Path>,
    ) -> anyhow::Result<LocationRecord> {
        match location_file {
            Some(path) => dump::read_json(path),
            None => self.locator.lookup_location().await.map_err(user_facing),
        }
    }
}

/// Logs the detailed failure and turns it into the message a user sees.
pub(crate) fn user_facing(error: SuggestError) -> anyhow::Error {
    tracing::warn!(error = %error, "request failed");
    anyhow::anyhow!("{}", error.user_message())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = wander_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let providers = Providers::from_config(&config)?;
    let options = wander_suggest::QueryOptions::from_config(&config);

    match cli.command {
        Commands::Locate { out } => {
            let location = providers.location(None).await?;
            dump::write_json(&out, &location)?;
            println!(
                "{}, {} ({:.4}, {:.4}) -> {}",
                location.city,
                location.region,
                location.latitude,
                location.longitude,
                out.display()
            );
        }
        Commands::Search {
            query,
            location_file,
            out_dir,
        } => {
            search::run_search(
                &providers,
                &options,
                &query,
                location_file.as_deref(),
                &out_dir,
            )
            .await?;
        }
        Commands::Suggest {
            query,
            location_file,
        } => {
            suggest::run_suggest(&providers, &options, &query, location_file.as_deref()).await?;
        }
    }

    Ok(())
}
