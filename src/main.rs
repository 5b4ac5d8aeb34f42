use clap::{Parser, Subcommand};
use foodbank_locator::config::{LoggingSettings, Settings};
use foodbank_locator::core::{LocationStore, LocatorError, MatchService, SharedStore};
use foodbank_locator::models::{DonationRequest, MatchRequest, NearbyResponse, SubmitResponse};
use foodbank_locator::services::{DocumentStoreClient, DocumentStoreError, DonationRecord};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit status for a request the match service rejected
const REJECTED: u8 = 2;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Configuration file (defaults to config/default.toml + config/local.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the facility table and report what was skipped
    Check,
    /// List food banks near a coordinate
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Search radius in km (defaults to matching.default_radius_km)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Record a food donation and list food banks near the donor
    Submit {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        food_type: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        date_leftover: String,
        #[arg(long)]
        quantity: Option<u32>,
        /// Also send the request to this food bank's document
        #[arg(long)]
        send_to: Option<String>,
    },
}

#[derive(Debug, Error)]
enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    DocumentStore(#[from] DocumentStoreError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Logs go to stderr so stdout stays clean JSON
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "json" => subscriber.json().init(),
        "pretty" => subscriber.pretty().init(),
        _ => subscriber.compact().init(),
    }
}

fn load_service(settings: &Settings) -> Result<MatchService, LocatorError> {
    let store = LocationStore::from_path(&settings.store.path)?;

    Ok(MatchService::new(
        Arc::new(SharedStore::new(store)),
        settings.matching.policy(),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, settings: Settings) -> Result<ExitCode, AppError> {
    // The store must be complete before any request is answered
    let service = load_service(&settings)?;

    match cli.command {
        Command::Check => {
            let snapshot = service.store().snapshot();
            print_json(&json!({
                "source": settings.store.path,
                "loaded": snapshot.len(),
                "skipped": snapshot.skip_count(),
                "skippedRows": snapshot.skipped(),
            }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Nearby { lat, lon, radius } => {
            let mut request = MatchRequest::new(lat, lon);
            request.radius_km = radius;

            let response = NearbyResponse::from(service.find_nearby(&request));
            print_json(&response)?;

            Ok(if response.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(REJECTED)
            })
        }
        Command::Submit {
            lat,
            lon,
            description,
            food_type,
            reason,
            date_leftover,
            quantity,
            send_to,
        } => {
            let request = DonationRequest {
                food_description: description,
                food_type,
                reason,
                date_leftover,
                latitude: lat,
                longitude: lon,
                quantity,
            };

            let record = DonationRecord::from_request(request, settings.donations.points_per_unit)
                .map_err(DocumentStoreError::from)?;

            let client = DocumentStoreClient::new(
                settings.donations.target(),
                settings.donations.timeout(),
            )?;
            let document_id = client.submit(&record).await?;
            if let Some(facility_id) = send_to.as_deref() {
                client.attach_to_facility(facility_id, &record).await?;
            }

            let submitted = SubmitResponse {
                success: true,
                request_id: record.id.to_string(),
                document_id,
                points: record.points,
            };
            let nearby = NearbyResponse::from(service.find_nearby(&MatchRequest::new(lat, lon)));

            print_json(&json!({
                "submission": submitted,
                "sentTo": send_to,
                "nearby": nearby,
            }))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings.logging);

    info!("Starting food bank locator...");

    match run(cli, settings).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
