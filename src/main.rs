use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use ticket_gate::api::HttpBackend;
use ticket_gate::config::Config;
use ticket_gate::display::{ConsoleDisplay, StatusSink};
use ticket_gate::models::{EventId, NewEvent, NewTicket};
use ticket_gate::scanner::{Decoder, DecoderError, DecoderFactory, LineDecoder, ScanSettings};
use ticket_gate::utils::error::AppError;
use ticket_gate::views::{self, management, validation, View};

#[derive(Debug, Parser)]
#[command(name = "ticket-gate", version, about = "Event ticketing gate client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List events
    Events,
    /// Create an event
    CreateEvent {
        #[arg(long)]
        name: String,
        /// Event date, YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        location: String,
    },
    /// Issue a ticket and save its PDF
    CreateTicket {
        #[arg(long)]
        event_id: String,
        #[arg(long)]
        seat: String,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Validate tickets for an event, reading decoded QR payloads from stdin
    Validate { event_id: String },
    /// Open a validation or management link
    Open { link: String },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ticket_gate=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::debug!("Using backend at {}", config.api_base_url);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            AppError::from(e).log();
            return ExitCode::FAILURE;
        }
    };
    let outcome = runtime.block_on(run(cli.command, config));
    // A pending blocking stdin read must not hold the process open.
    runtime.shutdown_background();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.log();
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> Result<(), AppError> {
    let api = Arc::new(HttpBackend::from_config(&config)?);
    let display: Arc<dyn StatusSink> = Arc::new(ConsoleDisplay);

    match command {
        Command::Events => {
            management::list_events(api.as_ref(), display.as_ref(), &config.public_origin).await?;
        }
        Command::CreateEvent {
            name,
            date,
            location,
        } => {
            let event = NewEvent {
                name,
                event_date: date.format("%Y-%m-%d").to_string(),
                location,
            };
            management::create_event(api.as_ref(), display.as_ref(), &config.public_origin, &event)
                .await?;
        }
        Command::CreateTicket {
            event_id,
            seat,
            user_id,
        } => {
            let ticket = NewTicket {
                event_id: EventId::new(event_id),
                seat,
                user_id: user_id.filter(|u| !u.trim().is_empty()),
            };
            management::create_ticket(api.as_ref(), display.as_ref(), &config.ticket_output_dir, &ticket)
                .await?;
        }
        Command::Validate { event_id } => {
            validate(api, display, &config, EventId::new(event_id)).await?;
        }
        Command::Open { link } => match views::route(&link)? {
            View::Validation(event_id) => validate(api, display, &config, event_id).await?,
            View::Management => {
                management::list_events(api.as_ref(), display.as_ref(), &config.public_origin)
                    .await?;
            }
        },
    }
    Ok(())
}

/// Runs the scan loop on stdin until Ctrl-C or the end of input.
async fn validate(
    api: Arc<HttpBackend>,
    display: Arc<dyn StatusSink>,
    config: &Config,
    event_id: EventId,
) -> Result<(), AppError> {
    let factory: DecoderFactory = Box::new(|| Ok(Box::new(LineDecoder::stdin()) as Box<dyn Decoder>));
    let (mut handle, task) =
        validation::open(api, display, event_id, factory, ScanSettings::from(config)).await?;

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.map_err(AppError::from),
        halt = handle.halted() => match halt? {
            DecoderError::Closed => {
                tracing::info!("Decoder input closed, leaving validation");
                Ok(())
            }
            fatal => Err(AppError::from(fatal)),
        },
    };

    handle.stop().await?;
    drop(handle);
    if let Err(e) = task.await {
        tracing::error!("Scan loop task failed: {}", e);
    }
    outcome
}
