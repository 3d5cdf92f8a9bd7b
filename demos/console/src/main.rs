//! Console driver for a location sharing session.
//!
//! Run with: cargo run -p locshare-console -- start --phone 512345678 --lat 41.71 --lng 44.78
//!
//! Samples go to `LOCSHARE_ENDPOINT` (or `--endpoint`). Sharing state is kept
//! in a JSON file, so `locshare resume` picks up where the last run left off.

mod surfaces;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use locshare_core::{
    GeolocationProvider, LocationSink, MapSurface, Position, SharingConfig, SharingUi, StateStore,
};
use locshare_session::{Bootstrap, Collaborators, SharingSession, storage::JsonFileStore};
use locshare_transport::HttpSink;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::surfaces::{ConsoleUi, FixedGeolocation, LogMap};

#[derive(Debug, Parser)]
#[command(name = "locshare", about = "Share a device location with a collection endpoint")]
struct Cli {
    /// Collection endpoint (overrides LOCSHARE_ENDPOINT).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Seconds between sends (overrides LOCSHARE_INTERVAL_SECS).
    #[arg(long, global = true)]
    interval_secs: Option<u64>,

    /// State file (defaults to the platform data directory).
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start sharing under a phone number until interrupted.
    Start {
        #[arg(long)]
        phone: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Reported accuracy in meters.
        #[arg(long)]
        accuracy: Option<f64>,
    },
    /// Resume the last session from the state file until interrupted.
    Resume {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,
    },
    /// Clear the state file so the next run does not resume.
    Forget,
    /// Print which surfaces are wired and what would be resumed.
    Diagnose,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = SharingConfig::from_env().context("invalid LOCSHARE_* configuration")?;
    if let Some(endpoint) = cli.endpoint.clone() {
        config.endpoint = endpoint;
    }
    if let Some(secs) = cli.interval_secs {
        if secs == 0 {
            bail!("--interval-secs must be positive");
        }
        config.send_interval = Duration::from_secs(secs);
    }

    let state_file = match cli.state_file.clone() {
        Some(path) => path,
        None => JsonFileStore::default_path().context("no data directory for the state file")?,
    };
    tracing::debug!(path = %state_file.display(), "Using state file");

    let (phone, position) = match &cli.command {
        Command::Start {
            phone,
            lat,
            lng,
            accuracy,
        } => (
            Some(phone.as_str()),
            Some(Position {
                accuracy: *accuracy,
                ..Position::at(*lat, *lng)
            }),
        ),
        Command::Resume {
            lat: Some(lat),
            lng: Some(lng),
        } => (None, Some(Position::at(*lat, *lng))),
        Command::Resume { lat: None, lng: None } => (None, None),
        Command::Resume { .. } => bail!("--lat and --lng must be given together"),
        Command::Forget | Command::Diagnose => (None, None),
    };

    let sink = HttpSink::from_config(&config)?;
    let session = SharingSession::new(
        config,
        Collaborators {
            geolocation: Arc::new(FixedGeolocation::new(position)) as Arc<dyn GeolocationProvider>,
            map: Arc::new(LogMap::default()) as Arc<dyn MapSurface>,
            sink: Arc::new(sink) as Arc<dyn LocationSink>,
            ui: Arc::new(ConsoleUi::new(phone)) as Arc<dyn SharingUi>,
            store: Arc::new(JsonFileStore::new(state_file)) as Arc<dyn StateStore>,
        },
    );

    match cli.command {
        Command::Start { .. } => {
            let events = spawn_event_printer(&session);
            session.request_sharing().await?;
            session.start_sharing().await?;
            run_until_interrupted(&session).await?;
            events.abort();
        }
        Command::Resume { .. } => {
            let events = spawn_event_printer(&session);
            match session.bootstrap().await {
                Bootstrap::Inactive => {
                    events.abort();
                    bail!("nothing to resume, run `locshare start` first");
                }
                Bootstrap::Resumed { phone_number, .. } => {
                    tracing::info!(phone = %phone_number, "Resumed");
                }
            }
            run_until_interrupted(&session).await?;
            events.abort();
        }
        Command::Forget => session.forget().await?,
        Command::Diagnose => {
            let report = session.diagnose().await;
            report.log();
            println!("{report}");
        }
    }

    Ok(())
}

fn spawn_event_printer(session: &SharingSession) -> tokio::task::JoinHandle<()> {
    let mut events = session.events().history_plus_stream();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match serde_json::to_string(&event) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!("Failed to serialize event: {e}"),
            }
        }
    })
}

async fn run_until_interrupted(session: &SharingSession) -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    session.stop_sharing().await;
    Ok(())
}
