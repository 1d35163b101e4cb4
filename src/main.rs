use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use geowatch_hub::{Hub, HubConfig, Overrides};

#[derive(Parser, Debug)]
#[command(name = "geowatch-hub")]
#[command(about = "Records field-node risk telemetry and raises tiered alerts")]
struct Args {
    /// Path to a TOML config file. GEOWATCH__SECTION__KEY variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay recorded messages (JSON lines) from a file, or `-` for stdin,
    /// instead of subscribing to the broker
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Append line protocol to this file instead of writing to InfluxDB
    #[arg(long)]
    sink_file: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Validate the configuration, print it with secrets masked and exit
    #[arg(long)]
    check_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_format);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = HubConfig::load(args.config.as_deref())?;

    if args.check_config {
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    let overrides = Overrides {
        replay: args.replay,
        sink_file: args.sink_file,
    };

    let mut hub = Hub::bootstrap(&config, &overrides).await?;
    info!(
        source = %hub.source.description(),
        concurrency = hub.concurrency,
        "Starting hub controller, listening for messages"
    );

    let summary = tokio::select! {
        summary = hub.run() => Some(summary),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, shutting down");
            None
        }
    };

    hub.source.close().await;

    match summary {
        Some(summary) => info!(
            received = summary.received,
            recorded = summary.recorded,
            decode_failures = summary.decode_failures,
            store_failures = summary.store_failures,
            escalated = summary.escalated,
            "Message source ended"
        ),
        None => info!("Stopped"),
    }
    Ok(())
}
