//! qkd-ingest - QKD link telemetry ingest
//!
//! Command-line front end for the record pipeline. Every command prints JSON
//! on stdout; logs go to stderr.
//!
//! - `extract`  pre-extract `key: value` fields from telemetry text
//! - `merge`    merge a high-trust and a low-trust record
//! - `skr`      compute the finite-key secure key rate of a record
//! - `process`  run the whole pipeline on telemetry text
//! - `serve`    expose the same operations over HTTP

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use qkd_common::config::{load_config, TomlConfig};
use qkd_ingest::enrichment::FileEnrichment;
use qkd_ingest::record::CanonicalRecord;
use qkd_ingest::skr::{SkrCalculator, SkrParameters};
use qkd_ingest::workflow::RecordPipeline;
use qkd_ingest::{extractors, fusion, AppState};

/// Command-line arguments for qkd-ingest
#[derive(Parser, Debug)]
#[command(name = "qkd-ingest")]
#[command(about = "QKD link telemetry ingest and finite-key secure key rate")]
#[command(version)]
struct Args {
    /// Config file (takes priority over QKD_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pre-extract known fields from telemetry text ("-" reads stdin)
    Extract { input: PathBuf },
    /// Merge two canonical records, high trust first
    Merge {
        high_trust: PathBuf,
        low_trust: PathBuf,
    },
    /// Compute the secure key rate of a canonical record ("-" reads stdin)
    Skr { record: PathBuf },
    /// Run extraction, enrichment, merge and SKR on telemetry text
    Process {
        input: PathBuf,
        /// Captured enrichment response to use instead of the configured endpoint
        #[arg(long)]
        enrichment: Option<PathBuf>,
    },
    /// Serve the HTTP API
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(short, long, env = "QKD_BIND")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Installed before the config is read so config resolution is logged
    let log_level = init_tracing();
    let config = load_config(args.config.as_deref())?;
    log_level.apply(&config)?;

    match args.command {
        Command::Extract { input } => {
            let text = read_input(&input)?;
            print_json(&extractors::extract(&text))?;
        }
        Command::Merge {
            high_trust,
            low_trust,
        } => {
            let high = read_record(&high_trust)?;
            let low = read_record(&low_trust)?;
            print_json(&fusion::merge(&high, &low))?;
        }
        Command::Skr { record } => {
            let record = read_record(&record)?;
            let calculator = SkrCalculator::new(SkrParameters::from(&config.skr));
            print_json(&calculator.compute(&record))?;
        }
        Command::Process { input, enrichment } => {
            let text = read_input(&input)?;
            let mut pipeline = RecordPipeline::from_config(&config)?;
            if let Some(path) = enrichment {
                pipeline = pipeline.with_enricher(Arc::new(FileEnrichment::new(path)));
            }
            print_json(&pipeline.process(&text).await?)?;
        }
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            serve(&config, &bind).await?;
        }
    }

    Ok(())
}

/// Filter used until the configured level is known
const STARTUP_LOG_LEVEL: &str = "info";

type LogFilterHandle = reload::Handle<EnvFilter, Registry>;

/// Log filter that `logging.level` can replace once the config is loaded
struct LogLevel {
    handle: LogFilterHandle,
    /// `RUST_LOG` set the filter; the configured level is ignored
    from_env: bool,
}

impl LogLevel {
    fn apply(&self, config: &TomlConfig) -> Result<()> {
        if !self.from_env {
            self.handle
                .reload(EnvFilter::new(&config.logging.level))
                .context("Failed to apply logging.level")?;
        }
        Ok(())
    }
}

/// Registry with a reloadable filter and an fmt layer writing to stderr
fn log_subscriber(filter: EnvFilter) -> (impl Subscriber + Send + Sync + 'static, LogFilterHandle) {
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));
    (subscriber, handle)
}

/// `RUST_LOG` wins; otherwise `STARTUP_LOG_LEVEL` until `LogLevel::apply`.
fn init_tracing() -> LogLevel {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(STARTUP_LOG_LEVEL), false),
    };
    let (subscriber, handle) = log_subscriber(filter);
    subscriber.init();
    LogLevel { handle, from_env }
}

async fn serve(config: &TomlConfig, bind: &str) -> Result<()> {
    info!(
        "Starting qkd-ingest v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind
    );

    let pipeline = RecordPipeline::from_config(config)?;
    let app = qkd_ingest::build_router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_record(path: &Path) -> Result<CanonicalRecord> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a canonical record", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
