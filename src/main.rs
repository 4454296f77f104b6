//! Service scaffold binary.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file ─┐
//!   CLI flags ───┴─▶ Settings ──▶ Supervisor ──▶ HttpServer | Service
//!                                     ▲
//!                     SIGINT/SIGTERM ─┘
//! ```
//!
//! `server` serves a health endpoint until interrupted; `service` runs a
//! heartbeat worker until interrupted. Both drain within the grace period.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use clap::{Parser, Subcommand, ValueEnum};

use service_scaffold::config::{load_options, validate_options, Options, Settings};
use service_scaffold::observability::{self, JsonSink, LogSink, TracingSink, WriterSink};
use service_scaffold::{BoxError, DrainSignal, HttpServer, Routes, Service, Supervisor};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "service-scaffold")]
#[command(about = "Run a supervised HTTP server or background service", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Graceful shutdown bound in seconds, overrides the config file
    #[arg(long)]
    grace_period_secs: Option<u64>,

    /// Output format of lifecycle and request events
    #[arg(long, value_enum, default_value_t = LogFormat::Tracing)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    /// Through the tracing subscriber
    Tracing,
    /// Plain `message=...; key=value` lines on stderr
    Text,
    /// JSON lines on stderr
    Json,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Serve HTTP until interrupted (default)
    Server,
    /// Run a background worker until interrupted
    Service,
}

impl Cli {
    fn overrides(&self) -> Options {
        Options {
            host: self.host.clone().unwrap_or_default(),
            port: self.port.unwrap_or_default(),
            grace_period_secs: self.grace_period_secs.unwrap_or_default(),
            ..Options::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut options = Vec::new();
    if let Some(path) = &cli.config {
        match load_options(path) {
            Ok(file) => options.push(file),
            Err(err) => {
                eprintln!("Error: {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        }
    }
    let overrides = cli.overrides();
    if let Err(errors) = validate_options(&overrides) {
        for err in errors {
            eprintln!("Error: {}", err);
        }
        return ExitCode::FAILURE;
    }
    options.push(overrides);
    let settings = Settings::resolve(&options);

    observability::subscriber::init(&settings.log_level);
    tracing::debug!(?settings, "Configuration resolved");

    let logger: Arc<dyn LogSink> = match cli.log_format {
        LogFormat::Tracing => Arc::new(TracingSink::new()),
        LogFormat::Text => Arc::new(WriterSink::stderr()),
        LogFormat::Json => Arc::new(JsonSink::new(std::io::stderr())),
    };

    let supervisor = match cli.command.unwrap_or(Commands::Server) {
        Commands::Server => {
            let routes = Routes::new().handle("/health", get(|| async { "ok" }));
            let server = HttpServer::new(settings.clone(), routes).with_logger(logger.clone());
            Supervisor::new(server)
        }
        Commands::Service => Service::new(heartbeat).supervisor(),
    };

    let result = supervisor
        .with_logger(logger.clone())
        .with_grace_period(settings.grace_period)
        .start()
        .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let noun = cli.command.map_or("Server", |c| match c {
                Commands::Server => "Server",
                Commands::Service => "Service",
            });
            logger.error(&err, &format!("{} error.", noun), &[]);
            ExitCode::FAILURE
        }
    }
}

/// Log a heartbeat until asked to drain.
async fn heartbeat(mut drain: DrainSignal) -> Result<(), BoxError> {
    let mut ticks = tokio::time::interval(HEARTBEAT_INTERVAL);
    ticks.tick().await;
    loop {
        tokio::select! {
            _ = ticks.tick() => tracing::info!("Heartbeat"),
            _ = drain.requested() => return Ok(()),
        }
    }
}
