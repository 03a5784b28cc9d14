//! Transfer Sentinel CLI
//!
//! Entry point for the watcher binary. Provides subcommands for:
//! - `run` - start watching the configured endpoints and watch-list
//! - `check-config` - validate configuration and exit without connecting
//! - `version` - print version information

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transfer_sentinel::config::{CliOverrides, Config};
use transfer_sentinel::error::SentinelError;
use transfer_sentinel::orchestrator::Orchestrator;
use transfer_sentinel::ports::Sink;
use transfer_sentinel::sink::{LogFormat, TerminalSink};

/// Real-time watch-list transfer monitor for EVM-compatible chains.
#[derive(Parser, Debug)]
#[command(name = "transfer-sentinel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Deployment environment, selects `config/{env}.toml`
    #[arg(short, long, env = "SENTINEL_ENV", default_value = "development")]
    environment: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start watching the configured endpoints and watch-list
    Run {
        /// Extra config file layered on top of `config/{env}.toml`
        #[arg(long)]
        config: Option<PathBuf>,

        /// RPC endpoint, repeatable; prepended to the configured list
        #[arg(long = "endpoint")]
        endpoints: Vec<String>,

        /// Override the configured transfer threshold, in whole ETH
        #[arg(long)]
        threshold_eth: Option<String>,

        /// Load the watch-list from this file instead of config/env
        #[arg(long)]
        watch_list: Option<PathBuf>,

        /// Override the configured log format (`pretty` or `json`)
        #[arg(long)]
        log_format: Option<String>,

        /// Override the configured log level (trace/debug/info/warn/error)
        #[arg(long)]
        log_level: Option<String>,

        /// Override the metrics listener address (`host:port`); implies enabled
        #[arg(long)]
        metrics_addr: Option<String>,
    },

    /// Load and validate configuration, then exit
    CheckConfig,

    /// Show version information
    Version,
}

fn init_tracing(format: LogFormat, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn install_shutdown_hooks(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => info!("received SIGINT"),
                _ = terminate.recv() => info!("received SIGTERM"),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received ctrl-c");
        }

        token.cancel();
    });
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let (overrides, metrics_addr) = match cli.command {
        Commands::Version => {
            println!("transfer-sentinel {}", transfer_sentinel::VERSION);
            return Ok(());
        }
        Commands::CheckConfig => {
            match Config::load(&cli.environment, &CliOverrides::default()) {
                Ok(config) => {
                    println!("configuration OK: {} endpoint(s), {} watched address(es)", config.endpoints.len(), config.watched.len());
                    return Ok(());
                }
                Err(e) => {
                    eprintln!("configuration error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Run {
            config,
            endpoints,
            threshold_eth,
            watch_list,
            log_format,
            log_level,
            metrics_addr,
        } => (
            CliOverrides {
                config_path: config,
                endpoints,
                threshold_eth,
                watch_list_file: watch_list,
                log_format,
                log_level,
            },
            metrics_addr,
        ),
    };

    let config = match Config::load(&cli.environment, &overrides) {
        Ok(config) => config,
        Err(e) => {
            let error = SentinelError::from(e);
            eprintln!("fatal: {error}");
            std::process::exit(1);
        }
    };

    let format = LogFormat::parse(&config.logging.format);
    init_tracing(format, &config.logging.level);

    info!(version = transfer_sentinel::VERSION, environment = %cli.environment, "starting transfer sentinel");

    let metrics_enabled = config.metrics.enabled || metrics_addr.is_some();
    let metrics_socket = metrics_addr.unwrap_or_else(|| config.metrics.socket_addr());
    if metrics_enabled {
        match metrics_socket.parse() {
            Ok(addr) => {
                if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
                    .with_http_listener(addr)
                    .install()
                {
                    error!(error = ?e, "failed to install prometheus exporter, continuing without metrics");
                }
            }
            Err(e) => error!(error = ?e, %metrics_socket, "invalid metrics socket address, continuing without metrics"),
        }
    }

    let sink: Arc<dyn Sink> = Arc::new(TerminalSink::new(format));
    let shutdown_token = CancellationToken::new();
    install_shutdown_hooks(&shutdown_token);

    if let Err(e) = Orchestrator::run(config, sink, shutdown_token).await {
        error!(error = ?e, "fatal internal error");
        std::process::exit(1);
    }

    Ok(())
}
