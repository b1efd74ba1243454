//! Coordinator binary

use clap::{Parser, Subcommand};
use replog::common::{parse_duration, Config};
use replog::CoordinatorServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "replog-coord")]
#[command(about = "replog coordinator: sequencing, write concern and quorum fencing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start coordinator server
    Serve {
        /// Node ID
        #[arg(long)]
        id: Option<String>,

        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<String>,

        /// Replica base URLs (comma-separated)
        #[arg(long, value_delimiter = ',')]
        replicas: Vec<String>,

        /// Healthy replicas required to accept writes
        #[arg(long)]
        quorum: Option<usize>,

        /// Heartbeat period (e.g. "10s")
        #[arg(long)]
        heartbeat_interval: Option<String>,

        /// Heartbeat probe timeout (e.g. "3s")
        #[arg(long)]
        heartbeat_timeout: Option<String>,

        /// Delivery attempts per replica
        #[arg(long)]
        max_retries: Option<u32>,

        /// Backoff time unit (e.g. "1s")
        #[arg(long)]
        backoff_unit: Option<String>,

        /// Give up waiting for acknowledgments after this long
        #[arg(long)]
        write_timeout: Option<String>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long)]
        log_level: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            id,
            bind,
            replicas,
            quorum,
            heartbeat_interval,
            heartbeat_timeout,
            max_retries,
            backoff_unit,
            write_timeout,
            log_level,
        } => {
            // File and environment first, command-line flags on top
            let config = Config::load()?;

            let level = log_level.unwrap_or_else(|| config.log_level.clone());
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| level.into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let mut coord_config = config.coordinator.unwrap_or_default();
            if let Some(bind) = bind {
                coord_config.bind_addr = bind.parse()?;
            }
            if !replicas.is_empty() {
                coord_config.replicas = replicas;
            }
            if let Some(quorum) = quorum {
                coord_config.quorum_size = quorum;
            }
            if let Some(interval) = heartbeat_interval {
                coord_config.heartbeat_interval_ms = parse_duration(&interval)?.as_millis() as u64;
            }
            if let Some(timeout) = heartbeat_timeout {
                coord_config.heartbeat_timeout_ms = parse_duration(&timeout)?.as_millis() as u64;
            }
            if let Some(max_retries) = max_retries {
                coord_config.max_retries = max_retries;
            }
            if let Some(unit) = backoff_unit {
                coord_config.backoff_unit_ms = parse_duration(&unit)?.as_millis() as u64;
            }
            if let Some(timeout) = write_timeout {
                coord_config.write_timeout_ms = Some(parse_duration(&timeout)?.as_millis() as u64);
            }
            coord_config.validate()?;

            tracing::info!("{}", replog::BUILD_INFO);
            let coord = CoordinatorServer::new(coord_config, id.unwrap_or(config.node_id));
            coord.serve().await?;
        }
    }

    Ok(())
}
