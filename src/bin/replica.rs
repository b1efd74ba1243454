use anyhow::Result;
use clap::Parser;
use replog::common::{parse_duration, Config};
use replog::ReplicaServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "replog-replica")]
#[command(about = "replog replica: deduplicating, gap-free follower of the coordinator log")]
#[command(version)]
struct Args {
    /// Replica ID (unique identifier for this replica)
    #[arg(short, long)]
    id: Option<String>,

    /// HTTP address to listen on
    #[arg(short, long)]
    bind: Option<String>,

    /// Simulated propagation delays to pick from (e.g. "0ms" or "100ms,1s")
    #[arg(long, value_delimiter = ',')]
    delays: Vec<String>,

    /// Probability of failing a replicate call on purpose
    #[arg(long)]
    drop_chance: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    let level = args.log_level.unwrap_or_else(|| config.log_level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut replica_config = config.replica.unwrap_or_default();
    if let Some(bind) = args.bind {
        replica_config.bind_addr = bind.parse()?;
    }
    if !args.delays.is_empty() {
        replica_config.delay_ms = args
            .delays
            .iter()
            .map(|d| parse_duration(d).map(|d| d.as_millis() as u64))
            .collect::<replog::Result<Vec<u64>>>()?;
    }
    if let Some(drop_chance) = args.drop_chance {
        replica_config.drop_chance = drop_chance;
    }

    tracing::info!("{}", replog::BUILD_INFO);
    let server = ReplicaServer::new(replica_config, args.id.unwrap_or(config.node_id));
    server.serve().await?;

    Ok(())
}
