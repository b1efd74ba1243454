//! CLI for cluster operations

use clap::{Parser, Subcommand};
use replog::ops::ClusterClient;

#[derive(Parser)]
#[command(name = "replog")]
#[command(about = "replog replicated log CLI")]
#[command(version)]
struct Cli {
    /// Coordinator URL
    #[arg(long, default_value = "http://localhost:5000")]
    coordinator: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a message
    Write {
        /// Message payload
        message: String,

        /// Write concern (acknowledgments including the coordinator)
        #[arg(long, default_value = "1")]
        w: u32,
    },

    /// Read the coordinator log
    Read,

    /// Show replica health
    Health,

    /// Show quorum / write mode
    Quorum,

    /// Read a replica's gap-free view
    ReplicaRead {
        /// Replica URL
        #[arg(long)]
        replica: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = ClusterClient::new(&cli.coordinator);

    match cli.command {
        Commands::Write { message, w } => {
            let entry = client.write(&message, w).await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }

        Commands::Read => {
            let messages = client.read().await?;
            println!("{}", serde_json::to_string_pretty(&messages)?);
        }

        Commands::Health => {
            let health = client.health().await?;
            for (replica, status) in health {
                println!("{:<40} {}", replica, status);
            }
        }

        Commands::Quorum => {
            let quorum = client.quorum().await?;
            println!("Mode: {}", quorum.mode);
            println!("  Quorum met: {}", quorum.quorum_met);
            println!("  Healthy replicas: {}/{}", quorum.healthy, quorum.quorum_size);
        }

        Commands::ReplicaRead { replica } => {
            let messages = client.replica_read(&replica).await?;
            println!("{}", serde_json::to_string_pretty(&messages)?);
        }
    }

    Ok(())
}
