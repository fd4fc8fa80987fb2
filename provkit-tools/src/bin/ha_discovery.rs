//! Publish Home Assistant discovery configs for a board

use anyhow::Result;
use clap::Parser;
use tracing::info;

use provkit_tools::discovery::publish_discovery;
use provkit_tools::{logging, BrokerArgs, MqttClient};

#[derive(Debug, Parser)]
#[command(
    name = "ha-discovery",
    version,
    about = "Register a board's entities with Home Assistant"
)]
struct Cli {
    #[command(flatten)]
    broker: BrokerArgs,

    /// Device identifier used in topics and unique IDs
    #[arg(long)]
    device_id: String,

    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let config = cli.broker.into_config("HA-Discovery");

    let mut client = MqttClient::connect(&config).await?;
    let published = publish_discovery(&mut client, &cli.device_id).await?;
    client.disconnect().await?;

    info!("Published {} discovery configs for {}", published, cli.device_id);
    Ok(())
}
