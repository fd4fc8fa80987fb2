//! Clear retained MQTT messages for a thing

use anyhow::Result;
use clap::Parser;
use tracing::info;

use provkit_tools::retained::{clear_retained, retained_topics, PUBLISH_PACE};
use provkit_tools::{logging, BrokerArgs, MqttClient};

#[derive(Debug, Parser)]
#[command(
    name = "clear-retained",
    version,
    about = "Clear retained MQTT messages for a specific thing"
)]
struct Cli {
    #[command(flatten)]
    broker: BrokerArgs,

    /// AWS IoT thing name
    #[arg(long)]
    thing_name: String,

    /// Log every topic cleared
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let topics = retained_topics(&cli.thing_name);
    let config = cli.broker.into_config("HA-Cleanup");

    let mut client = MqttClient::connect(&config).await?;
    clear_retained(&mut client, &topics, PUBLISH_PACE).await?;
    client.disconnect().await?;

    info!("All retained messages cleared");
    Ok(())
}
