//! Answer fleet-provisioning requests from a board on a test broker

use anyhow::{Context, Result};
use clap::Parser;
use rumqttc::QoS;
use tracing::{info, warn};

use provkit_tools::provisioning::{
    describe_payload, CreateCertificateResponse, ProvisioningMock, DEFAULT_TEMPLATE,
};
use provkit_tools::{logging, BrokerArgs, MqttClient, Publisher};

#[derive(Debug, Parser)]
#[command(name = "fp-mock", version, about = "Mock AWS IoT fleet-provisioning responder")]
struct Cli {
    #[command(flatten)]
    broker: BrokerArgs,

    /// Provisioning template name in the register topic
    #[arg(long, default_value = DEFAULT_TEMPLATE)]
    template: String,

    /// Thing name returned to register requests; without it they go unanswered
    #[arg(long)]
    thing_name: Option<String>,

    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let mut mock = ProvisioningMock::new(CreateCertificateResponse::canned()?)
        .with_template(&cli.template);
    if let Some(thing_name) = &cli.thing_name {
        mock = mock.with_thing_name(thing_name.as_str());
    }

    let config = cli.broker.into_config("fp-mock");
    let mut client = MqttClient::connect(&config).await?;
    for topic in mock.subscriptions() {
        client.subscribe(topic, QoS::AtMostOnce).await?;
    }

    loop {
        let message = tokio::select! {
            message = client.next_message() => message,
            result = tokio::signal::ctrl_c() => {
                result.context("waiting for Ctrl-C")?;
                info!("Interrupted");
                break;
            }
        };

        let Some(message) = message else {
            warn!("Broker connection lost");
            break;
        };

        info!(
            "Received {} bytes on {}: {}",
            message.payload.len(),
            message.topic,
            describe_payload(&message.payload)
        );

        match mock.respond(&message.topic) {
            Ok(Some((topic, payload))) => {
                client.publish(&topic, payload, QoS::AtMostOnce, false).await?;
                info!("Published response to {}", topic);
            }
            Ok(None) => {}
            Err(e) => warn!("Could not build response for {}: {:#}", message.topic, e),
        }
    }

    client.disconnect().await
}
