//! MQTT broker connection shared by the broker tools

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rumqttc::{
    AsyncClient, Event, MqttOptions, Outgoing, Packet, Publish, QoS, TlsConfiguration, Transport,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Plain MQTT port
pub const DEFAULT_PORT: u16 = 1883;

/// MQTT over TLS port
pub const DEFAULT_TLS_PORT: u16 = 8883;

/// Keep-alive interval requested from the broker
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Capacity of the client request queue and the incoming message queue
const QUEUE_CAPACITY: usize = 64;

/// Broker connection flags shared by every broker tool
#[derive(Debug, Clone, clap::Args)]
pub struct BrokerArgs {
    /// Broker hostname, e.g. `xxxxxxxx-ats.iot.us-west-1.amazonaws.com`
    #[arg(long, env = "PROVKIT_MQTT_HOST")]
    pub host: String,

    /// Broker port [default: 8883 with TLS, 1883 without]
    #[arg(long, env = "PROVKIT_MQTT_PORT")]
    pub port: Option<u16>,

    /// CA certificate (PEM); enables TLS
    #[arg(long, env = "PROVKIT_MQTT_CA")]
    pub ca_file: Option<PathBuf>,

    /// Client certificate (PEM) for mutual TLS
    #[arg(long, env = "PROVKIT_MQTT_CERT", requires = "key_file")]
    pub cert_file: Option<PathBuf>,

    /// Client private key (PEM) for mutual TLS
    #[arg(long, env = "PROVKIT_MQTT_KEY", requires = "cert_file")]
    pub key_file: Option<PathBuf>,

    /// MQTT client identifier
    #[arg(long)]
    pub client_id: Option<String>,

    /// Keep-alive interval in seconds
    #[arg(long, default_value_t = KEEP_ALIVE.as_secs())]
    pub keep_alive_secs: u64,
}

impl BrokerArgs {
    /// Resolve flags into a connection config
    pub fn into_config(self, default_client_id: &str) -> BrokerConfig {
        let mut config = BrokerConfig::new(self.host, self.port)
            .with_client_id(self.client_id.unwrap_or_else(|| default_client_id.to_string()))
            .with_keep_alive(Duration::from_secs(self.keep_alive_secs));

        if let Some(ca_file) = self.ca_file {
            let client_auth = self.cert_file.zip(self.key_file);
            config = config.with_tls(ca_file, client_auth);
        }

        config
    }
}

/// TLS material locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub ca_file: PathBuf,
    pub client_auth: Option<(PathBuf, PathBuf)>,
}

/// Broker connection settings
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    host: String,
    port: Option<u16>,
    client_id: String,
    tls: Option<TlsFiles>,
    keep_alive: Duration,
}

impl BrokerConfig {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: "provkit".to_string(),
            tls: None,
            keep_alive: KEEP_ALIVE,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Connect over TLS, optionally presenting a client certificate and key
    pub fn with_tls(mut self, ca_file: PathBuf, client_auth: Option<(PathBuf, PathBuf)>) -> Self {
        self.tls = Some(TlsFiles {
            ca_file,
            client_auth,
        });
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, or the conventional one for the chosen transport
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(if self.tls.is_some() {
            DEFAULT_TLS_PORT
        } else {
            DEFAULT_PORT
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    pub fn tls(&self) -> Option<&TlsFiles> {
        self.tls.as_ref()
    }

    /// Build client options, loading TLS material from disk
    pub fn mqtt_options(&self) -> Result<MqttOptions> {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port());
        options.set_keep_alive(self.keep_alive);

        if let Some(tls) = &self.tls {
            let ca = std::fs::read(&tls.ca_file)
                .with_context(|| format!("reading CA file {}", tls.ca_file.display()))?;

            let client_auth = match &tls.client_auth {
                Some((cert_file, key_file)) => {
                    let cert = std::fs::read(cert_file)
                        .with_context(|| format!("reading certificate {}", cert_file.display()))?;
                    let key = std::fs::read(key_file)
                        .with_context(|| format!("reading private key {}", key_file.display()))?;
                    Some((cert, key))
                }
                None => None,
            };

            options.set_transport(Transport::tls_with_config(TlsConfiguration::Simple {
                ca,
                alpn: None,
                client_auth,
            }));
        }

        Ok(options)
    }
}

/// Anything that can publish to the broker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send {
    async fn publish(&mut self, topic: &str, payload: Vec<u8>, qos: QoS, retain: bool)
        -> Result<()>;
}

/// Connected MQTT client with its event loop running in the background
pub struct MqttClient {
    client: AsyncClient,
    incoming: mpsc::Receiver<Publish>,
    driver: JoinHandle<()>,
}

impl MqttClient {
    /// Connect and wait for the broker's ConnAck
    pub async fn connect(config: &BrokerConfig) -> Result<Self> {
        info!(
            "Connecting to {}:{} as {}...",
            config.host(),
            config.port(),
            config.client_id()
        );

        let (client, mut eventloop) = AsyncClient::new(config.mqtt_options()?, QUEUE_CAPACITY);

        loop {
            let event = eventloop
                .poll()
                .await
                .with_context(|| format!("connecting to {}:{}", config.host(), config.port()))?;

            match event {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    info!("Connected to {} ({:?})", config.host(), ack.code);
                    break;
                }
                event => trace!("Broker event: {:?}", event),
            }
        }

        let (tx, incoming) = mpsc::channel(QUEUE_CAPACITY);
        let driver = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        if let Err(e) = tx.try_send(publish) {
                            warn!("Dropping incoming message: {}", e);
                        }
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        debug!("Disconnect sent");
                        break;
                    }
                    Ok(event) => trace!("Broker event: {:?}", event),
                    Err(e) => {
                        warn!("Broker connection ended: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            client,
            incoming,
            driver,
        })
    }

    pub async fn subscribe(&self, topic: &str, qos: QoS) -> Result<()> {
        self.client
            .subscribe(topic, qos)
            .await
            .with_context(|| format!("subscribing to {}", topic))?;
        info!("Subscribed to topic: {}", topic);
        Ok(())
    }

    /// Next message on a subscribed topic, or `None` once the connection is gone
    pub async fn next_message(&mut self) -> Option<Publish> {
        self.incoming.recv().await
    }

    /// Send DISCONNECT and wait for the event loop to flush it
    pub async fn disconnect(self) -> Result<()> {
        self.client.disconnect().await.context("sending disconnect")?;

        if tokio::time::timeout(Duration::from_secs(5), self.driver)
            .await
            .is_err()
        {
            warn!("Event loop did not stop after disconnect");
        }

        info!("Disconnected");
        Ok(())
    }
}

#[async_trait]
impl Publisher for MqttClient {
    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> Result<()> {
        trace!(
            "Publishing {} bytes to {} ({:?}, retain={})",
            payload.len(),
            topic,
            qos,
            retain
        );
        self.client
            .publish(topic, qos, retain, payload)
            .await
            .with_context(|| format!("publishing to {}", topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        broker: BrokerArgs,
    }

    #[test]
    fn test_port_follows_transport() {
        let plain = BrokerConfig::new("broker.local", None);
        assert_eq!(plain.port(), DEFAULT_PORT);

        let tls = BrokerConfig::new("broker.local", None).with_tls("ca.pem".into(), None);
        assert_eq!(tls.port(), DEFAULT_TLS_PORT);

        let explicit =
            BrokerConfig::new("broker.local", Some(9000)).with_tls("ca.pem".into(), None);
        assert_eq!(explicit.port(), 9000);
    }

    #[test]
    fn test_args_into_config() {
        let cli = Cli::try_parse_from([
            "tool",
            "--host",
            "example-ats.iot.us-west-1.amazonaws.com",
            "--ca-file",
            "certs/AmazonRootCA1.pem",
            "--cert-file",
            "certs/device.pem.crt",
            "--key-file",
            "certs/device.pem.key",
        ])
        .unwrap();

        let config = cli.broker.into_config("HA-Cleanup");

        assert_eq!(config.host(), "example-ats.iot.us-west-1.amazonaws.com");
        assert_eq!(config.port(), DEFAULT_TLS_PORT);
        assert_eq!(config.client_id(), "HA-Cleanup");
        assert_eq!(config.keep_alive(), KEEP_ALIVE);
        assert_eq!(
            config.tls(),
            Some(&TlsFiles {
                ca_file: "certs/AmazonRootCA1.pem".into(),
                client_auth: Some(("certs/device.pem.crt".into(), "certs/device.pem.key".into())),
            })
        );
    }

    #[test]
    fn test_keep_alive_flag() {
        let cli =
            Cli::try_parse_from(["tool", "--host", "broker.local", "--keep-alive-secs", "15"])
                .unwrap();

        let config = cli.broker.into_config("fp-mock");
        assert_eq!(config.keep_alive(), Duration::from_secs(15));
        assert_eq!(config.mqtt_options().unwrap().keep_alive(), Duration::from_secs(15));
    }

    #[test]
    fn test_cert_requires_key() {
        let result = Cli::try_parse_from([
            "tool",
            "--host",
            "broker.local",
            "--cert-file",
            "device.pem.crt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_ca_file_is_reported() {
        let config = BrokerConfig::new("broker.local", None)
            .with_tls("/nonexistent/provkit/ca.pem".into(), None);

        let err = config.mqtt_options().unwrap_err();
        assert!(err.to_string().contains("reading CA file"));
    }

    #[test]
    fn test_plain_options() {
        let config = BrokerConfig::new("broker.local", None).with_client_id("fp-mock");
        let options = config.mqtt_options().unwrap();
        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1883));
        assert_eq!(options.client_id(), "fp-mock");
    }
}
