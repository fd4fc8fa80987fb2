//! Home Assistant MQTT discovery configs for a device

use anyhow::{Context, Result};
use rumqttc::QoS;
use serde::Serialize;
use tracing::info;

use crate::broker::Publisher;

const DISCOVERY_PREFIX: &str = "homeassistant";

/// Environment sensors: (key, name, JSON field, unit, device class)
const ENV_SENSORS: [(&str, &str, &str, &str, &str); 4] = [
    ("temp0", "Temperature Sensor 0", "temp_0_c", "°C", "temperature"),
    ("temp1", "Temperature Sensor 1", "temp_1_c", "°C", "temperature"),
    ("humidity", "Humidity", "rh_pct", "%", "humidity"),
    ("pressure", "Barometric Pressure", "baro_mbar", "mbar", "pressure"),
];

/// Motion sensors: (JSON field, label, unit)
const MOTION_SENSORS: [(&str, &str, &str); 3] = [
    ("acceleration_mG", "Acceleration", "mG"),
    ("gyro_mDPS", "Gyroscope", "mDPS"),
    ("magnetometer_mGauss", "Magnetometer", "mG"),
];

/// Discovery payload for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityConfig {
    pub name: String,
    pub unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    pub state_topic: String,
    pub value_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_off: Option<String>,
    pub retain: bool,
}

impl EntityConfig {
    fn new(
        name: impl Into<String>,
        unique_id: String,
        state_topic: String,
        value_template: String,
    ) -> Self {
        Self {
            name: name.into(),
            unique_id,
            command_topic: None,
            state_topic,
            value_template,
            unit_of_measurement: None,
            device_class: None,
            payload_on: None,
            payload_off: None,
            state_on: None,
            state_off: None,
            retain: true,
        }
    }
}

/// A config to publish and where
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub config: EntityConfig,
}

impl DiscoveryMessage {
    fn new(component: &str, object_id: &str, config: EntityConfig) -> Self {
        Self {
            topic: format!("{DISCOVERY_PREFIX}/{component}/{object_id}/config"),
            config,
        }
    }

    /// JSON payload
    pub fn payload(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.config)
            .with_context(|| format!("encoding config for {}", self.topic))
    }
}

/// Every discovery config for a device, in publish order
pub fn discovery_messages(device_id: &str) -> Vec<DiscoveryMessage> {
    let mut messages = Vec::with_capacity(15);

    let mut led = EntityConfig::new(
        "STM32H573 LED",
        format!("{device_id}_led"),
        format!("{device_id}/led_status"),
        "{{ value_json.ledStatus.reported }}".to_string(),
    );
    led.command_topic = Some(format!("{device_id}/led_set"));
    led.payload_on = Some("ON".into());
    led.payload_off = Some("OFF".into());
    led.state_on = Some("ON".into());
    led.state_off = Some("OFF".into());
    messages.push(DiscoveryMessage::new("switch", &format!("{device_id}_led"), led));

    let env_topic = format!("{device_id}/env_sensor_data");
    for (key, name, field, unit, class) in ENV_SENSORS {
        let mut sensor = EntityConfig::new(
            name,
            format!("{device_id}_{key}"),
            env_topic.clone(),
            format!("{{{{ value_json.{field} }}}}"),
        );
        sensor.unit_of_measurement = Some(unit.into());
        sensor.device_class = Some(class.into());
        messages.push(DiscoveryMessage::new("sensor", &format!("{device_id}_{key}"), sensor));
    }

    let motion_topic = format!("{device_id}/motion_sensor_data");
    for (field, label, unit) in MOTION_SENSORS {
        for axis in ["x", "y", "z"] {
            let key = format!("{field}_{axis}");
            let mut sensor = EntityConfig::new(
                format!("{label} {}", axis.to_uppercase()),
                format!("{device_id}_{key}"),
                motion_topic.clone(),
                format!("{{{{ value_json.{field}.{axis} }}}}"),
            );
            sensor.unit_of_measurement = Some(unit.into());
            messages.push(DiscoveryMessage::new("sensor", &format!("{device_id}_{key}"), sensor));
        }
    }

    let mut button = EntityConfig::new(
        "Push Button",
        format!("{device_id}_button"),
        format!("{device_id}/button_status"),
        "{{ value_json.buttonStatus.reported }}".to_string(),
    );
    button.payload_on = Some("ON".into());
    button.payload_off = Some("OFF".into());
    button.device_class = Some("occupancy".into());
    messages.push(DiscoveryMessage::new("binary_sensor", &format!("{device_id}_button"), button));

    messages
}

/// Publish every discovery config retained at QoS 0
pub async fn publish_discovery<P>(publisher: &mut P, device_id: &str) -> Result<usize>
where
    P: Publisher + ?Sized,
{
    let messages = discovery_messages(device_id);
    for message in &messages {
        publisher
            .publish(&message.topic, message.payload()?, QoS::AtMostOnce, true)
            .await?;
        info!("Published to {}", message.topic);
    }
    Ok(messages.len())
}
