//! Clearing retained messages left behind by a device
//!
//! A retained message is removed by publishing an empty retained payload to
//! its topic. The topic set mirrors what the firmware publishes with the
//! retain flag: its Home Assistant discovery configs plus the LED and button
//! state topics.

use std::time::Duration;

use anyhow::Result;
use rumqttc::QoS;
use tracing::{debug, info};

use crate::broker::Publisher;

/// Pause between publishes so the broker is not flooded
pub const PUBLISH_PACE: Duration = Duration::from_millis(100);

const MOTION_SENSORS: [&str; 3] = ["magnetometer_mGauss", "gyro_mDPS", "acceleration_mG"];
const ENV_SENSORS: [&str; 4] = ["baro_mbar", "rh_pct", "temp_1_c", "temp_0_c"];

/// Topics that may hold retained messages for a thing
pub fn retained_topics(thing_name: &str) -> Vec<String> {
    let mut topics = Vec::with_capacity(18);

    for sensor in MOTION_SENSORS {
        for axis in ["z", "y", "x"] {
            topics.push(format!("homeassistant/sensor/{thing_name}_{sensor}_{axis}/config"));
        }
    }
    for sensor in ENV_SENSORS {
        topics.push(format!("homeassistant/sensor/{thing_name}_{sensor}/config"));
    }

    topics.push(format!("homeassistant/binary_sensor/{thing_name}_button/config"));
    topics.push(format!("homeassistant/switch/{thing_name}_led/config"));
    topics.push(format!("{thing_name}/led/reported"));
    topics.push(format!("{thing_name}/led/desired"));
    topics.push(format!("{thing_name}/sensor/button/reported"));

    topics
}

/// Publish an empty retained payload to every topic, at least once
///
/// Returns the number of topics cleared.
pub async fn clear_retained<P>(
    publisher: &mut P,
    topics: &[String],
    pace: Duration,
) -> Result<usize>
where
    P: Publisher + ?Sized,
{
    for topic in topics {
        debug!("Clearing: {}", topic);
        publisher
            .publish(topic, Vec::new(), QoS::AtLeastOnce, true)
            .await?;
        tokio::time::sleep(pace).await;
    }

    info!("Cleared {} retained topics", topics.len());
    Ok(topics.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::MockPublisher;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_retained_topics() {
        let topics = retained_topics("stm32u5-002C003F");

        assert_eq!(topics.len(), 18);
        assert_eq!(
            topics.first().map(String::as_str),
            Some("homeassistant/sensor/stm32u5-002C003F_magnetometer_mGauss_z/config")
        );
        assert!(
            topics.contains(&"homeassistant/sensor/stm32u5-002C003F_temp_0_c/config".to_string())
        );
        assert!(topics.contains(&"homeassistant/switch/stm32u5-002C003F_led/config".to_string()));
        assert_eq!(
            topics.last().map(String::as_str),
            Some("stm32u5-002C003F/sensor/button/reported")
        );

        let unique: HashSet<&String> = topics.iter().collect();
        assert_eq!(unique.len(), topics.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_publishes_empty_retained_payloads() {
        let topics = retained_topics("dev-01");
        let mut publisher = MockPublisher::new();
        let mut seq = Sequence::new();

        for topic in topics.clone() {
            publisher
                .expect_publish()
                .withf(move |t, payload, qos, retain| {
                    t == topic && payload.is_empty() && *qos == QoS::AtLeastOnce && *retain
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _, _, _| Ok(()));
        }

        let start = tokio::time::Instant::now();
        let cleared = clear_retained(&mut publisher, &topics, PUBLISH_PACE).await.unwrap();

        assert_eq!(cleared, 18);
        assert!(start.elapsed() >= PUBLISH_PACE * 18);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_stops_on_publish_failure() {
        let topics = retained_topics("dev-01");
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_, _, _, _| Err(anyhow::anyhow!("client queue closed")));

        let result = clear_retained(&mut publisher, &topics, PUBLISH_PACE).await;
        assert!(result.is_err());
    }
}
