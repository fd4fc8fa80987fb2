//! Provisioning example: write Wi-Fi and endpoint, then reboot and wait for the cloud link

use std::time::Duration;

use provkit::constants::CONNECTED_MESSAGE;
use provkit::{Device, DeviceSettings};

#[tokio::main]
async fn main() -> provkit::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let port = std::env::var("DEVICE_PORT").unwrap_or_else(|_| "/dev/ttyACM0".to_string());
    let endpoint = std::env::var("MQTT_ENDPOINT")
        .unwrap_or_else(|_| "a1qwhobjtvew8t-ats.iot.us-west-1.amazonaws.com".to_string());

    let mut device = Device::new_serial(port, 115_200);
    device.connect().await?;

    if !device.enable_menu().await? {
        println!("Menu not available");
        return Ok(());
    }

    let settings = DeviceSettings::new()
        .with_endpoint(endpoint)
        .with_wifi("lab", "secret");

    println!("Writing settings...");
    device.provision(&settings).await?;

    println!("Rebooting...");
    device.reset().await?;

    if device
        .wait_for_message(CONNECTED_MESSAGE, Duration::from_secs(60))
        .await?
    {
        println!("Device connected to the broker");
    } else {
        println!("Device did not connect within 60s");
    }

    device.disconnect().await?;

    Ok(())
}
