//! Read the thing name and certificate over a serial port

use provkit::Device;

#[tokio::main]
async fn main() -> provkit::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Change to your board's virtual COM port
    let port = std::env::var("DEVICE_PORT").unwrap_or_else(|_| "/dev/ttyACM0".to_string());

    println!("Opening {}...", port);

    let mut device = Device::new_serial(port, 115_200).with_debug(true);
    device.connect().await?;

    if !device.enable_menu().await? {
        println!("✗ Menu did not acknowledge the handshake");
        device.disconnect().await?;
        return Ok(());
    }

    let thing_name = device.get_thing_name().await?;
    println!("✓ Thing name: {}", thing_name);

    let cert = device.get_certificate().await?;
    println!("✓ Certificate:\n{}", cert);

    device.disconnect().await?;
    println!("✓ Disconnected");

    Ok(())
}
