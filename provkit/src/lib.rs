//! # provkit
//!
//! Host-side driver for the configuration menu of STM32 IoT boards.
//!
//! ## Features
//!
//! - Every menu operation: endpoint, Wi-Fi, APN, Defender period, certificate,
//!   thing name, passthrough, reset and factory reset
//! - Serial and TCP transports
//! - Async/await API using Tokio
//!
//! ## Quick Start
//!
//! ```no_run
//! use provkit::Device;
//!
//! #[tokio::main]
//! async fn main() -> provkit::Result<()> {
//!     let mut device = Device::new_serial("/dev/ttyACM0", 115_200);
//!     device.connect().await?;
//!
//!     if device.enable_menu().await? {
//!         let thing_name = device.get_thing_name().await?;
//!         println!("{}", thing_name);
//!     }
//!
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;

// Re-exports
pub use device::Device;
pub use error::{Error, Result};

pub use provkit_core::{constants, Command};
pub use provkit_transport::{available_ports, SerialTransport, TcpTransport, Transport};
pub use provkit_types::{Certificate, DeviceSettings, ThingName};
