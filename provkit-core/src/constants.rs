//! Protocol constants

use std::time::Duration;

/// Handshake written to open the configuration menu
pub const MENU_HANDSHAKE: &str = "STM32";

/// Prefix of the device's reply to a successful handshake
pub const MENU_ACK: &str = "ACK";

/// Label preceding the thing name in the device's reply
pub const THING_NAME_LABEL: &str = "ThingName";

/// Logged by the firmware once it is up and serving the console
pub const READY_MESSAGE: &str = "[INFO] STM32 OK";

/// Logged by the firmware once its MQTT connection is established
pub const CONNECTED_MESSAGE: &str = "[INFO] Connected to AWS";

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default time a single line read waits before reporting an empty read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause after commands that make the firmware do work before replying
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Default timeout for waiting on a log message
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(20);
