//! High-level device interface

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

use provkit_core::constants::{DEFAULT_READ_TIMEOUT, MENU_HANDSHAKE, SETTLE_DELAY};
use provkit_core::line::trim_terminator;
use provkit_core::{data_line, decode_lenient, parse, Command, LineBuffer};
use provkit_transport::{SerialTransport, TcpTransport, Transport};
use provkit_types::{Certificate, DeviceSettings, ThingName};

use crate::error::{Error, Result};

/// Command session with an STM32 device's configuration menu
///
/// Every exchange is half-duplex: a command code or data line is written,
/// then the device's reply lines are read until it goes quiet. A read that
/// receives nothing within the read timeout yields an empty line, and that
/// empty read is what ends a drain.
///
/// # Examples
///
/// ```no_run
/// use provkit::Device;
///
/// #[tokio::main]
/// async fn main() -> provkit::Result<()> {
///     let mut device = Device::new_serial("/dev/ttyACM0", 115_200).with_debug(true);
///
///     device.connect().await?;
///
///     if device.enable_menu().await? {
///         device.set_wifi_ssid("lab").await?;
///         device.set_wifi_password("secret").await?;
///         let cert = device.get_certificate().await?;
///         println!("{}", cert);
///     }
///
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    lines: LineBuffer,
    debug: bool,
    read_timeout: Duration,
    settle_delay: Duration,
    response_deadline: Option<Duration>,
}

impl Device {
    /// Create a device on a serial port
    pub fn new_serial(path: impl Into<String>, baud_rate: u32) -> Self {
        Self::with_transport(SerialTransport::new(path, baud_rate))
    }

    /// Create a device reached through a TCP serial bridge
    pub fn new_tcp(host: impl Into<String>, port: u16) -> Self {
        Self::with_transport(TcpTransport::new(host, port))
    }

    /// Create a device on any transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            lines: LineBuffer::new(),
            debug: false,
            read_timeout: DEFAULT_READ_TIMEOUT,
            settle_delay: SETTLE_DELAY,
            response_deadline: None,
        }
    }

    /// Echo every line sent and received at `info` level
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set how long a line read waits before reporting an empty read
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the pause after commands that make the firmware do work
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Bound the wait for a certificate to start
    ///
    /// Without a deadline, [`Device::get_certificate`] keeps reading until the
    /// begin marker shows up.
    pub fn with_response_deadline(mut self, deadline: Duration) -> Self {
        self.response_deadline = Some(deadline);
        self
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Open the transport
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.remote_addr());

        self.transport.connect().await?;
        self.lines.clear();

        info!("Connected to {}", self.transport.remote_addr());
        Ok(())
    }

    /// Close the transport
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.remote_addr());

        self.transport.disconnect().await?;
        self.lines.clear();

        info!("Disconnected");
        Ok(())
    }

    /// Open the configuration menu
    ///
    /// Returns `false` when the device's first reply does not start with `ACK`.
    pub async fn enable_menu(&mut self) -> Result<bool> {
        debug!("Enabling configuration menu...");

        self.write(MENU_HANDSHAKE).await?;

        let reply = self.read_line().await?;
        if !parse::is_menu_ack(&reply) {
            warn!("Menu handshake not acknowledged: {:?}", trim_terminator(&reply));
            return Ok(false);
        }

        self.read_all().await?;

        debug!("Configuration menu enabled");
        Ok(true)
    }

    /// Restore the default configuration
    pub async fn set_default(&mut self) -> Result<()> {
        self.run_and_drain(Command::SetDefault).await
    }

    /// Set the MQTT broker endpoint
    pub async fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        // The firmware may still be printing the menu banner
        self.read_all().await?;
        self.set_value(Command::SetEndpoint, endpoint).await
    }

    pub async fn set_wifi_ssid(&mut self, ssid: &str) -> Result<()> {
        self.set_value(Command::SetWifiSsid, ssid).await
    }

    pub async fn set_wifi_password(&mut self, password: &str) -> Result<()> {
        self.set_value(Command::SetWifiPassword, password).await
    }

    /// Set the cellular access point name
    pub async fn set_apn(&mut self, apn: &str) -> Result<()> {
        self.set_value(Command::SetApn, apn).await
    }

    /// Set the Device Defender metrics period (seconds, as text)
    pub async fn set_defender_period(&mut self, period: &str) -> Result<()> {
        self.set_value(Command::SetDefenderPeriod, period).await
    }

    /// Read the device certificate
    ///
    /// Lines before the begin marker are discarded. Output that stops before
    /// the end marker is reported as an invalid response.
    pub async fn get_certificate(&mut self) -> Result<Certificate> {
        debug!("Reading certificate...");

        self.send_command(Command::GetCertificate).await?;
        sleep(self.settle_delay).await;

        let start = Instant::now();
        let mut line = self.read_line().await?;
        while !Certificate::is_begin_line(&line) {
            self.check_deadline(start)?;
            line = self.read_line().await?;
        }

        let mut lines = vec![line];
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                warn!("Certificate output stopped after {} lines", lines.len());
                break;
            }

            let done = Certificate::is_end_line(&line);
            lines.push(line);
            if done {
                break;
            }
        }

        self.read_all().await?;

        let cert = Certificate::from_lines(&lines)
            .map_err(|e| Error::InvalidResponse(format!("certificate: {}", e)))?;

        debug!("Certificate received ({} body lines)", cert.body_lines().count());
        Ok(cert)
    }

    /// Read the name the device is registered under
    pub async fn get_thing_name(&mut self) -> Result<ThingName> {
        debug!("Reading thing name...");

        self.send_command(Command::GetThingName).await?;
        let reply = self.read_line().await?;
        self.read_all().await?;

        let token = parse::extract_thing_name(&reply).ok_or_else(|| {
            Error::InvalidResponse(format!(
                "no thing name in reply {:?}",
                trim_terminator(&reply)
            ))
        })?;

        let thing_name = ThingName::new(token)?;
        debug!("Thing name: {}", thing_name);
        Ok(thing_name)
    }

    /// Read the configuration dump, one entry per line
    pub async fn get_config(&mut self) -> Result<Vec<String>> {
        debug!("Reading configuration...");

        self.send_command(Command::GetConfig).await?;
        sleep(self.settle_delay).await;

        let mut config = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                break;
            }

            let line = trim_terminator(&line);
            if !line.trim().is_empty() {
                config.push(line.to_string());
            }
        }

        Ok(config)
    }

    /// Switch the console into configuration mode
    pub async fn enter_config_mode(&mut self) -> Result<()> {
        self.run_and_drain(Command::ConfigMode).await
    }

    /// Reboot the device
    ///
    /// The device does not answer; its boot log follows on the console.
    pub async fn reset(&mut self) -> Result<()> {
        warn!("Resetting device...");
        self.send_command(Command::Reset).await
    }

    /// Hand the console over to the wireless module
    pub async fn enable_passthrough(&mut self) -> Result<()> {
        self.run_and_drain(Command::Passthrough).await
    }

    /// Erase the stored configuration
    pub async fn factory_reset(&mut self) -> Result<()> {
        warn!("Factory resetting device...");
        self.run_and_drain(Command::FactoryReset).await
    }

    /// Apply every present setting, in field order
    pub async fn provision(&mut self, settings: &DeviceSettings) -> Result<()> {
        settings.validate()?;

        if let Some(endpoint) = &settings.endpoint {
            self.set_endpoint(endpoint).await?;
        }
        if let Some(ssid) = &settings.wifi_ssid {
            self.set_wifi_ssid(ssid).await?;
        }
        if let Some(password) = &settings.wifi_password {
            self.set_wifi_password(password).await?;
        }
        if let Some(apn) = &settings.apn {
            self.set_apn(apn).await?;
        }
        if let Some(period) = settings.defender_period {
            self.set_defender_period(&period.to_string()).await?;
        }

        info!("Provisioning settings applied");
        Ok(())
    }

    /// Read lines until one contains `target`
    ///
    /// Returns `false` once more than `timeout` has passed since the call.
    pub async fn wait_for_message(&mut self, target: &str, timeout: Duration) -> Result<bool> {
        debug!("Waiting up to {:?} for {:?}...", timeout, target);

        let start = Instant::now();
        loop {
            let line = self.read_line().await?;

            if start.elapsed() > timeout {
                debug!("Gave up waiting for {:?}", target);
                return Ok(false);
            }
            if parse::contains_message(&line, target) {
                return Ok(true);
            }
        }
    }

    /// Discard reply lines until the device goes quiet
    pub async fn read_all(&mut self) -> Result<()> {
        loop {
            if self.read_line().await?.is_empty() {
                return Ok(());
            }
        }
    }

    /// Read one line, terminator included
    ///
    /// Returns an empty string when nothing arrives within the read timeout.
    /// Partial output at the timeout is returned as-is. Invalid UTF-8 is dropped.
    pub async fn read_line(&mut self) -> Result<String> {
        self.ensure_connected()?;

        let deadline = Instant::now() + self.read_timeout;
        let raw = loop {
            if let Some(line) = self.lines.next_line() {
                break line;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break self.lines.take_remaining();
            }

            match self.transport.receive(remaining).await {
                Ok(chunk) => self.lines.extend(&chunk),
                Err(e) if e.is_timeout() => break self.lines.take_remaining(),
                Err(e) => return Err(e.into()),
            }
        };

        let line = decode_lenient(&raw);
        if !line.is_empty() {
            self.trace_line("->", trim_terminator(&line));
        }
        Ok(line)
    }

    /// Write text as-is, after discarding pending input
    pub async fn write(&mut self, text: &str) -> Result<()> {
        self.send_bytes(text.as_bytes(), text).await
    }

    // Helper methods

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    fn check_deadline(&self, start: Instant) -> Result<()> {
        if let Some(limit) = self.response_deadline {
            if start.elapsed() > limit {
                return Err(provkit_core::Error::Timeout {
                    millis: limit.as_millis() as u64,
                }
                .into());
            }
        }
        Ok(())
    }

    fn trace_line(&self, direction: &str, line: &str) {
        if self.debug {
            info!("device {} {}", direction, line);
        } else {
            trace!("device {} {}", direction, line);
        }
    }

    async fn send_bytes(&mut self, data: &[u8], shown: &str) -> Result<()> {
        self.ensure_connected()?;

        self.lines.clear();
        self.transport.discard_input().await?;

        self.trace_line("<-", trim_terminator(shown));
        self.transport.send(data).await?;

        Ok(())
    }

    async fn send_command(&mut self, command: Command) -> Result<()> {
        debug!("Sending {}", command);
        let code = [command.code()];
        self.send_bytes(&code, command.name()).await
    }

    async fn run_and_drain(&mut self, command: Command) -> Result<()> {
        debug_assert!(!command.takes_value(), "{} expects a value", command);
        self.send_command(command).await?;
        sleep(self.settle_delay).await;
        self.read_all().await
    }

    async fn set_value(&mut self, command: Command, value: &str) -> Result<()> {
        debug_assert!(command.takes_value(), "{} takes no value", command);
        let line = data_line(value)?;

        self.send_command(command).await?;
        self.read_all().await?;

        let shown = if command == Command::SetWifiPassword {
            "********"
        } else {
            value
        };
        self.send_bytes(&line, shown).await?;

        for _ in 0..command.value_drains() {
            self.read_all().await?;
        }

        Ok(())
    }
}
