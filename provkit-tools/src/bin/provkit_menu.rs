//! Drive a board's configuration menu from the command line

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use provkit::constants::{DEFAULT_BAUD_RATE, DEFAULT_WAIT_TIMEOUT, READY_MESSAGE};
use provkit::{available_ports, Device, DeviceSettings};
use provkit_tools::logging;

#[derive(Debug, Parser)]
#[command(name = "provkit-menu", version, about = "STM32 configuration menu client")]
struct Cli {
    /// Serial port the board's console is on
    #[arg(long, env = "PROVKIT_PORT", conflicts_with = "tcp")]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Serial-to-TCP bridge address (`host:port`) instead of a local port
    #[arg(long)]
    tcp: Option<String>,

    /// Milliseconds a line read waits before the device counts as quiet
    #[arg(long, default_value_t = 1000)]
    read_timeout_ms: u64,

    /// Echo console traffic
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: MenuCommand,
}

#[derive(Debug, Subcommand)]
enum MenuCommand {
    /// List serial ports
    Ports,
    /// Print the thing name
    ThingName,
    /// Print the device certificate
    Cert {
        /// Write the PEM to a file instead
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the configuration dump
    Config,
    SetEndpoint { endpoint: String },
    SetSsid { ssid: String },
    SetPassword { password: String },
    SetApn { apn: String },
    /// Set the Device Defender period in seconds
    SetDefender { seconds: u32 },
    /// Apply several settings in one session
    Provision {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        ssid: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        apn: Option<String>,
        #[arg(long)]
        defender: Option<u32>,
    },
    /// Restore default settings
    Defaults,
    /// Hand the console to the wireless module
    Passthrough,
    ConfigMode,
    Reset,
    FactoryReset,
    /// Wait for a console line containing TEXT (default: the boot banner)
    Wait {
        #[arg(default_value = READY_MESSAGE)]
        text: String,
        #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT.as_secs())]
        timeout_secs: u64,
    },
}

impl MenuCommand {
    fn needs_menu(&self) -> bool {
        !matches!(self, MenuCommand::Ports | MenuCommand::Wait { .. })
    }
}

fn open_device(cli: &Cli) -> Result<Device> {
    let device = match (&cli.port, &cli.tcp) {
        (_, Some(addr)) => {
            let (host, port) = addr
                .rsplit_once(':')
                .with_context(|| format!("expected host:port, got {:?}", addr))?;
            let port: u16 = port
                .parse()
                .with_context(|| format!("invalid TCP port {:?}", port))?;
            Device::new_tcp(host, port)
        }
        (Some(path), None) => Device::new_serial(path.as_str(), cli.baud),
        (None, None) => bail!("either --port or --tcp is required"),
    };

    Ok(device
        .with_debug(cli.debug)
        .with_read_timeout(Duration::from_millis(cli.read_timeout_ms)))
}

fn list_ports() -> Result<()> {
    for port in available_ports()? {
        println!("{}", port);
    }
    Ok(())
}

async fn run(device: &mut Device, command: MenuCommand) -> Result<()> {
    match command {
        MenuCommand::Ports => list_ports()?,
        MenuCommand::ThingName => println!("{}", device.get_thing_name().await?),
        MenuCommand::Cert { out } => {
            let cert = device.get_certificate().await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, cert.as_pem())
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("Certificate saved to {}", path.display());
                }
                None => print!("{}", cert),
            }
        }
        MenuCommand::Config => {
            for line in device.get_config().await? {
                println!("{}", line);
            }
        }
        MenuCommand::SetEndpoint { endpoint } => device.set_endpoint(&endpoint).await?,
        MenuCommand::SetSsid { ssid } => device.set_wifi_ssid(&ssid).await?,
        MenuCommand::SetPassword { password } => device.set_wifi_password(&password).await?,
        MenuCommand::SetApn { apn } => device.set_apn(&apn).await?,
        MenuCommand::SetDefender { seconds } => {
            device.set_defender_period(&seconds.to_string()).await?
        }
        MenuCommand::Provision {
            endpoint,
            ssid,
            password,
            apn,
            defender,
        } => {
            let settings = DeviceSettings {
                endpoint,
                wifi_ssid: ssid,
                wifi_password: password,
                apn,
                defender_period: defender,
            };
            if settings.is_empty() {
                bail!("nothing to provision");
            }
            device.provision(&settings).await?;
        }
        MenuCommand::Defaults => device.set_default().await?,
        MenuCommand::Passthrough => device.enable_passthrough().await?,
        MenuCommand::ConfigMode => device.enter_config_mode().await?,
        MenuCommand::Reset => device.reset().await?,
        MenuCommand::FactoryReset => device.factory_reset().await?,
        MenuCommand::Wait { text, timeout_secs } => {
            if !device
                .wait_for_message(&text, Duration::from_secs(timeout_secs))
                .await?
            {
                bail!("{:?} not seen within {}s", text, timeout_secs);
            }
            info!("Seen: {}", text);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    if matches!(cli.command, MenuCommand::Ports) {
        return list_ports();
    }

    let mut device = open_device(&cli)?;
    device.connect().await?;

    run_session(&mut device, cli.command).await
}

/// Run one command, then disconnect
///
/// The command's own outcome is returned even when the disconnect fails.
async fn run_session(device: &mut Device, command: MenuCommand) -> Result<()> {
    let result: Result<()> = async {
        if command.needs_menu() && !device.enable_menu().await? {
            bail!("device did not acknowledge the menu handshake");
        }
        run(device, command).await
    }
    .await;

    if let Err(e) = device.disconnect().await {
        warn!("Disconnect failed: {}", e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use provkit_transport::ScriptedTransport;

    async fn connected(transport: ScriptedTransport) -> Device {
        let mut device =
            Device::with_transport(transport).with_read_timeout(Duration::from_millis(100));
        device.connect().await.unwrap();
        device
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_error_survives_failed_disconnect() {
        let transport = ScriptedTransport::new().lines(["NAK"]).fail_disconnect();
        let mut device = connected(transport).await;

        let err = run_session(&mut device, MenuCommand::ThingName)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not acknowledge"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_survives_failed_disconnect() {
        let transport = ScriptedTransport::new()
            .lines(["ACK"])
            .silence()
            .lines(["Defaults restored"])
            .fail_disconnect();
        let log = transport.write_log();
        let mut device = connected(transport).await;

        run_session(&mut device, MenuCommand::Defaults).await.unwrap();
        assert_eq!(log.writes(), vec![b"STM32".to_vec(), b"0".to_vec()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_defaults_to_boot_banner() {
        let cli = Cli::try_parse_from(["provkit-menu", "--port", "/dev/null", "wait"]).unwrap();
        let MenuCommand::Wait { text, timeout_secs } = cli.command else {
            panic!("expected wait");
        };
        assert_eq!(text, READY_MESSAGE);
        assert_eq!(timeout_secs, DEFAULT_WAIT_TIMEOUT.as_secs());

        let transport = ScriptedTransport::new().lines(["[INFO] STM32 OK"]);
        let log = transport.write_log();
        let mut device = connected(transport).await;
        run_session(&mut device, MenuCommand::Wait { text, timeout_secs })
            .await
            .unwrap();
        // No handshake for a plain wait
        assert!(log.is_empty());
    }
}
