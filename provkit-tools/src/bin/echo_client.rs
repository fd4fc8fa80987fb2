//! Send one message to an echo server and print the reply

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use provkit_tools::echo::{echo_once, DEFAULT_MESSAGE};
use provkit_tools::logging;

#[derive(Debug, Parser)]
#[command(name = "echo-client", version, about = "Check an echo server")]
struct Cli {
    host: String,

    port: u16,

    /// Text to send
    #[arg(long, default_value = DEFAULT_MESSAGE)]
    message: String,

    /// Seconds to wait for the connection and for the reply
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let reply = echo_once(
        &cli.host,
        cli.port,
        &cli.message,
        Duration::from_secs(cli.timeout_secs),
    )
    .await?;

    println!("Received: {}", String::from_utf8_lossy(&reply));
    Ok(())
}
