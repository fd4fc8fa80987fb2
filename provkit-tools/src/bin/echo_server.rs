//! TCP echo server

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use provkit_tools::echo::{serve, DEFAULT_PORT};
use provkit_tools::logging;

#[derive(Debug, Parser)]
#[command(name = "echo-server", version, about = "Echo every byte back to the sender")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let listener = TcpListener::bind((cli.host.as_str(), cli.port))
        .await
        .with_context(|| format!("binding {}:{}", cli.host, cli.port))?;

    serve(listener).await
}
