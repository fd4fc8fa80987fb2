//! TCP echo server and client for checking a board's network path

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Standard echo port
pub const DEFAULT_PORT: u16 = 7;

/// Message the client sends unless told otherwise
pub const DEFAULT_MESSAGE: &str = "Hello, Echo Server!";

/// Largest chunk read at once
pub const READ_CHUNK: usize = 1024;

/// Accept connections forever, echoing each one on its own task
pub async fn serve(listener: TcpListener) -> Result<()> {
    info!("Server is listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await.context("accepting connection")?;
        info!("Connected by {}, Port: {}", peer.ip(), peer.port());

        tokio::spawn(async move {
            if let Err(e) = echo_connection(stream, peer).await {
                warn!("Connection {} failed: {:#}", peer, e);
            }
        });
    }
}

async fn echo_connection(mut stream: TcpStream, peer: SocketAddr) -> Result<()> {
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            debug!("{} closed the connection", peer);
            return Ok(());
        }

        stream.write_all(&buf[..n]).await?;
        info!("{}: {}", peer, String::from_utf8_lossy(&buf[..n]));
    }
}

/// Send one message and return the first reply chunk
pub async fn echo_once(host: &str, port: u16, message: &str, wait: Duration) -> Result<BytesMut> {
    let addr = tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Failed to resolve host: {}", host))?
        .next()
        .with_context(|| format!("No addresses for {}", host))?;
    info!("Resolved IP address of {}: {}", host, addr.ip());

    info!("Connecting to {}", addr);
    let mut stream = timeout(wait, TcpStream::connect(addr))
        .await
        .with_context(|| format!("Timed out connecting to {}", addr))?
        .with_context(|| format!("Failed to connect to {}", addr))?;
    info!("Connection successful!");

    info!("Sending message: {}", message);
    stream
        .write_all(message.as_bytes())
        .await
        .context("Failed to send message")?;

    let mut reply = BytesMut::with_capacity(READ_CHUNK);
    let n = timeout(wait, stream.read_buf(&mut reply))
        .await
        .context("Timed out waiting for reply")?
        .context("Failed to receive data")?;

    if n == 0 {
        bail!("Server closed the connection without replying");
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(serve(listener));

        let reply = echo_once("127.0.0.1", port, DEFAULT_MESSAGE, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(&reply[..], DEFAULT_MESSAGE.as_bytes());

        let second = echo_once("127.0.0.1", port, "again", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(&second[..], b"again");

        server.abort();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = echo_once("127.0.0.1", port, "ping", Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
